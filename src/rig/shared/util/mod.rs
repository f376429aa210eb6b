use anyhow::Context;

use crate::rig::shared::scene_graph::{NodeKey, SceneGraph};
use crate::rig::shared::structs::Skeleton;

pub fn read_raw_data(
    file_name: &str,
) -> anyhow::Result<(gltf::Document, Vec<gltf::buffer::Data>, Vec<gltf::image::Data>)> {
    let (document, buffers, images) = gltf::import(file_name)
        .with_context(|| format!("Failed to import rig from glTF file {}.", file_name))?;
    Ok((document, buffers, images))
}

pub fn read_raw_slice(
    bytes: &[u8],
) -> anyhow::Result<(gltf::Document, Vec<gltf::buffer::Data>, Vec<gltf::image::Data>)> {
    let (document, buffers, images) =
        gltf::import_slice(bytes).with_context(|| "Failed to import rig from glTF data.")?;
    Ok((document, buffers, images))
}

/// Instantiates the skeleton's bind pose as scene nodes, one per joint,
/// named after the joint's last path segment. Root joints are placed under
/// `parent` when given. Returns the root joint nodes.
pub fn skeleton_to_nodes(
    skeleton: &Skeleton,
    scene: &mut SceneGraph,
    parent: Option<NodeKey>,
) -> Vec<NodeKey> {
    let local_bind_poses = skeleton.local_bind_poses();
    let nodes: Vec<NodeKey> = skeleton
        .joints()
        .iter()
        .zip(local_bind_poses.iter())
        .map(|(joint, local_bind_pose)| {
            let node = scene.create_node(joint.name(), None);
            let (scale, rotation, translation) = local_bind_pose.to_scale_rotation_translation();
            scene.set_rts(node, rotation, translation, scale);
            node
        })
        .collect();

    let mut root_nodes = vec![];
    for (index, node) in nodes.iter().enumerate() {
        match skeleton.parent_of(index) {
            Some(parent_index) => {
                scene.add_child(nodes[parent_index], *node);
            }
            None => {
                if let Some(parent) = parent {
                    scene.add_child(parent, *node);
                }
                root_nodes.push(*node);
            }
        }
    }
    root_nodes
}
