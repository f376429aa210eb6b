use anyhow::Context;
use glam::{Mat4, Quat, Vec3};
use gltf::animation::util::ReadOutputs;

use crate::rig::shared::scene_graph::{NodeKey, SceneGraph};
use crate::rig::shared::structs::{
    AnimationClip, Channel, ChannelOutputs, Skeleton, SkinnedMesh, SkinnedPrimitive, Track,
};
use crate::rig::shared::util::{read_raw_data, read_raw_slice};

/// Local transform and children of one glTF node, kept so the hierarchy can
/// be instantiated into a [`SceneGraph`] after the document is gone.
#[derive(Clone, Debug)]
pub struct NodeTemplate {
    pub name: String,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub children: Vec<usize>,
}

/// Everything rig related in one glTF file. Joint paths and track paths are
/// node name chains starting at a top-level node of the file.
#[derive(Clone, Debug, Default)]
pub struct RigAsset {
    pub skeletons: Vec<Skeleton>,
    pub meshes: Vec<SkinnedMesh>,
    pub clips: Vec<AnimationClip>,
    pub nodes: Vec<NodeTemplate>,
    pub scene_roots: Vec<usize>,
}

pub fn load_rig(file_name: &str) -> anyhow::Result<RigAsset> {
    let (document, buffers, _) = read_raw_data(file_name)?;
    let asset = process_document(&document, &buffers)
        .with_context(|| format!("Failed to process rig {}.", file_name))?;
    Ok(asset)
}

pub fn load_rig_from_slice(bytes: &[u8]) -> anyhow::Result<RigAsset> {
    let (document, buffers, _) = read_raw_slice(bytes)?;
    process_document(&document, &buffers)
}

/// Copies the asset's default scene below `parent`. Returns the new nodes
/// for the scene's top-level glTF nodes.
pub fn instantiate_nodes(asset: &RigAsset, scene: &mut SceneGraph, parent: NodeKey) -> Vec<NodeKey> {
    asset
        .scene_roots
        .iter()
        .filter_map(|root| instantiate_node(asset, *root, scene, parent))
        .collect()
}

fn instantiate_node(
    asset: &RigAsset,
    index: usize,
    scene: &mut SceneGraph,
    parent: NodeKey,
) -> Option<NodeKey> {
    let template = asset.nodes.get(index)?;
    let key = scene.create_node(&template.name, Some(parent));
    scene.set_rts(key, template.rotation, template.translation, template.scale);
    for child in template.children.iter() {
        instantiate_node(asset, *child, scene, key);
    }
    Some(key)
}

fn process_document(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
) -> anyhow::Result<RigAsset> {
    let nodes = process_nodes(document);
    let node_paths = build_node_paths(&nodes, document);
    let skeletons = process_skeletons(document, buffers, &node_paths)?;
    let meshes = process_meshes(document, buffers);
    let clips = process_animations(document, buffers, &node_paths);
    let scene_roots = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .map(|scene| scene.nodes().map(|n| n.index()).collect())
        .unwrap_or_default();
    log::info!(
        "Loaded rig with {} skeleton(s), {} skinned mesh(es) and {} clip(s).",
        skeletons.len(),
        meshes.len(),
        clips.len()
    );
    Ok(RigAsset {
        skeletons,
        meshes,
        clips,
        nodes,
        scene_roots,
    })
}

fn process_nodes(document: &gltf::Document) -> Vec<NodeTemplate> {
    document
        .nodes()
        .map(|node| {
            let (t, r, s) = node.transform().decomposed();
            NodeTemplate {
                name: node
                    .name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("node_{}", node.index())),
                translation: Vec3::from(t),
                rotation: Quat::from_array(r),
                scale: Vec3::from(s),
                children: node.children().map(|c| c.index()).collect(),
            }
        })
        .collect()
}

fn build_node_paths(nodes: &[NodeTemplate], document: &gltf::Document) -> Vec<String> {
    let mut parents: Vec<Option<usize>> = vec![None; nodes.len()];
    for node in document.nodes() {
        for child in node.children() {
            parents[child.index()] = Some(node.index());
        }
    }
    (0..nodes.len())
        .map(|index| {
            let mut segments = vec![nodes[index].name.as_str()];
            let mut current = parents[index];
            while let Some(parent) = current {
                // A malformed file could loop; no path is deeper than the node count.
                if segments.len() > nodes.len() {
                    log::error!("Node hierarchy of node {} contains a cycle.", index);
                    break;
                }
                segments.push(nodes[parent].name.as_str());
                current = parents[parent];
            }
            segments.reverse();
            segments.join("/")
        })
        .collect()
}

fn process_skeletons(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
    node_paths: &[String],
) -> anyhow::Result<Vec<Skeleton>> {
    let mut skeletons = vec![];
    for skin in document.skins() {
        let joints: Vec<gltf::Node> = skin.joints().collect();
        let reader = skin.reader(|buffer| Some(&buffers[buffer.index()]));
        let inverse_bind_matrices: Vec<Mat4> = match reader.read_inverse_bind_matrices() {
            Some(matrices) => matrices.map(|m| Mat4::from_cols_array_2d(&m)).collect(),
            None => vec![Mat4::IDENTITY; joints.len()],
        };
        let paths = joints
            .iter()
            .map(|joint| node_paths[joint.index()].clone())
            .collect();
        let name = skin
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("skin_{}", skin.index()));
        let skeleton = Skeleton::from_parts(&name, paths, inverse_bind_matrices)
            .with_context(|| format!("Failed to build skeleton {}.", &name))?;
        log::info!("Skeleton {} has {} joints.", &skeleton.name, skeleton.len());
        skeletons.push(skeleton);
    }
    Ok(skeletons)
}

fn process_meshes(document: &gltf::Document, buffers: &[gltf::buffer::Data]) -> Vec<SkinnedMesh> {
    let mut meshes = vec![];
    for node in document.nodes() {
        let mesh = match node.mesh() {
            Some(mesh) => mesh,
            None => continue,
        };
        let mut primitives = vec![];
        for primitive in mesh.primitives() {
            match primitive.mode() {
                gltf::mesh::Mode::Triangles => (),
                _ => {
                    log::error!("The primitive topology has to be triangles.");
                }
            }
            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
            let positions = match reader.read_positions() {
                Some(positions) => flatten(positions),
                None => {
                    log::warn!("Primitive {} of mesh {} has no positions.", primitive.index(), mesh.index());
                    continue;
                }
            };
            let normals = reader.read_normals().map(flatten);
            let joints = reader.read_joints(0).map(|joints| {
                joints
                    .into_u16()
                    .flat_map(|j| j.iter().map(|i| *i as u32).collect::<Vec<_>>())
                    .collect()
            });
            let weights = reader.read_weights(0).map(|weights| flatten(weights.into_f32()));
            let indices = reader
                .read_indices()
                .map(|indices| indices.into_u32().collect());
            primitives.push(SkinnedPrimitive {
                positions,
                normals,
                joints,
                weights,
                indices,
            });
        }
        meshes.push(SkinnedMesh {
            name: mesh
                .name()
                .or_else(|| node.name())
                .map(str::to_string)
                .unwrap_or_else(|| format!("mesh_{}", mesh.index())),
            primitives,
            skin_index: node.skin().map(|skin| skin.index()),
        });
    }
    log::info!("Skinned mesh count: {}", meshes.len());
    meshes
}

fn flatten<I, const N: usize>(items: I) -> Vec<f32>
where
    I: Iterator<Item = [f32; N]>,
{
    let mut flat = vec![];
    for item in items {
        flat.extend_from_slice(&item);
    }
    flat
}

fn process_animations(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
    node_paths: &[String],
) -> Vec<AnimationClip> {
    let mut clips = vec![];
    for (index, animation) in document.animations().enumerate() {
        let name = if let Some(n) = animation.name() {
            n.to_string()
        } else {
            format!("default{}", index)
        };
        let mut tracks = vec![];
        for channel in animation.channels() {
            let target_node_index = channel.target().node().index();
            let interpolation = channel.sampler().interpolation();
            let reader = channel.reader(|buffer| Some(&buffers[buffer.index()]));
            let inputs = match reader.read_inputs() {
                Some(inputs) => inputs.collect::<Vec<_>>(),
                None => continue,
            };
            let outputs = match reader.read_outputs() {
                Some(ReadOutputs::Translations(translations)) => {
                    ChannelOutputs::Translations(translations.map(Vec3::from).collect())
                }
                Some(ReadOutputs::Rotations(rotations)) => {
                    ChannelOutputs::Rotations(rotations.into_f32().map(Quat::from_array).collect())
                }
                Some(ReadOutputs::Scales(scales)) => {
                    ChannelOutputs::Scales(scales.map(Vec3::from).collect())
                }
                Some(ReadOutputs::MorphTargetWeights(_)) => {
                    log::debug!("Skipping morph target weights channel of clip {}.", &name);
                    continue;
                }
                None => continue,
            };
            tracks.push(Track::new(
                &node_paths[target_node_index],
                Channel {
                    inputs,
                    outputs,
                    interpolation,
                },
            ));
        }
        log::info!("Animation: {} ({} tracks)", &name, tracks.len());
        clips.push(AnimationClip::new(&name, tracks));
    }
    clips
}
