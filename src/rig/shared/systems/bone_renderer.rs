use glam::{Mat4, Quat, Vec3};

use crate::rig::shared::error::RigError;
use crate::rig::shared::scene_graph::{NodeKey, SceneGraph, SubscriptionKey};
use crate::rig::shared::traits::Disposable;
use crate::rig::shared::types::{SceneHandle, SceneWeak};

/// Transform of one debug bone: a unit bone along +Y, scaled to the distance
/// between two joints and rotated to point from parent to child.
#[derive(Clone, Debug, PartialEq)]
pub struct BoneInstance {
    pub name: String,
    pub parent_joint: NodeKey,
    pub child_joint: NodeKey,
    pub transform: Mat4,
}

/// Computes bone instances for every parent/child joint pair below the given
/// roots. Bones are only recomputed after a watched joint moved.
pub struct BoneRenderer {
    scene: SceneWeak,
    subscription: Option<SubscriptionKey>,
    bones: Vec<BoneInstance>,
    is_disposed: bool,
}

impl BoneRenderer {
    pub fn new(scene: &SceneHandle, root_nodes: &[NodeKey]) -> Result<Self, RigError> {
        let mut graph = scene.try_borrow_mut().map_err(|_| RigError::SceneBorrowed)?;
        let mut bones = vec![];
        for root in root_nodes.iter() {
            add_bone_renderings(&graph, *root, &mut bones);
        }
        let subscription = graph.watch_hierarchy(root_nodes);
        log::debug!("Bone renderer watches {} bone(s).", bones.len());
        Ok(BoneRenderer {
            scene: std::rc::Rc::downgrade(scene),
            subscription: Some(subscription),
            bones,
            is_disposed: false,
        })
    }

    pub fn bones(&self) -> &[BoneInstance] {
        &self.bones
    }

    /// Returns whether the bones were recomputed. A scene that is borrowed
    /// elsewhere skips the frame; the pending change is kept for the next one.
    pub fn update(&mut self) -> bool {
        let subscription = match self.subscription {
            Some(subscription) => subscription,
            None => return false,
        };
        let scene = match self.scene.upgrade() {
            Some(scene) => scene,
            None => return false,
        };
        let mut graph = match scene.try_borrow_mut() {
            Ok(graph) => graph,
            Err(_) => {
                log::warn!("Scene is borrowed, skipping bone update.");
                return false;
            }
        };
        if !graph.take_changed(subscription) {
            return false;
        }
        for bone in self.bones.iter_mut() {
            update_bone(&graph, bone);
        }
        true
    }
}

fn add_bone_renderings(graph: &SceneGraph, parent_joint: NodeKey, bones: &mut Vec<BoneInstance>) {
    for child_joint in graph.children(parent_joint).iter() {
        bones.push(BoneInstance {
            name: format!(
                "{}-{}",
                graph.name(parent_joint).unwrap_or(""),
                graph.name(*child_joint).unwrap_or("")
            ),
            parent_joint,
            child_joint: *child_joint,
            transform: Mat4::IDENTITY,
        });
        add_bone_renderings(graph, *child_joint, bones);
    }
}

fn update_bone(graph: &SceneGraph, bone: &mut BoneInstance) {
    let from = graph.world_position(bone.parent_joint);
    let to = graph.world_position(bone.child_joint);
    let direction = to - from;
    let length = direction.length();
    let rotation = if length > 0.0 {
        Quat::from_rotation_arc(Vec3::Y, direction / length)
    } else {
        Quat::IDENTITY
    };
    bone.transform = Mat4::from_scale_rotation_translation(Vec3::splat(length), rotation, from);
}

impl Drop for BoneRenderer {
    fn drop(&mut self) {
        if !self.is_disposed {
            self.dispose();
        }
    }
}

impl Disposable for BoneRenderer {
    fn dispose(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            if let Some(scene) = self.scene.upgrade() {
                match scene.try_borrow_mut() {
                    Ok(mut graph) => {
                        graph.unsubscribe(subscription);
                    }
                    Err(_) => log::warn!("Scene is borrowed, bone renderer subscription leaks."),
                }
            }
        }
        self.is_disposed = true;
    }

    fn is_disposed(&self) -> bool {
        self.is_disposed
    }
}
