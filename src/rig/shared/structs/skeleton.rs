use glam::Mat4;
use std::collections::HashMap;

use crate::rig::shared::error::RigError;
use crate::rig::shared::structs::Joint;

/// Ordered joint arena with a path lookup and a parent table built once at
/// construction.
#[derive(Clone, Debug)]
pub struct Skeleton {
    pub name: String,
    joints: Vec<Joint>,
    lookup: HashMap<String, usize>,
    parents: Vec<Option<usize>>,
}

impl Skeleton {
    pub fn new(name: &str, joints: Vec<Joint>) -> Result<Self, RigError> {
        let mut lookup = HashMap::with_capacity(joints.len());
        for (index, joint) in joints.iter().enumerate() {
            if lookup.insert(joint.path.clone(), index).is_some() {
                return Err(RigError::DuplicateJointPath(joint.path.clone()));
            }
        }
        let parents = joints
            .iter()
            .map(|joint| {
                let parent_path = joint.parent_path()?;
                let parent = lookup.get(parent_path).copied();
                if parent.is_none() {
                    log::debug!(
                        "Parent {} of joint {} is not part of the skeleton, treating it as a root.",
                        parent_path,
                        &joint.path
                    );
                }
                parent
            })
            .collect();
        Ok(Skeleton {
            name: name.to_string(),
            joints,
            lookup,
            parents,
        })
    }

    pub fn from_parts(
        name: &str,
        paths: Vec<String>,
        inverse_bind_matrices: Vec<Mat4>,
    ) -> Result<Self, RigError> {
        if paths.len() != inverse_bind_matrices.len() {
            return Err(RigError::JointCountMismatch {
                joints: paths.len(),
                matrices: inverse_bind_matrices.len(),
            });
        }
        let joints = paths
            .into_iter()
            .zip(inverse_bind_matrices.into_iter())
            .map(|(path, inverse_bind_matrix)| Joint {
                path,
                inverse_bind_matrix,
            })
            .collect();
        Self::new(name, joints)
    }

    /// Same joints and hierarchy with new inverse bind matrices, one per joint.
    pub(crate) fn rebound(&self, name: &str, inverse_bind_matrices: Vec<Mat4>) -> Self {
        debug_assert_eq!(self.joints.len(), inverse_bind_matrices.len());
        let joints = self
            .joints
            .iter()
            .zip(inverse_bind_matrices.into_iter())
            .map(|(joint, inverse_bind_matrix)| Joint {
                path: joint.path.clone(),
                inverse_bind_matrix,
            })
            .collect();
        Skeleton {
            name: name.to_string(),
            joints,
            lookup: self.lookup.clone(),
            parents: self.parents.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn joint(&self, index: usize) -> Option<&Joint> {
        self.joints.get(index)
    }

    pub fn index_of(&self, path: &str) -> Option<usize> {
        self.lookup.get(path).copied()
    }

    pub fn parent_of(&self, index: usize) -> Option<usize> {
        self.parents.get(index).copied().flatten()
    }

    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.parents
            .iter()
            .enumerate()
            .filter(|(_, parent)| parent.is_none())
            .map(|(index, _)| index)
    }

    pub fn children_of(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.parents
            .iter()
            .enumerate()
            .filter(move |(_, parent)| **parent == Some(index))
            .map(|(child, _)| child)
    }

    pub fn inverse_bind_matrix(&self, index: usize) -> Mat4 {
        self.joints[index].inverse_bind_matrix
    }

    pub fn inverse_bind_matrices(&self) -> Vec<Mat4> {
        self.joints.iter().map(|j| j.inverse_bind_matrix).collect()
    }

    /// World-space bind transform, the inverse of the inverse bind matrix.
    pub fn bind_matrix(&self, index: usize) -> Mat4 {
        self.joints[index].inverse_bind_matrix.inverse()
    }

    /// Each joint's bind transform relative to its parent. Roots get their
    /// world bind transform.
    pub fn local_bind_poses(&self) -> Vec<Mat4> {
        (0..self.joints.len())
            .map(|index| {
                let bind_matrix = self.bind_matrix(index);
                match self.parent_of(index) {
                    Some(parent) => self.joints[parent].inverse_bind_matrix * bind_matrix,
                    None => bind_matrix,
                }
            })
            .collect()
    }

    /// Composes per-joint local transforms down the hierarchy into world
    /// transforms. Joint order does not need to be parent-first.
    pub fn compose_world(&self, local_transforms: &[Mat4]) -> Vec<Mat4> {
        let mut world: Vec<Option<Mat4>> = vec![None; self.joints.len()];
        for index in 0..self.joints.len() {
            self.resolve_world(index, local_transforms, &mut world);
        }
        world
            .into_iter()
            .map(|m| m.unwrap_or(Mat4::IDENTITY))
            .collect()
    }

    fn resolve_world(
        &self,
        index: usize,
        local_transforms: &[Mat4],
        world: &mut Vec<Option<Mat4>>,
    ) -> Mat4 {
        if let Some(matrix) = world[index] {
            return matrix;
        }
        let local = local_transforms
            .get(index)
            .copied()
            .unwrap_or(Mat4::IDENTITY);
        let matrix = match self.parent_of(index) {
            Some(parent) => self.resolve_world(parent, local_transforms, world) * local,
            None => local,
        };
        world[index] = Some(matrix);
        matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_local(rng: &mut StdRng) -> Mat4 {
        let axis = Vec3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(0.1..1.0),
        )
        .normalize();
        let rotation = Quat::from_axis_angle(axis, rng.gen_range(-3.0..3.0));
        let translation = Vec3::new(
            rng.gen_range(-2.0..2.0),
            rng.gen_range(-2.0..2.0),
            rng.gen_range(-2.0..2.0),
        );
        let scale = Vec3::splat(rng.gen_range(0.5..1.5));
        Mat4::from_scale_rotation_translation(scale, rotation, translation)
    }

    /// Children listed before parents on purpose.
    fn random_skeleton(seed: u64) -> (Skeleton, Vec<Mat4>) {
        let paths = ["Hips/Spine/Neck", "Hips/Spine", "Hips", "Hips/LeftLeg", "Hips/Spine/Neck/Head"];
        let mut rng = StdRng::seed_from_u64(seed);
        let locals: Vec<Mat4> = paths.iter().map(|_| random_local(&mut rng)).collect();
        let skeleton = Skeleton::from_parts(
            "random",
            paths.iter().map(|p| p.to_string()).collect(),
            vec![Mat4::IDENTITY; paths.len()],
        )
        .unwrap();
        let world = skeleton.compose_world(&locals);
        let joints = paths
            .iter()
            .zip(world.iter())
            .map(|(path, world)| Joint::new(path, world.inverse()))
            .collect();
        (Skeleton::new("random", joints).unwrap(), locals)
    }

    #[test]
    fn builds_parent_table_from_paths() {
        let (skeleton, _) = random_skeleton(1);
        let hips = skeleton.index_of("Hips").unwrap();
        let spine = skeleton.index_of("Hips/Spine").unwrap();
        assert_eq!(skeleton.parent_of(spine), Some(hips));
        assert_eq!(skeleton.parent_of(hips), None);
        assert_eq!(skeleton.roots().collect::<Vec<_>>(), vec![hips]);
        let mut children: Vec<_> = skeleton.children_of(hips).collect();
        children.sort_unstable();
        assert_eq!(children, vec![spine, skeleton.index_of("Hips/LeftLeg").unwrap()]);
    }

    #[test]
    fn missing_parent_makes_a_root() {
        let skeleton = Skeleton::new(
            "orphans",
            vec![Joint::new("Armature/Hips", Mat4::IDENTITY)],
        )
        .unwrap();
        assert_eq!(skeleton.parent_of(0), None);
        assert_eq!(skeleton.roots().count(), 1);
    }

    #[test]
    fn rejects_duplicate_paths_and_count_mismatch() {
        let duplicate = Skeleton::new(
            "dup",
            vec![Joint::new("Hips", Mat4::IDENTITY), Joint::new("Hips", Mat4::IDENTITY)],
        );
        assert_eq!(duplicate.unwrap_err(), RigError::DuplicateJointPath("Hips".to_string()));

        let mismatch = Skeleton::from_parts("bad", vec!["Hips".to_string()], vec![]);
        assert_eq!(
            mismatch.unwrap_err(),
            RigError::JointCountMismatch { joints: 1, matrices: 0 }
        );
    }

    #[test]
    fn root_local_bind_pose_is_its_bind_matrix() {
        let (skeleton, _) = random_skeleton(7);
        let locals = skeleton.local_bind_poses();
        for root in skeleton.roots() {
            assert!(locals[root].abs_diff_eq(skeleton.bind_matrix(root), 1e-5));
        }
    }

    #[test]
    fn local_bind_poses_round_trip_to_inverse_bind_matrices() {
        for seed in 0..16 {
            let (skeleton, authored_locals) = random_skeleton(seed);
            let locals = skeleton.local_bind_poses();
            for (local, authored) in locals.iter().zip(authored_locals.iter()) {
                assert!(local.abs_diff_eq(*authored, 1e-3));
            }
            let world = skeleton.compose_world(&locals);
            for (index, world) in world.iter().enumerate() {
                assert!(world
                    .inverse()
                    .abs_diff_eq(skeleton.inverse_bind_matrix(index), 1e-3));
            }
        }
    }
}
