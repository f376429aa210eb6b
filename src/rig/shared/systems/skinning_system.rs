use glam::{Mat4, Vec3};

use crate::rig::shared::enums::AttributeName;
use crate::rig::shared::error::RigError;
use crate::rig::shared::scene_graph::{NodeKey, SceneGraph};
use crate::rig::shared::structs::{Skeleton, SkinnedMesh, SkinnedPrimitive};
use crate::rig::shared::traits::VertexBuffer;

const INFLUENCES_PER_VERTEX: usize = 4;

/// Linear blend skinning of one primitive on the CPU.
///
/// Owns its skinning matrices and output scratch arrays; the scene graph is
/// only borrowed for the duration of [`Skinner::update`].
pub struct Skinner<B: VertexBuffer> {
    vertex_count: usize,
    vertex_positions: Vec<Vec3>,
    vertex_normals: Option<Vec<Vec3>>,
    vertex_joints: Vec<u32>,
    vertex_weights: Vec<f32>,
    inverse_bind_matrices: Vec<Mat4>,
    joint_nodes: Vec<Option<NodeKey>>,
    joint_matrices: Vec<Mat4>,
    skinned_positions: Vec<Vec3>,
    skinned_normals: Vec<Vec3>,
    render_result: B,
}

impl<B: VertexBuffer> Skinner<B> {
    /// Validates the primitive's buffers and resolves every joint path below
    /// `skinning_root`. Joints that can't be found are pinned to their bind
    /// pose and logged; bad buffers are an error. Indices, when present, are
    /// handed to `render_result` once here.
    pub fn new(
        primitive: &SkinnedPrimitive,
        skeleton: &Skeleton,
        scene: &SceneGraph,
        skinning_root: NodeKey,
        mut render_result: B,
    ) -> Result<Self, RigError> {
        let vertex_count = primitive.validate()?;
        let vertex_joints = primitive.joints.clone().unwrap_or_default();
        let vertex_weights = primitive.weights.clone().unwrap_or_default();

        for (influence, (joint, weight)) in vertex_joints
            .iter()
            .zip(vertex_weights.iter())
            .enumerate()
        {
            if *weight != 0.0 && *joint as usize >= skeleton.len() {
                return Err(RigError::JointIndexOutOfRange {
                    vertex: influence / INFLUENCES_PER_VERTEX,
                    joint: *joint,
                    joint_count: skeleton.len(),
                });
            }
        }

        let inverse_bind_matrices = skeleton.inverse_bind_matrices();
        let mut joint_matrices = vec![Mat4::IDENTITY; skeleton.len()];
        let joint_nodes = skeleton
            .joints()
            .iter()
            .enumerate()
            .map(|(index, joint)| {
                let node = scene.get_child_by_path(skinning_root, &joint.path);
                if node.is_none() {
                    log::warn!("Cannot find joint: {}", &joint.path);
                    joint_matrices[index] = skeleton.bind_matrix(index) * inverse_bind_matrices[index];
                }
                node
            })
            .collect();

        if let Some(indices) = primitive.indices.as_ref() {
            render_result.update_indices(indices);
        }

        Ok(Skinner {
            vertex_count,
            vertex_positions: vec3_array_from_flat(&primitive.positions),
            vertex_normals: primitive.normals.as_deref().map(vec3_array_from_flat),
            vertex_joints,
            vertex_weights,
            inverse_bind_matrices,
            joint_nodes,
            joint_matrices,
            skinned_positions: vec![Vec3::ZERO; vertex_count],
            skinned_normals: vec![Vec3::ZERO; vertex_count],
            render_result,
        })
    }

    /// Runs once per animation frame.
    pub fn update(&mut self, scene: &SceneGraph) {
        self.update_joints(scene);
        self.update_vertices();
        self.update_render_data();
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn unresolved_joint_count(&self) -> usize {
        self.joint_nodes.iter().filter(|n| n.is_none()).count()
    }

    pub fn joint_matrices(&self) -> &[Mat4] {
        &self.joint_matrices
    }

    pub fn skinned_positions(&self) -> &[Vec3] {
        &self.skinned_positions
    }

    pub fn skinned_normals(&self) -> Option<&[Vec3]> {
        self.vertex_normals
            .as_ref()
            .map(|_| self.skinned_normals.as_slice())
    }

    pub fn render_result(&self) -> &B {
        &self.render_result
    }

    fn update_joints(&mut self, scene: &SceneGraph) {
        for (joint_index, joint_node) in self.joint_nodes.iter().enumerate() {
            if let Some(joint_node) = joint_node {
                self.joint_matrices[joint_index] =
                    scene.world_matrix(*joint_node) * self.inverse_bind_matrices[joint_index];
            }
        }
    }

    fn update_vertices(&mut self) {
        for vertex in 0..self.vertex_count {
            let mut sum_matrix = Mat4::ZERO;
            let first_influence = INFLUENCES_PER_VERTEX * vertex;
            for influence in first_influence..first_influence + INFLUENCES_PER_VERTEX {
                let weight = self.vertex_weights[influence];
                if weight == 0.0 {
                    continue;
                }
                let joint_matrix = self.joint_matrices[self.vertex_joints[influence] as usize];
                sum_matrix = sum_matrix + joint_matrix * weight;
            }

            self.skinned_positions[vertex] =
                transform_point(&sum_matrix, self.vertex_positions[vertex]);
            if let Some(normals) = self.vertex_normals.as_ref() {
                self.skinned_normals[vertex] = sum_matrix.transform_vector3(normals[vertex]);
            }
        }
    }

    fn update_render_data(&mut self) {
        self.render_result.update(
            AttributeName::Position,
            bytemuck::cast_slice(&self.skinned_positions),
        );
        if self.vertex_normals.is_some() {
            self.render_result.update(
                AttributeName::Normal,
                bytemuck::cast_slice(&self.skinned_normals),
            );
        }
    }
}

/// Full 4x4 transform with a homogeneous divide by `|w|`, skipped when `w`
/// is zero. Blended matrices whose weights don't sum to one still land the
/// vertex on the weighted average.
fn transform_point(matrix: &Mat4, point: Vec3) -> Vec3 {
    let transformed = *matrix * point.extend(1.0);
    let w = transformed.w.abs();
    if w == 0.0 {
        transformed.truncate()
    } else {
        transformed.truncate() / w
    }
}

fn vec3_array_from_flat(elements: &[f32]) -> Vec<Vec3> {
    elements
        .chunks_exact(3)
        .map(Vec3::from_slice)
        .collect()
}

/// Soft-skins every skinned primitive of a mesh.
pub struct SoftSkin<B: VertexBuffer> {
    skinners: Vec<Skinner<B>>,
}

impl<B: VertexBuffer> SoftSkin<B> {
    /// Primitives without joint or weight streams are skipped;
    /// `create_buffer` is asked for one output buffer per skinned primitive.
    pub fn new<F>(
        mesh: &SkinnedMesh,
        skeleton: &Skeleton,
        scene: &SceneGraph,
        skinning_root: NodeKey,
        mut create_buffer: F,
    ) -> Result<Self, RigError>
    where
        F: FnMut(&SkinnedPrimitive) -> B,
    {
        let mut skinners = Vec::with_capacity(mesh.primitives.len());
        for (index, primitive) in mesh.primitives.iter().enumerate() {
            if !primitive.is_skinned() {
                log::debug!("Primitive {} of mesh {} is not skinned, skipping.", index, &mesh.name);
                continue;
            }
            let buffer = create_buffer(primitive);
            skinners.push(Skinner::new(primitive, skeleton, scene, skinning_root, buffer)?);
        }
        log::info!("Soft skin for mesh {} uses {} skinner(s).", &mesh.name, skinners.len());
        Ok(SoftSkin { skinners })
    }

    pub fn update(&mut self, scene: &SceneGraph) {
        for skinner in self.skinners.iter_mut() {
            skinner.update(scene);
        }
    }

    pub fn skinners(&self) -> &[Skinner<B>] {
        &self.skinners
    }
}
