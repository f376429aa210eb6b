use crate::rig::shared::error::RigError;

/// Flat per-vertex attribute arrays of one mesh primitive.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SkinnedPrimitive {
    /// 3 floats per vertex.
    pub positions: Vec<f32>,
    /// 3 floats per vertex.
    pub normals: Option<Vec<f32>>,
    /// 4 joint indices per vertex.
    pub joints: Option<Vec<u32>>,
    /// 4 weights per vertex.
    pub weights: Option<Vec<f32>>,
    pub indices: Option<Vec<u32>>,
}

impl SkinnedPrimitive {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn is_skinned(&self) -> bool {
        self.joints.is_some() && self.weights.is_some()
    }

    /// Checks the attribute length invariants and returns the vertex count.
    pub fn validate(&self) -> Result<usize, RigError> {
        let vertex_count = self.vertex_count();
        check_length("position", 3 * vertex_count, self.positions.len())?;
        check_length(
            "joints",
            4 * vertex_count,
            self.joints.as_ref().map(Vec::len).unwrap_or(0),
        )?;
        check_length(
            "weights",
            4 * vertex_count,
            self.weights.as_ref().map(Vec::len).unwrap_or(0),
        )?;
        if let Some(normals) = self.normals.as_ref() {
            check_length("normal", 3 * vertex_count, normals.len())?;
        }
        if let Some(indices) = self.indices.as_ref() {
            if let Some(index) = indices.iter().find(|i| **i as usize >= vertex_count) {
                return Err(RigError::IndexOutOfRange {
                    index: *index,
                    vertex_count,
                });
            }
        }
        Ok(vertex_count)
    }
}

fn check_length(attribute: &'static str, expected: usize, actual: usize) -> Result<(), RigError> {
    if expected == actual {
        Ok(())
    } else {
        Err(RigError::VertexBufferLength {
            attribute,
            expected,
            actual,
        })
    }
}

#[derive(Clone, Debug, Default)]
pub struct SkinnedMesh {
    pub name: String,
    pub primitives: Vec<SkinnedPrimitive>,
    /// Index of the skeleton this mesh is bound to, when loaded from a file.
    pub skin_index: Option<usize>,
}
