use glam::Mat4;

#[derive(Clone, Debug, PartialEq)]
pub struct Joint {
    pub path: String,
    pub inverse_bind_matrix: Mat4,
}

impl Joint {
    pub fn new(path: &str, inverse_bind_matrix: Mat4) -> Self {
        Joint {
            path: path.to_string(),
            inverse_bind_matrix,
        }
    }

    /// Last path segment.
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or("")
    }

    /// The path with its last segment removed, `None` for a single segment.
    pub fn parent_path(&self) -> Option<&str> {
        self.path.rfind('/').map(|index| &self.path[..index])
    }
}
