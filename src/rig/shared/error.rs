use thiserror::Error;

/// Fatal errors raised while setting up retargeting or skinning.
///
/// Degraded conditions (unmatched joints, unresolved joint nodes, unmapped
/// tracks) are not errors; they are logged and reported in return values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RigError {
    #[error("Vertex attribute {attribute} has {actual} elements, expected {expected}.")]
    VertexBufferLength {
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Vertex {vertex} references joint {joint}, but the skeleton only has {joint_count} joints.")]
    JointIndexOutOfRange {
        vertex: usize,
        joint: u32,
        joint_count: usize,
    },

    #[error("Index {index} points past the last of {vertex_count} vertices.")]
    IndexOutOfRange { index: u32, vertex_count: usize },

    #[error("Animation clip not found: {0}")]
    ClipNotFound(String),

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Duplicate joint path in skeleton: {0}")]
    DuplicateJointPath(String),

    #[error("Skeleton has {joints} joints but {matrices} inverse bind matrices.")]
    JointCountMismatch { joints: usize, matrices: usize },

    #[error("Scene graph is already borrowed.")]
    SceneBorrowed,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
