pub mod animation;
pub mod clip_library;
pub mod host_vertex_buffer;
pub mod joint;
pub mod skeleton;
pub mod skeleton_mapping;
pub mod skinned_mesh;
pub use animation::*;
pub use clip_library::ClipLibrary;
pub use host_vertex_buffer::HostVertexBuffer;
pub use joint::Joint;
pub use skeleton::Skeleton;
pub use skeleton_mapping::{SkeletonMapping, TableMapping};
pub use skinned_mesh::{SkinnedMesh, SkinnedPrimitive};
