pub mod loader;
pub mod shared;
pub use loader::{instantiate_nodes, load_rig, load_rig_from_slice, RigAsset};
pub use shared::*;
