pub mod config;
pub mod enums;
pub mod error;
pub mod scene_graph;
pub mod structs;
pub mod systems;
pub mod traits;
pub mod types;
pub mod util;

pub use config::{DemoConfig, RetargetConfig};
pub use enums::{AttributeName, PathSegment};
pub use error::RigError;
pub use scene_graph::{NodeKey, SceneGraph, SubscriptionKey};
pub use structs::*;
pub use systems::*;
pub use traits::{Disposable, PathMapping, VertexBuffer};
pub use types::*;
pub use util::skeleton_to_nodes;
