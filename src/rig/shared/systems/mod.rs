pub mod animation_system;
pub mod bone_renderer;
pub mod retarget_system;
pub mod skinning_system;
pub use animation_system::{sample_clip, AnimationPlayer};
pub use bone_renderer::{BoneInstance, BoneRenderer};
pub use retarget_system::*;
pub use skinning_system::{Skinner, SoftSkin};
