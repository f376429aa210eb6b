use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::rig::shared::error::RigError;

fn default_postfix() -> String {
    "_Armature".to_string()
}

fn default_frames() -> u32 {
    60
}

fn default_frame_rate() -> f32 {
    60.0
}

/// Everything a retarget pass needs, validated up front.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetargetConfig {
    /// Path of the target rig's root node, relative to the node that owns
    /// the animations.
    pub root_path: String,
    #[serde(default = "default_postfix")]
    pub postfix: String,
    /// Names of the clips to retarget.
    #[serde(default)]
    pub clips: Vec<String>,
    #[serde(default)]
    pub default_clip: Option<String>,
}

impl RetargetConfig {
    pub fn new(root_path: &str, clips: &[&str]) -> Self {
        RetargetConfig {
            root_path: root_path.to_string(),
            postfix: default_postfix(),
            clips: clips.iter().map(|c| c.to_string()).collect(),
            default_clip: None,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, RigError> {
        let config: RetargetConfig =
            serde_json::from_str(json).map_err(|e| RigError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RigError> {
        if self.root_path.trim_matches('/').is_empty() {
            return Err(RigError::InvalidConfig(
                "root_path must name the target rig's root node.".to_string(),
            ));
        }
        if let Some(empty) = self.clips.iter().position(|c| c.is_empty()) {
            return Err(RigError::InvalidConfig(format!(
                "clip name at position {} is empty.",
                empty
            )));
        }
        let mut seen = HashSet::new();
        if let Some(duplicate) = self.clips.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(RigError::InvalidConfig(format!(
                "clip {} is listed more than once.",
                duplicate
            )));
        }
        if let Some(default_clip) = self.default_clip.as_ref() {
            if default_clip.is_empty() {
                return Err(RigError::InvalidConfig(
                    "default_clip must not be empty.".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Settings of the `rig_demo` binary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DemoConfig {
    /// glTF file carrying the source skeleton and the animations.
    pub source_model: String,
    /// glTF file carrying the target skeleton and the skinned mesh.
    pub target_model: String,
    /// Name of the node the target model is instantiated under.
    pub character_node: String,
    pub retarget: RetargetConfig,
    #[serde(default = "default_frames")]
    pub frames: u32,
    #[serde(default = "default_frame_rate")]
    pub frame_rate: f32,
}

impl DemoConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read demo config {}.", path.display()))?;
        let config: DemoConfig = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse demo config {}.", path.display()))?;
        config.retarget.validate()?;
        if config.frame_rate <= 0.0 {
            anyhow::bail!("frame_rate must be positive, got {}.", config.frame_rate);
        }
        Ok(config)
    }
}
