use std::collections::HashMap;

use crate::rig::shared::error::RigError;
use crate::rig::shared::structs::AnimationClip;
use crate::rig::shared::systems::{retarget_tracks, TrackRetargetReport};
use crate::rig::shared::traits::PathMapping;

/// Clips addressed by name, plus the clip to play by default.
#[derive(Clone, Debug, Default)]
pub struct ClipLibrary {
    clips: HashMap<String, AnimationClip>,
    default_clip: Option<String>,
}

impl ClipLibrary {
    pub fn new() -> Self {
        ClipLibrary {
            clips: HashMap::new(),
            default_clip: None,
        }
    }

    /// Adds a clip, replacing and returning any clip with the same name.
    pub fn add(&mut self, clip: AnimationClip) -> Option<AnimationClip> {
        self.clips.insert(clip.name.clone(), clip)
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.clips.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Result<&AnimationClip, RigError> {
        self.clips
            .get(name)
            .ok_or_else(|| RigError::ClipNotFound(name.to_string()))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut AnimationClip, RigError> {
        self.clips
            .get_mut(name)
            .ok_or_else(|| RigError::ClipNotFound(name.to_string()))
    }

    pub fn set_default_clip(&mut self, name: &str) -> Result<(), RigError> {
        self.get(name)?;
        self.default_clip = Some(name.to_string());
        Ok(())
    }

    pub fn default_clip(&self) -> Option<&AnimationClip> {
        self.default_clip
            .as_ref()
            .and_then(|name| self.clips.get(name))
    }

    /// Rewrites the joint paths of a named clip. A missing clip aborts.
    pub fn retarget_clip<M>(
        &mut self,
        name: &str,
        mapping: &M,
    ) -> Result<TrackRetargetReport, RigError>
    where
        M: PathMapping + ?Sized,
    {
        let clip = self.get_mut(name)?;
        Ok(retarget_tracks(clip, mapping))
    }
}
