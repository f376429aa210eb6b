use crate::rig::shared::error::RigError;
use crate::rig::shared::scene_graph::{NodeKey, SceneGraph};
use crate::rig::shared::structs::{AnimationClip, ChannelValue, ClipLibrary};

/// Poses the nodes below `root` from `clip` at `seconds`. Returns how many
/// joint tracks pointed at a path that doesn't exist below `root`.
pub fn sample_clip(clip: &AnimationClip, seconds: f32, scene: &mut SceneGraph, root: NodeKey) -> usize {
    let mut unresolved = 0;
    for track in clip.tracks.iter() {
        let path = match track.hierarchy_path() {
            Some(path) => path,
            None => continue,
        };
        let node = match scene.get_child_by_path(root, path) {
            Some(node) => node,
            None => {
                unresolved += 1;
                continue;
            }
        };
        match track.channel.sample(seconds) {
            Some(ChannelValue::Translation(translation)) => scene.set_translation(node, translation),
            Some(ChannelValue::Rotation(rotation)) => scene.set_rotation(node, rotation),
            Some(ChannelValue::Scale(scale)) => scene.set_scale(node, scale),
            None => (),
        }
    }
    unresolved
}

/// Plays one clip of a [`ClipLibrary`] onto a node hierarchy.
#[derive(Clone, Debug)]
pub struct AnimationPlayer {
    clip: String,
    time: f32,
    pub looping: bool,
    pub speed: f32,
    reported_unresolved: bool,
}

impl AnimationPlayer {
    pub fn new(clip: &str) -> Self {
        AnimationPlayer {
            clip: clip.to_string(),
            time: 0.0,
            looping: true,
            speed: 1.0,
            reported_unresolved: false,
        }
    }

    pub fn from_default_clip(library: &ClipLibrary) -> Result<Self, RigError> {
        library
            .default_clip()
            .map(|clip| Self::new(&clip.name))
            .ok_or_else(|| RigError::ClipNotFound("<default>".to_string()))
    }

    pub fn clip_name(&self) -> &str {
        &self.clip
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn update(
        &mut self,
        delta_time: f64,
        library: &ClipLibrary,
        scene: &mut SceneGraph,
        root: NodeKey,
    ) -> Result<usize, RigError> {
        let clip = library.get(&self.clip)?;
        let duration = clip.duration();
        self.time += delta_time as f32 * self.speed;
        if self.looping && duration > 0.0 {
            self.time = self.time.rem_euclid(duration);
        } else {
            self.time = self.time.max(0.0).min(duration);
        }
        let unresolved = sample_clip(clip, self.time, scene, root);
        if unresolved > 0 && !self.reported_unresolved {
            log::warn!(
                "{} track(s) of clip {} don't resolve to a node.",
                unresolved,
                &clip.name
            );
            self.reported_unresolved = true;
        }
        Ok(unresolved)
    }
}
