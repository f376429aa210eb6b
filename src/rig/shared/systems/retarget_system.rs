use glam::Mat4;
use std::collections::HashMap;

use crate::rig::shared::config::RetargetConfig;
use crate::rig::shared::enums::PathSegment;
use crate::rig::shared::error::RigError;
use crate::rig::shared::scene_graph::{NodeKey, SceneGraph};
use crate::rig::shared::structs::{AnimationClip, ClipLibrary, Skeleton, SkeletonMapping};
use crate::rig::shared::traits::PathMapping;

pub const RETARGETED_SKELETON_NAME: &str = "Retargeted skeleton";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RetargetReport {
    pub matched: usize,
    /// Target joints no source joint was mapped onto. They keep an identity
    /// bind matrix.
    pub unmatched_target_joints: Vec<String>,
    /// Source joints without a counterpart in the target skeleton.
    pub unplaced_source_joints: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct RetargetedSkeleton {
    pub skeleton: Skeleton,
    pub report: RetargetReport,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrackRetargetReport {
    pub rewritten: usize,
    /// Joint paths of tracks the mapping had no answer for. Left unchanged.
    pub unmapped: Vec<String>,
    /// Tracks whose first path segment isn't a joint path.
    pub skipped: usize,
}

fn mapped_path<M>(mapping: &M, source: &str) -> Option<String>
where
    M: PathMapping + ?Sized,
{
    mapping.map_path(source).filter(|path| !path.is_empty())
}

/// Computes bind matrices that make the target skeleton take on the local
/// bind shape of the source skeleton, joint by joint.
///
/// For every target joint the source joint whose mapped path equals the
/// target path is looked up (exact match, last source joint wins on
/// collisions). A matched joint gets
/// `source_local * target_local^-1 * target_inverse_bind`; an unmatched one
/// keeps the identity and is listed in one warning.
pub fn retarget_joints<M>(source: &Skeleton, target: &Skeleton, mapping: &M) -> RetargetedSkeleton
where
    M: PathMapping + ?Sized,
{
    let source_local_bind_poses = source.local_bind_poses();
    let target_local_bind_poses = target.local_bind_poses();

    let mut unplaced_source_joints = vec![];
    let mut target_to_source: HashMap<String, usize> = HashMap::with_capacity(source.len());
    for (source_index, joint) in source.joints().iter().enumerate() {
        match mapped_path(mapping, &joint.path) {
            Some(mapped) => {
                if target.index_of(&mapped).is_none() {
                    log::debug!(
                        "Source joint {} is not mapped into target skeleton.",
                        &joint.path
                    );
                    unplaced_source_joints.push(joint.path.clone());
                }
                target_to_source.insert(mapped, source_index);
            }
            None => {
                log::debug!("Source joint {} is not mapped.", &joint.path);
                unplaced_source_joints.push(joint.path.clone());
            }
        }
    }

    let mut unmatched_target_joints = vec![];
    let mut inverse_bind_matrices = vec![Mat4::IDENTITY; target.len()];
    for (target_index, joint) in target.joints().iter().enumerate() {
        let source_index = match target_to_source.get(&joint.path) {
            Some(source_index) => *source_index,
            None => {
                unmatched_target_joints.push(joint.path.clone());
                continue;
            }
        };
        let source_local_bind_pose = source_local_bind_poses[source_index];
        let target_local_inverse_bind_pose = target_local_bind_poses[target_index].inverse();
        // Enter source joint space, cancel target joint space, then go from
        // mesh space into target joint space.
        inverse_bind_matrices[target_index] =
            source_local_bind_pose * target_local_inverse_bind_pose * joint.inverse_bind_matrix;
    }

    if !unmatched_target_joints.is_empty() {
        log::warn!(
            "The following joints in target skeleton are not mapped:\n{}",
            unmatched_target_joints.join("\n")
        );
    }

    let report = RetargetReport {
        matched: target.len() - unmatched_target_joints.len(),
        unmatched_target_joints,
        unplaced_source_joints,
    };
    log::info!(
        "Retargeted {} of {} joints from {} onto {}.",
        report.matched,
        target.len(),
        &source.name,
        &target.name
    );
    RetargetedSkeleton {
        skeleton: target.rebound(RETARGETED_SKELETON_NAME, inverse_bind_matrices),
        report,
    }
}

/// Rewrites, in place, the joint path of every track whose first path
/// segment is a joint path. Tracks the mapping can't answer for are left
/// unchanged.
///
/// Not idempotent: applying it again maps the already mapped paths a second
/// time, so a clip must be retargeted exactly once per mapping.
pub fn retarget_tracks<M>(clip: &mut AnimationClip, mapping: &M) -> TrackRetargetReport
where
    M: PathMapping + ?Sized,
{
    let mut report = TrackRetargetReport::default();
    for track in clip.tracks.iter_mut() {
        match track.path.first_mut() {
            Some(PathSegment::Hierarchy(path)) => match mapped_path(mapping, path) {
                Some(mapped) => {
                    *path = mapped;
                    report.rewritten += 1;
                }
                None => report.unmapped.push(path.clone()),
            },
            _ => report.skipped += 1,
        }
    }
    if !report.unmapped.is_empty() {
        log::warn!(
            "{} track(s) of clip {} have no mapped joint path:\n{}",
            report.unmapped.len(),
            &clip.name,
            report.unmapped.join("\n")
        );
    }
    report
}

#[derive(Clone, Debug)]
pub struct RetargetOutcome {
    pub mapping: SkeletonMapping,
    pub retargeted: RetargetedSkeleton,
    pub clips: Vec<(String, TrackRetargetReport)>,
}

/// One retarget pass: builds the mapping from the scene, rewrites the
/// configured clips and recomputes the target skeleton's bind matrices.
#[derive(Clone, Debug)]
pub struct RetargetSession {
    config: RetargetConfig,
}

impl RetargetSession {
    pub fn new(config: RetargetConfig) -> Result<Self, RigError> {
        config.validate()?;
        Ok(RetargetSession { config })
    }

    pub fn config(&self) -> &RetargetConfig {
        &self.config
    }

    /// The prefix is the path from `owner` down to the rig root node.
    pub fn mapping_for(&self, scene: &SceneGraph, owner: NodeKey) -> Result<SkeletonMapping, RigError> {
        let root_path = self.config.root_path.as_str();
        let root = scene
            .get_child_by_path(owner, root_path)
            .ok_or_else(|| RigError::NodeNotFound(root_path.to_string()))?;
        let path = scene
            .path_between(owner, root)
            .ok_or_else(|| RigError::NodeNotFound(root_path.to_string()))?;
        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{}/", path)
        };
        Ok(SkeletonMapping::new(&prefix, &self.config.postfix))
    }

    pub fn run(
        &self,
        scene: &SceneGraph,
        owner: NodeKey,
        library: &mut ClipLibrary,
        source: &Skeleton,
        target: &Skeleton,
    ) -> Result<RetargetOutcome, RigError> {
        let mapping = self.mapping_for(scene, owner)?;

        // Every named clip has to exist before any of them gets rewritten.
        for name in self.config.clips.iter() {
            library.get(name)?;
        }
        if let Some(default_clip) = self.config.default_clip.as_ref() {
            library.get(default_clip)?;
        }

        let mut clips = Vec::with_capacity(self.config.clips.len());
        for name in self.config.clips.iter() {
            let report = library.retarget_clip(name, &mapping)?;
            clips.push((name.clone(), report));
        }
        if let Some(default_clip) = self.config.default_clip.as_ref() {
            library.set_default_clip(default_clip)?;
        }

        let retargeted = retarget_joints(source, target, &mapping);
        Ok(RetargetOutcome {
            mapping,
            retargeted,
            clips,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rig::shared::structs::{Channel, ChannelOutputs, Joint, Track, TableMapping};
    use glam::{Quat, Vec3};
    use gltf::animation::Interpolation;

    fn skeleton(name: &str, joints: &[(&str, Mat4)]) -> Skeleton {
        let paths: Vec<&str> = joints.iter().map(|(path, _)| *path).collect();
        let locals: Vec<Mat4> = joints.iter().map(|(_, local)| *local).collect();
        let layout = Skeleton::new(
            name,
            paths.iter().map(|p| Joint::new(p, Mat4::IDENTITY)).collect(),
        )
        .unwrap();
        let world = layout.compose_world(&locals);
        Skeleton::new(
            name,
            paths
                .iter()
                .zip(world.iter())
                .map(|(path, world)| Joint::new(path, world.inverse()))
                .collect(),
        )
        .unwrap()
    }

    fn source_skeleton() -> Skeleton {
        skeleton(
            "source",
            &[
                ("Hips", Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0))),
                (
                    "Hips/Spine",
                    Mat4::from_rotation_translation(
                        Quat::from_rotation_x(0.3),
                        Vec3::new(0.0, 0.2, 0.0),
                    ),
                ),
            ],
        )
    }

    fn target_skeleton() -> Skeleton {
        skeleton(
            "target",
            &[
                ("Root", Mat4::IDENTITY),
                ("Root/Hips_Armature", Mat4::from_translation(Vec3::new(0.0, 90.0, 0.0))),
                (
                    "Root/Hips_Armature/Spine_Armature",
                    Mat4::from_translation(Vec3::new(0.0, 15.0, 0.0)),
                ),
                ("Root/Hips_Armature/Tail_Armature", Mat4::from_translation(Vec3::Z)),
            ],
        )
    }

    fn clip() -> AnimationClip {
        let channel = Channel {
            inputs: vec![0.0],
            outputs: ChannelOutputs::Translations(vec![Vec3::ZERO]),
            interpolation: Interpolation::Linear,
        };
        AnimationClip::new(
            "Walk",
            vec![
                Track::new("Hips", channel.clone()),
                Track::new("Hips/Spine", channel.clone()),
                Track {
                    path: vec![PathSegment::Property("weights".to_string())],
                    channel,
                },
            ],
        )
    }

    #[test]
    fn matched_joints_follow_the_composition_formula() {
        let source = source_skeleton();
        let target = target_skeleton();
        let mapping = SkeletonMapping::new("Root/", "_Armature");
        let retargeted = retarget_joints(&source, &target, &mapping);

        let source_local = source.local_bind_poses();
        let target_local = target.local_bind_poses();
        let spine = target.index_of("Root/Hips_Armature/Spine_Armature").unwrap();
        let expected = source_local[1] * target_local[spine].inverse() * target.inverse_bind_matrix(spine);
        assert!(retargeted
            .skeleton
            .inverse_bind_matrix(spine)
            .abs_diff_eq(expected, 1e-4));
        assert_eq!(retargeted.skeleton.name, RETARGETED_SKELETON_NAME);
        assert_eq!(retargeted.report.matched, 2);
    }

    #[test]
    fn identical_skeletons_reproduce_local_bind_poses() {
        let source = source_skeleton();
        let retargeted = retarget_joints(&source, &source, &SkeletonMapping::new("", ""));
        for index in 0..source.len() {
            assert!(retargeted
                .skeleton
                .inverse_bind_matrix(index)
                .abs_diff_eq(source.inverse_bind_matrix(index), 1e-4));
        }
        assert!(retargeted.report.unmatched_target_joints.is_empty());
    }

    #[test]
    fn unmatched_target_joints_get_identity_and_are_reported() {
        let source = source_skeleton();
        let target = target_skeleton();
        let retargeted = retarget_joints(&source, &target, &SkeletonMapping::new("Root/", "_Armature"));
        assert_eq!(
            retargeted.report.unmatched_target_joints,
            vec!["Root".to_string(), "Root/Hips_Armature/Tail_Armature".to_string()]
        );
        let tail = target.index_of("Root/Hips_Armature/Tail_Armature").unwrap();
        assert_eq!(retargeted.skeleton.inverse_bind_matrix(tail), Mat4::IDENTITY);
        assert_eq!(retargeted.skeleton.inverse_bind_matrix(0), Mat4::IDENTITY);
        assert_ne!(retargeted.skeleton.inverse_bind_matrix(1), Mat4::IDENTITY);
        assert_eq!(retargeted.skeleton.joints().len(), target.len());
        assert_eq!(retargeted.skeleton.parent_of(tail), target.parent_of(tail));
    }

    #[test]
    fn source_skeleton_is_untouched() {
        let source = source_skeleton();
        let before = source.inverse_bind_matrices();
        let _ = retarget_joints(&source, &target_skeleton(), &SkeletonMapping::new("Root/", "_Armature"));
        assert_eq!(source.inverse_bind_matrices(), before);
    }

    #[test]
    fn source_joints_outside_the_target_are_reported() {
        let mut table = TableMapping::new();
        table.insert("Hips", "Root/Hips_Armature").insert("Hips/Spine", "Nowhere");
        let retargeted = retarget_joints(&source_skeleton(), &target_skeleton(), &table);
        assert_eq!(retargeted.report.unplaced_source_joints, vec!["Hips/Spine".to_string()]);
        assert_eq!(retargeted.report.matched, 1);
    }

    #[test]
    fn rewrites_joint_tracks_only() {
        let mut clip = clip();
        let report = retarget_tracks(&mut clip, &SkeletonMapping::new("Root/", "_Armature"));
        assert_eq!(report.rewritten, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(clip.tracks[0].hierarchy_path(), Some("Root/Hips_Armature"));
        assert_eq!(
            clip.tracks[1].hierarchy_path(),
            Some("Root/Hips_Armature/Spine_Armature")
        );
        assert_eq!(
            clip.tracks[2].path,
            vec![PathSegment::Property("weights".to_string())]
        );
    }

    #[test]
    fn unmapped_tracks_are_left_alone() {
        let mut clip = clip();
        let mut table = TableMapping::new();
        table.insert("Hips", "Root/Hips_Armature");
        let report = retarget_tracks(&mut clip, &table);
        assert_eq!(report.rewritten, 1);
        assert_eq!(report.unmapped, vec!["Hips/Spine".to_string()]);
        assert_eq!(clip.tracks[1].hierarchy_path(), Some("Hips/Spine"));
    }

    #[test]
    fn retargeting_tracks_twice_loses_the_target_joints() {
        let target = target_skeleton();
        let mapping = SkeletonMapping::new("Root/", "_Armature");
        let mut clip = clip();
        retarget_tracks(&mut clip, &mapping);
        assert!(clip
            .tracks
            .iter()
            .filter_map(|t| t.hierarchy_path())
            .all(|path| target.index_of(path).is_some()));

        retarget_tracks(&mut clip, &mapping);
        assert!(clip
            .tracks
            .iter()
            .filter_map(|t| t.hierarchy_path())
            .all(|path| target.index_of(path).is_none()));
    }

    fn scene() -> (SceneGraph, NodeKey) {
        let mut scene = SceneGraph::new();
        let owner = scene.create_node("Character", None);
        let model = scene.create_node("Model", Some(owner));
        scene.create_node("Root", Some(model));
        (scene, owner)
    }

    #[test]
    fn session_builds_prefix_from_the_scene_and_retargets_clips() {
        let (scene, owner) = scene();
        let mut config = RetargetConfig::new("Model/Root", &["Walk"]);
        config.default_clip = Some("Walk".to_string());
        let session = RetargetSession::new(config).unwrap();
        let mut library = ClipLibrary::new();
        library.add(clip());

        let outcome = session
            .run(&scene, owner, &mut library, &source_skeleton(), &target_skeleton())
            .unwrap();
        assert_eq!(outcome.mapping.prefix(), "Model/Root/");
        assert_eq!(outcome.clips[0].1.rewritten, 2);
        assert_eq!(
            library.get("Walk").unwrap().tracks[0].hierarchy_path(),
            Some("Model/Root/Hips_Armature")
        );
        assert_eq!(library.default_clip().map(|c| c.name.as_str()), Some("Walk"));
    }

    #[test]
    fn session_fails_on_missing_clip_or_root() {
        let (scene, owner) = scene();
        let mut library = ClipLibrary::new();
        library.add(clip());

        let session = RetargetSession::new(RetargetConfig::new("Model/Root", &["Walk", "Run"])).unwrap();
        let error = session
            .run(&scene, owner, &mut library, &source_skeleton(), &target_skeleton())
            .unwrap_err();
        assert_eq!(error, RigError::ClipNotFound("Run".to_string()));
        assert_eq!(
            library.get("Walk").unwrap().tracks[0].hierarchy_path(),
            Some("Hips")
        );

        let session = RetargetSession::new(RetargetConfig::new("Model/Missing", &["Walk"])).unwrap();
        let error = session
            .run(&scene, owner, &mut library, &source_skeleton(), &target_skeleton())
            .unwrap_err();
        assert_eq!(error, RigError::NodeNotFound("Model/Missing".to_string()));
    }

    #[test]
    fn session_refuses_to_retarget_a_clip_twice() {
        assert!(matches!(
            RetargetSession::new(RetargetConfig::new("Model/Root", &["Walk", "Walk"])),
            Err(RigError::InvalidConfig(_))
        ));
    }
}
