use glam::{Mat4, Quat, Vec3};
use gltf::animation::Interpolation;
use rig_retarget_rs::rig::{
    skeleton_to_nodes, AnimationClip, AnimationPlayer, AttributeName, BoneRenderer, Channel,
    ChannelOutputs, ClipLibrary, HostVertexBuffer, Joint, NodeKey, RetargetConfig,
    RetargetSession, RigError, SceneGraph, Skeleton, SkinnedMesh, SkinnedPrimitive, SoftSkin,
    Track,
};
use std::cell::RefCell;
use std::rc::Rc;

fn translation(y: f32) -> Mat4 {
    Mat4::from_translation(Vec3::new(0.0, y, 0.0))
}

fn source_skeleton() -> Skeleton {
    Skeleton::new(
        "source",
        vec![
            Joint::new("Hips", translation(1.0).inverse()),
            Joint::new("Hips/Spine", translation(2.0).inverse()),
        ],
    )
    .unwrap()
}

fn target_skeleton() -> Skeleton {
    Skeleton::new(
        "target",
        vec![
            Joint::new("Root/Hips_Armature", translation(1.0).inverse()),
            Joint::new("Root/Hips_Armature/Spine_Armature", translation(2.0).inverse()),
            Joint::new("Root/Hips_Armature/Tail_Armature", translation(0.5).inverse()),
        ],
    )
    .unwrap()
}

fn body() -> SkinnedMesh {
    SkinnedMesh {
        name: "Body".to_string(),
        primitives: vec![SkinnedPrimitive {
            positions: vec![0.0, 1.0, 0.0, 0.0, 2.5, 0.0, 0.0, 0.5, 0.0],
            normals: Some(vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0]),
            joints: Some(vec![0, 0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0]),
            weights: Some(vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]),
            indices: Some(vec![0, 1, 2]),
        }],
        skin_index: Some(0),
    }
}

fn library() -> ClipLibrary {
    let mut library = ClipLibrary::new();
    library.add(AnimationClip::new(
        "Walk",
        vec![
            Track::new(
                "Hips",
                Channel {
                    inputs: vec![0.0, 1.0],
                    outputs: ChannelOutputs::Translations(vec![
                        Vec3::new(0.0, 1.0, 0.0),
                        Vec3::new(2.0, 1.0, 0.0),
                    ]),
                    interpolation: Interpolation::Linear,
                },
            ),
            Track::new(
                "Hips/Spine",
                Channel {
                    inputs: vec![0.0],
                    outputs: ChannelOutputs::Rotations(vec![Quat::IDENTITY]),
                    interpolation: Interpolation::Step,
                },
            ),
        ],
    ));
    library.add(AnimationClip::new("Idle", vec![]));
    library
}

fn character(scene: &mut SceneGraph) -> (NodeKey, Vec<NodeKey>) {
    let character = scene.create_node("Character", None);
    let root = scene.create_node("Root", Some(character));
    let joints = skeleton_to_nodes(&target_skeleton(), scene, Some(root));
    (character, joints)
}

fn walk_config() -> RetargetConfig {
    let mut config = RetargetConfig::new("Root", &["Walk"]);
    config.default_clip = Some("Walk".to_string());
    config
}

#[test]
fn retargeted_clip_drives_the_target_mesh() {
    let mut scene = SceneGraph::new();
    let (character, _) = character(&mut scene);
    let mut library = library();
    let target = target_skeleton();

    let session = RetargetSession::new(walk_config()).unwrap();
    let outcome = session
        .run(&scene, character, &mut library, &source_skeleton(), &target)
        .unwrap();

    assert_eq!(outcome.mapping.get("Hips/Spine"), "Root/Hips_Armature/Spine_Armature");
    assert_eq!(outcome.retargeted.report.matched, 2);
    assert_eq!(
        outcome.retargeted.report.unmatched_target_joints,
        vec!["Root/Hips_Armature/Tail_Armature".to_string()]
    );
    assert_eq!(outcome.clips.len(), 1);
    assert_eq!(outcome.clips[0].1.rewritten, 2);
    assert_eq!(
        library.get("Walk").unwrap().tracks[0].hierarchy_path(),
        Some("Root/Hips_Armature")
    );

    // Same local shapes on both sides keep the target's own bind matrices.
    let retargeted = &outcome.retargeted.skeleton;
    for index in 0..2 {
        assert!(retargeted
            .inverse_bind_matrix(index)
            .abs_diff_eq(target.inverse_bind_matrix(index), 1e-5));
    }
    assert_eq!(retargeted.inverse_bind_matrix(2), Mat4::IDENTITY);

    let mut soft_skin = SoftSkin::new(&body(), retargeted, &scene, character, |_| {
        HostVertexBuffer::new()
    })
    .unwrap();
    soft_skin.update(&scene);
    let skinner = &soft_skin.skinners()[0];
    assert_eq!(skinner.unresolved_joint_count(), 0);
    let rest = skinner.render_result().read_vec3(AttributeName::Position);
    assert!(rest[0].abs_diff_eq(Vec3::new(0.0, 1.0, 0.0), 1e-5));
    assert!(rest[1].abs_diff_eq(Vec3::new(0.0, 2.5, 0.0), 1e-5));
    // The unmatched tail keeps an identity bind matrix, so its vertex is
    // moved by the full tail transform.
    assert!(rest[2].abs_diff_eq(Vec3::new(0.0, 1.0, 0.0), 1e-5));

    let mut player = AnimationPlayer::from_default_clip(&library).unwrap();
    assert_eq!(player.clip_name(), "Walk");
    assert_eq!(player.update(0.5, &library, &mut scene, character).unwrap(), 0);
    soft_skin.update(&scene);
    let skinner = &soft_skin.skinners()[0];
    let walked = skinner.render_result().read_vec3(AttributeName::Position);
    assert!(walked[0].abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), 1e-5));
    assert!(walked[1].abs_diff_eq(Vec3::new(1.0, 2.5, 0.0), 1e-5));
    assert!(walked[2].abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), 1e-5));

    let normals = skinner.render_result().read_vec3(AttributeName::Normal);
    assert!(normals.iter().all(|n| n.abs_diff_eq(Vec3::X, 1e-5)));
    assert_eq!(skinner.render_result().upload_count(), 4);
}

#[test]
fn missing_clip_leaves_the_library_untouched() {
    let mut scene = SceneGraph::new();
    let (character, _) = character(&mut scene);
    let mut library = library();

    let session = RetargetSession::new(RetargetConfig::new("Root", &["Walk", "Run"])).unwrap();
    let result = session.run(&scene, character, &mut library, &source_skeleton(), &target_skeleton());
    assert_eq!(result.err(), Some(RigError::ClipNotFound("Run".to_string())));
    assert_eq!(library.get("Walk").unwrap().tracks[0].hierarchy_path(), Some("Hips"));
    assert!(library.default_clip().is_none());
}

#[test]
fn missing_rig_root_is_an_error() {
    let mut scene = SceneGraph::new();
    let (character, _) = character(&mut scene);
    let mut library = library();

    let session = RetargetSession::new(RetargetConfig::new("Armature", &["Walk"])).unwrap();
    let result = session.run(&scene, character, &mut library, &source_skeleton(), &target_skeleton());
    assert_eq!(result.err(), Some(RigError::NodeNotFound("Armature".to_string())));
    assert!(RetargetSession::new(RetargetConfig::new("/", &[])).is_err());
}

#[test]
fn bone_renderer_follows_the_played_clip() {
    let handle = Rc::new(RefCell::new(SceneGraph::new()));
    let (character, joints) = character(&mut handle.borrow_mut());
    let mut library = library();
    let session = RetargetSession::new(walk_config()).unwrap();
    session
        .run(
            &handle.borrow(),
            character,
            &mut library,
            &source_skeleton(),
            &target_skeleton(),
        )
        .unwrap();

    let mut renderer = BoneRenderer::new(&handle, &joints).unwrap();
    assert_eq!(renderer.bones().len(), 2);
    assert!(renderer.update());
    assert!(!renderer.update());

    let mut player = AnimationPlayer::from_default_clip(&library).unwrap();
    player
        .update(0.5, &library, &mut handle.borrow_mut(), character)
        .unwrap();
    assert!(renderer.update());
    let spine_bone = renderer
        .bones()
        .iter()
        .find(|bone| bone.name == "Hips_Armature-Spine_Armature")
        .unwrap();
    assert!(spine_bone
        .transform
        .transform_point3(Vec3::Y)
        .abs_diff_eq(Vec3::new(1.0, 2.0, 0.0), 1e-5));
}
