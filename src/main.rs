use anyhow::Context;
use env_logger::Builder;
use log::LevelFilter;
use rig_retarget_rs::rig::{
    instantiate_nodes, load_rig, AnimationPlayer, AttributeName, ClipLibrary, DemoConfig,
    HostVertexBuffer, RetargetSession, SceneGraph, SoftSkin,
};
use std::time;

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let log_level = dotenv::var("LOG").unwrap_or_else(|_| "info".to_string());
    Builder::new()
        .filter(
            None,
            match log_level.as_str() {
                "trace" => LevelFilter::Trace,
                "info" => LevelFilter::Info,
                "warn" => LevelFilter::Warn,
                "debug" => LevelFilter::Debug,
                "error" => LevelFilter::Error,
                _ => LevelFilter::Off,
            },
        )
        .default_format()
        .init();

    let config_path = dotenv::var("CONFIG").context("CONFIG has to point at a demo config file.")?;
    let config = DemoConfig::load(&config_path)?;
    log::info!("Using config: {}", &config_path);

    let source = load_rig(&config.source_model)?;
    let target = load_rig(&config.target_model)?;
    let source_skeleton = source
        .skeletons
        .first()
        .with_context(|| format!("{} has no skin.", &config.source_model))?;

    let mut scene = SceneGraph::new();
    let character = scene.create_node(&config.character_node, None);
    instantiate_nodes(&target, &mut scene, character);

    let mut library = ClipLibrary::new();
    for clip in source.clips.iter() {
        library.add(clip.clone());
    }

    let session = RetargetSession::new(config.retarget.clone())?;
    let mut soft_skins = vec![];
    let mut retargeted_skeletons = vec![];
    for mesh in target.meshes.iter() {
        let target_skeleton = match mesh.skin_index.and_then(|i| target.skeletons.get(i)) {
            Some(skeleton) => skeleton,
            None => {
                log::warn!("Mesh {} has no skin, skipping.", &mesh.name);
                continue;
            }
        };
        // Clips are rewritten once; later meshes only need the joint pass.
        let retargeted = if retargeted_skeletons.is_empty() {
            let outcome = session.run(&scene, character, &mut library, source_skeleton, target_skeleton)?;
            for (name, report) in outcome.clips.iter() {
                log::info!(
                    "Clip {}: {} track(s) rewritten, {} unmapped.",
                    name,
                    report.rewritten,
                    report.unmapped.len()
                );
            }
            outcome.retargeted
        } else {
            let mapping = session.mapping_for(&scene, character)?;
            rig_retarget_rs::rig::retarget_joints(source_skeleton, target_skeleton, &mapping)
        };
        log::info!(
            "Skeleton {}: {} joint(s) matched, {} unmatched.",
            &target_skeleton.name,
            retargeted.report.matched,
            retargeted.report.unmatched_target_joints.len()
        );
        let soft_skin = SoftSkin::new(mesh, &retargeted.skeleton, &scene, character, |_| {
            HostVertexBuffer::new()
        })?;
        soft_skins.push(soft_skin);
        retargeted_skeletons.push(retargeted);
    }

    let mut player = AnimationPlayer::from_default_clip(&library)?;
    log::info!("Playing clip {}.", player.clip_name());
    let delta_time = 1.0 / config.frame_rate as f64;
    let start = time::Instant::now();
    for _ in 0..config.frames {
        player.update(delta_time, &library, &mut scene, character)?;
        for soft_skin in soft_skins.iter_mut() {
            soft_skin.update(&scene);
        }
    }
    log::info!(
        "Skinned {} frame(s) in {:.3}s, clip time {:.3}s.",
        config.frames,
        start.elapsed().as_secs_f64(),
        player.time()
    );

    for soft_skin in soft_skins.iter() {
        for skinner in soft_skin.skinners() {
            let positions = skinner.render_result().read_vec3(AttributeName::Position);
            if let Some(first) = positions.first() {
                log::info!(
                    "{} vertices uploaded {} time(s), first at {:?}.",
                    positions.len(),
                    skinner.render_result().upload_count(),
                    first
                );
            }
        }
    }
    Ok(())
}
