use approx::assert_relative_eq;
use sky_king::{
    Command, Config, Experience, SceneError, TripState,
    camera::LookAt,
    data_structures::scene_graph::PartTag,
    resources::AssetId,
};

use crate::common::test_utils::{
    MemoryFetch, RecordingOverlay, complete_fetch, fetch_with_model, node,
};

mod common;

fn experience(fetch: MemoryFetch) -> (Experience, RecordingOverlay) {
    let overlay = RecordingOverlay::new();
    let experience = Experience::new(Config::default(), Box::new(fetch), Box::new(overlay.clone()));
    (experience, overlay)
}

fn run_for(experience: &mut Experience, seconds: f32) {
    let steps = (seconds / 0.1).round() as usize;
    for _ in 0..steps {
        experience.advance(0.1);
    }
}

#[tokio::test]
async fn should_load_and_assemble_headless() {
    let config = Config::default();
    let (mut experience, overlay) = experience(complete_fetch(&config.assets));

    experience.initialize(None).await.unwrap();

    assert!(experience.is_ready());
    assert!(experience.parts().is_some());
    assert_eq!(experience.trip_state(), TripState::Idle);
    assert!(!experience.cache().has_renderer());
    let log = overlay.log.borrow();
    assert!(log.percents.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(log.percents.last(), Some(&100));
    assert_eq!(log.reveals, 1);
}

#[tokio::test]
async fn should_initialize_only_once() {
    let config = Config::default();
    let (mut experience, overlay) = experience(complete_fetch(&config.assets));

    experience.initialize(None).await.unwrap();
    let nodes = experience.cache_mut().scene().len();
    experience.initialize(None).await.unwrap();

    assert_eq!(experience.cache_mut().scene().len(), nodes);
    assert_eq!(overlay.log.borrow().reveals, 1);
}

#[tokio::test]
async fn should_ignore_commands_until_ready() {
    let config = Config::default();
    let (mut experience, _) = experience(complete_fetch(&config.assets));

    assert!(!experience.start_engine());
    assert!(!experience.command(Command::Fly));
    assert!(!experience.end_flight_trip());
    experience.advance(1.0);

    experience.initialize(None).await.unwrap();
    assert!(experience.start_engine());
}

#[tokio::test]
async fn should_play_a_whole_trip() {
    let config = Config::default();
    let (mut experience, overlay) = experience(complete_fetch(&config.assets));
    experience.initialize(None).await.unwrap();

    assert!(experience.command(Command::StartEngine));
    run_for(&mut experience, 1.0);
    assert!(experience.command(Command::Fly));
    assert_eq!(experience.trip_state(), TripState::Flying);
    run_for(&mut experience, 21.0);
    assert_eq!(overlay.log.borrow().end_trip, vec![true]);

    assert!(experience.command(Command::EndTrip));
    assert_eq!(experience.trip_state(), TripState::Idle);
    run_for(&mut experience, 3.0);
    assert_eq!(overlay.log.borrow().end_trip, vec![true, false]);
    assert_eq!(experience.sequencer().map(|s| s.active_jobs()), Some(0));
}

#[tokio::test]
async fn should_point_the_camera_at_what_it_follows() {
    let config = Config::default();
    let (mut experience, _) = experience(complete_fetch(&config.assets));
    experience.initialize(None).await.unwrap();
    let rig = experience.sequencer().unwrap().rig();

    experience.advance(0.1);
    {
        let (scene, camera, _) = experience.cache_mut().stage_parts().unwrap();
        assert_eq!(camera.looks_at, LookAt::Aircraft);
        let main = scene.world_position(rig.main).unwrap();
        assert_relative_eq!(camera.target.z, main.z);
    }

    experience.start_engine();
    experience.fly_aircraft();
    run_for(&mut experience, 14.0);

    let (scene, camera, _) = experience.cache_mut().stage_parts().unwrap();
    assert_eq!(camera.looks_at, LookAt::Text);
    let banner = scene.world_position(rig.banner).unwrap();
    assert_relative_eq!(camera.target.x, banner.x);
    assert_relative_eq!(camera.target.z, banner.z);
}

#[tokio::test]
async fn should_keep_the_orbit_within_its_distance_limits() {
    let config = Config::default();
    let (mut experience, _) = experience(complete_fetch(&config.assets));
    experience.initialize(None).await.unwrap();

    run_for(&mut experience, 0.5);

    let (_, camera, controls) = experience.cache_mut().stage_parts().unwrap();
    let distance = cgmath::MetricSpace::distance(camera.position, controls.target);
    assert!(distance <= config.controls.max_distance + 1e-3);
    assert!(distance >= config.controls.min_distance - 1e-3);
}

#[tokio::test]
async fn should_fail_when_the_model_has_no_fan() {
    let config = Config::default();
    let model = [
        node("Aircraft").children(&[1]),
        node("controllerMain").with_mesh(),
    ];
    let (mut experience, overlay) = experience(fetch_with_model(&config.assets, &model));

    let result = experience.initialize(None).await;

    assert!(matches!(
        result,
        Err(SceneError::MissingNamedPart(PartTag::FanController))
    ));
    assert!(!experience.is_ready());
    // Every file arrived, but the scene never came together
    assert_eq!(overlay.log.borrow().percents.last(), Some(&100));
    assert_eq!(overlay.log.borrow().reveals, 0);
    assert!(!experience.start_engine());
    assert_eq!(experience.trip_state(), TripState::Idle);
}

#[tokio::test]
async fn should_stay_on_the_loading_screen_when_an_asset_fails() {
    let config = Config::default();
    let mut fetch = complete_fetch(&config.assets);
    fetch.fail(config.assets.matcap_texture.clone());
    let (mut experience, overlay) = experience(fetch);

    let result = experience.initialize(None).await;

    assert!(matches!(
        result,
        Err(SceneError::AssetLoad {
            asset_id: AssetId::MatcapTexture,
            ..
        })
    ));
    assert!(!experience.is_ready());
    assert_eq!(overlay.log.borrow().reveals, 0);
    // No retries: a second attempt does nothing
    assert!(experience.initialize(None).await.is_ok());
    assert!(!experience.is_ready());
}

#[tokio::test]
async fn should_cap_the_pixel_ratio_when_resized_in_physical_pixels() {
    let config = Config::default();
    let (mut experience, _) = experience(complete_fetch(&config.assets));
    experience.initialize(None).await.unwrap();

    experience.resize(3000, 1500, 3.0);

    let sizes = experience.cache().current_sizes().unwrap();
    assert_eq!((sizes.width, sizes.height), (1000, 500));
    assert_relative_eq!(sizes.pixel_ratio, 2.0);
    assert_eq!(sizes.physical(), (2000, 1000));
}
