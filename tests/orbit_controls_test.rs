use approx::assert_relative_eq;
use cgmath::{EuclideanSpace, InnerSpace, MetricSpace, Point3};
use sky_king::{
    camera::{Camera, OrbitControls},
    config::{CameraConfig, ControlsConfig},
};

fn rig() -> (Camera, OrbitControls) {
    let camera = Camera::new(&CameraConfig::default(), 800, 600);
    let mut controls = OrbitControls::new(&ControlsConfig::default());
    controls.set_viewport_height(600);
    (camera, controls)
}

fn distance(camera: &Camera, controls: &OrbitControls) -> f32 {
    camera.position.distance(controls.target)
}

#[test]
fn should_pull_a_distant_camera_into_range() {
    let (mut camera, mut controls) = rig();
    assert!(distance(&camera, &controls) > 10.0);

    controls.update(&mut camera);

    assert_relative_eq!(distance(&camera, &controls), 10.0, epsilon = 1e-4);
}

#[test]
fn should_stop_zooming_at_the_minimum_distance() {
    let (mut camera, mut controls) = rig();

    for _ in 0..20 {
        controls.dolly(10.0);
        controls.update(&mut camera);
    }

    assert_relative_eq!(distance(&camera, &controls), 4.0, epsilon = 1e-4);
}

#[test]
fn should_glide_after_a_drag_and_keep_the_distance() {
    let (mut camera, mut controls) = rig();
    controls.update(&mut camera);
    let start = camera.position;

    controls.rotate_by_pixels(150.0, 0.0);
    controls.update(&mut camera);
    let first_step = camera.position;
    let moved_again = controls.update(&mut camera);

    assert!(moved_again);
    assert!((first_step - start).magnitude() > 0.0);
    assert_relative_eq!(distance(&camera, &controls), 10.0, epsilon = 1e-4);
    // Height is untouched by a horizontal drag
    assert_relative_eq!(camera.position.y, start.y, epsilon = 1e-4);
}

#[test]
fn should_settle_once_the_pending_rotation_decays() {
    let (mut camera, mut controls) = rig();
    controls.rotate_by_pixels(30.0, 10.0);

    for _ in 0..600 {
        controls.update(&mut camera);
    }

    assert!(!controls.update(&mut camera));
}

#[test]
fn should_never_flip_over_the_pole() {
    let (mut camera, mut controls) = rig();

    for _ in 0..200 {
        controls.rotate_by_pixels(0.0, 5000.0);
        controls.update(&mut camera);
    }

    let offset = camera.position - controls.target;
    assert!(offset.x.is_finite() && offset.y.is_finite() && offset.z.is_finite());
    assert!(offset.normalize().y > 0.99);
}

#[test]
fn should_orbit_around_the_target() {
    let (mut camera, mut controls) = rig();
    controls.target = Point3::new(1.0, 0.0, 0.0);

    controls.update(&mut camera);

    assert_relative_eq!(distance(&camera, &controls), 10.0, epsilon = 1e-4);
    assert!(camera.position.to_vec().magnitude() > 0.0);
}
