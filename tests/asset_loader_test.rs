use futures::StreamExt;
use sky_king::{
    SceneError,
    config::AssetManifest,
    resources::{AssetId, AssetLoader, LoadEvent, model::load_model_tree},
};

use crate::common::test_utils::{
    MemoryFetch, TRIANGLE, aircraft_nodes, complete_fetch, gltf_files, png_bytes,
};

mod common;

async fn load(fetch: &MemoryFetch, manifest: &AssetManifest) -> Vec<Result<LoadEvent, SceneError>> {
    AssetLoader::new(fetch, manifest).load_all().collect().await
}

#[test]
fn should_declare_every_asset_once() {
    let manifest = AssetManifest::default();
    let fetch = MemoryFetch::new();
    let declared = AssetLoader::new(&fetch, &manifest).declared();

    assert_eq!(declared.len(), 11);
    assert_eq!(declared[0], (AssetId::Model, "aircraft.glb"));
    assert!(declared.contains(&(AssetId::EnvMapFace(3), "envMap/ny.png")));
    assert!(declared.contains(&(AssetId::BannerText, "fonts/banner_text.glb")));
}

#[tokio::test]
async fn should_report_progress_for_every_asset_then_complete() {
    let manifest = AssetManifest::default();
    let fetch = complete_fetch(&manifest);

    let events = load(&fetch, &manifest).await;

    assert_eq!(events.len(), 12);
    let progress: Vec<_> = events[..11]
        .iter()
        .map(|event| match event {
            Ok(LoadEvent::Progress(progress)) => *progress,
            other => panic!("expected progress, got {other:?}"),
        })
        .collect();
    assert!(progress.windows(2).all(|pair| pair[0].loaded < pair[1].loaded));
    assert_eq!(progress.last().map(|p| (p.loaded, p.total)), Some((11, 11)));
    assert_eq!(progress.last().map(|p| p.percent()), Some(100));

    match &events[11] {
        Ok(LoadEvent::Complete(assets)) => {
            assert_eq!(assets.model.nodes.len(), 4);
            assert_eq!(assets.model.roots, vec![0]);
            assert_eq!(assets.model.meshes.len(), 1);
            assert_eq!(assets.baked.dimensions(), (2, 2));
            assert!(assets.env_map.iter().all(|face| face.dimensions() == (2, 2)));
        }
        other => panic!("expected completion, got {other:?}"),
    }
}

#[tokio::test]
async fn should_stop_at_the_first_failing_asset() {
    let manifest = AssetManifest::default();
    let mut fetch = complete_fetch(&manifest);
    fetch.fail(manifest.env_map[2].clone());

    let events = load(&fetch, &manifest).await;

    assert!(matches!(
        events.last(),
        Some(Err(SceneError::AssetLoad {
            asset_id: AssetId::EnvMapFace(2),
            ..
        }))
    ));
    assert_eq!(events.iter().filter(|event| event.is_err()).count(), 1);
    assert!(!events
        .iter()
        .any(|event| matches!(event, Ok(LoadEvent::Complete(_)))));
}

#[tokio::test]
async fn should_name_the_texture_that_does_not_decode() {
    let manifest = AssetManifest::default();
    let mut fetch = complete_fetch(&manifest);
    fetch.insert(manifest.baked_texture.clone(), b"definitely not a jpeg".to_vec());

    let events = load(&fetch, &manifest).await;

    match events.last() {
        Some(Err(err @ SceneError::AssetLoad { asset_id, .. })) => {
            assert_eq!(*asset_id, AssetId::BakedTexture);
            assert!(err.to_string().contains("baked texture"));
        }
        other => panic!("expected a baked texture failure, got {other:?}"),
    }
}

#[tokio::test]
async fn should_fail_when_the_model_buffer_is_missing() {
    let manifest = AssetManifest::default();
    let mut fetch = MemoryFetch::new();
    let mut files = gltf_files(&manifest.model, &aircraft_nodes(), &[0], TRIANGLE);
    files.retain(|(path, _)| !path.ends_with(".bin"));
    fetch.extend(files);

    let result = load_model_tree(&fetch, &manifest.model).await;

    assert!(result.is_err());
}

#[tokio::test]
async fn should_read_the_hierarchy_and_geometry_of_a_model() {
    let mut fetch = MemoryFetch::new();
    fetch.extend(gltf_files("models/plane.gltf", &aircraft_nodes(), &[0], TRIANGLE));

    let tree = load_model_tree(&fetch, "models/plane.gltf").await.unwrap();

    let names: Vec<_> = tree.nodes.iter().map(|node| node.name.as_str()).collect();
    assert_eq!(
        names,
        ["Aircraft", "controllerMain", "controllerFan", "aircraftGlass"]
    );
    assert_eq!(tree.nodes[1].children, vec![2, 3]);
    assert_eq!(tree.nodes[1].transform.position.z, 2.0);
    assert_eq!(tree.nodes[2].mesh, Some(0));
    assert_eq!(tree.meshes[0].vertices.len(), 3);
    // Non-indexed geometry draws its vertices in order
    assert_eq!(tree.meshes[0].indices, vec![0, 1, 2]);
}

#[tokio::test]
async fn should_reject_data_uri_buffers() {
    let json = r#"{
  "asset": {"version": "2.0"},
  "buffers": [{"uri": "data:application/octet-stream;base64,AAAA", "byteLength": 3}]
}"#;
    let mut fetch = MemoryFetch::new();
    fetch.insert("inline.gltf", json.as_bytes().to_vec());

    let result = load_model_tree(&fetch, "inline.gltf").await;

    assert!(result.is_err());
}

#[tokio::test]
async fn should_accept_textures_in_any_supported_encoding() {
    let manifest = AssetManifest::default();
    let mut fetch = complete_fetch(&manifest);
    // A PNG served under a .jpg name still decodes
    fetch.insert(manifest.baked_texture.clone(), png_bytes([1, 2, 3, 255]));

    let events = load(&fetch, &manifest).await;

    assert!(matches!(events.last(), Some(Ok(LoadEvent::Complete(_)))));
}
