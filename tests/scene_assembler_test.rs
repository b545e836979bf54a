use approx::assert_relative_eq;
use sky_king::{
    SceneError,
    assembler::{assemble, place_text},
    config::{Config, ModelConfig},
    data_structures::{
        instance::Instance,
        model::{MeshData, ModelVertex},
        scene_graph::{MaterialKind, ModelNode, ModelTree, PartTag, Scene},
    },
};

fn mesh(points: &[[f32; 3]]) -> MeshData {
    let mut mesh = MeshData {
        name: "mesh".to_string(),
        ..Default::default()
    };
    let vertices = points
        .iter()
        .map(|&position| ModelVertex {
            position,
            ..Default::default()
        })
        .collect();
    mesh.append(vertices, (0..points.len() as u32).collect());
    mesh
}

fn model_node(name: &str, mesh: Option<usize>, children: &[usize]) -> ModelNode {
    ModelNode {
        name: name.to_string(),
        transform: Instance::new(),
        mesh,
        children: children.to_vec(),
    }
}

fn aircraft(with_fan: bool) -> ModelTree {
    let mut nodes = vec![
        model_node("Aircraft", None, &[1]),
        model_node("controllerMain", None, &[2, 3]),
        model_node("aircraftGlass", Some(0), &[]),
        model_node("body", Some(0), &[]),
    ];
    if with_fan {
        nodes.push(model_node("controllerFan", Some(0), &[]));
        nodes[1].children.push(4);
    }
    ModelTree {
        nodes,
        roots: vec![0],
        meshes: vec![mesh(&[[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]])],
    }
}

fn text_tree(points: &[[f32; 3]]) -> ModelTree {
    ModelTree {
        nodes: vec![model_node("glyphs", Some(0), &[])],
        roots: vec![0],
        meshes: vec![mesh(points)],
    }
}

#[test]
fn should_find_the_animated_parts_and_scale_the_top_node() {
    let mut scene = Scene::new();

    let parts = assemble(aircraft(true), &mut scene, &ModelConfig::default()).unwrap();

    assert_eq!(scene.node(parts.main).map(|n| n.tag), Some(PartTag::MainController));
    assert_eq!(scene.node(parts.fan).map(|n| n.tag), Some(PartTag::FanController));
    let root = scene.node(parts.root).unwrap();
    assert_relative_eq!(root.local.scale.x, 0.2);
    assert_relative_eq!(root.local.scale.z, 0.2);
    assert_eq!(scene.node(parts.fan).and_then(|n| n.parent()), Some(parts.main));
}

#[test]
fn should_give_glass_its_own_material() {
    let mut scene = Scene::new();

    assemble(aircraft(true), &mut scene, &ModelConfig::default()).unwrap();

    for (_, node) in scene.nodes() {
        let expected = if node.tag == PartTag::Glass {
            MaterialKind::Glass
        } else {
            MaterialKind::Baked
        };
        assert_eq!(node.material, expected, "{}", node.name);
    }
    scene.update_world_transforms();
    let glass = scene.find_tag(PartTag::Glass).unwrap();
    assert!(scene.node(glass).unwrap().is_transparent());
}

#[test]
fn should_fail_without_a_fan_controller() {
    let mut scene = Scene::new();

    let result = assemble(aircraft(false), &mut scene, &ModelConfig::default());

    assert!(matches!(
        result,
        Err(SceneError::MissingNamedPart(PartTag::FanController))
    ));
}

#[test]
fn should_fail_on_an_empty_model() {
    let mut scene = Scene::new();

    let result = assemble(ModelTree::default(), &mut scene, &ModelConfig::default());

    assert!(matches!(
        result,
        Err(SceneError::MissingNamedPart(PartTag::MainController))
    ));
}

#[test]
fn should_centre_banner_text_on_its_bounds() {
    let config = Config::default();
    let mut scene = Scene::new();

    let container = place_text(
        text_tree(&[[2.0, 0.0, 0.0], [4.0, 0.0, 0.0], [4.0, 2.0, 0.4]]),
        &mut scene,
        &config.banner_text,
    );

    let (min, max) = scene.meshes()[0].bounds().unwrap();
    for axis in 0..3 {
        assert_relative_eq!(min[axis], -max[axis], epsilon = 1e-5);
    }
    assert_relative_eq!(max[0], 1.0);

    let node = scene.node(container).unwrap();
    assert_eq!(node.name, "TO INFINITY AND BEYOUND");
    assert_relative_eq!(node.local.position.z, 200.0);
    assert_relative_eq!(node.local.rotation.y, std::f32::consts::FRAC_PI_2);
    assert_relative_eq!(node.local.scale.x, 1.5);
    assert_relative_eq!(node.local.scale.z, 1.0);
}

#[test]
fn should_leave_header_text_where_it_was_authored() {
    let config = Config::default();
    let mut scene = Scene::new();

    let container = place_text(
        text_tree(&[[2.0, 0.0, 0.0], [4.0, 0.0, 0.0], [4.0, 2.0, 0.0]]),
        &mut scene,
        &config.header_text,
    );

    let (min, _) = scene.meshes()[0].bounds().unwrap();
    assert_eq!(min, [2.0, 0.0, 0.0]);
    assert!(scene.descendants(container).iter().all(|&id| {
        scene.node(id).is_some_and(|node| node.material == MaterialKind::Matcap)
    }));
}

#[test]
fn should_keep_mesh_indices_per_asset_when_placing_several() {
    let mut scene = Scene::new();
    let config = Config::default();

    assemble(aircraft(true), &mut scene, &config.model).unwrap();
    let header = place_text(text_tree(&[[0.0; 3]; 3]), &mut scene, &config.header_text);

    assert_eq!(scene.meshes().len(), 2);
    let glyphs = scene.descendants(header)[1];
    assert_eq!(scene.node(glyphs).and_then(|n| n.mesh), Some(1));
}
