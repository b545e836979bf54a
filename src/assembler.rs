//! Places decoded assets into the scene and finds the animated parts.

use std::collections::BTreeSet;

use cgmath::Vector3;

use crate::{
    config::{ModelConfig, TextConfig},
    data_structures::{
        instance::Instance,
        scene_graph::{MaterialKind, ModelTree, Node, NodeId, PartTag, Scene},
    },
    error::{SceneError, SceneResult},
};

/// Nodes of the aircraft the sequencer drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AircraftParts {
    pub root: NodeId,
    pub main: NodeId,
    pub fan: NodeId,
}

/// Inserts the aircraft, scales its top-level node and assigns materials.
///
/// Fails with [`SceneError::MissingNamedPart`] when the model has no main
/// controller or no fan controller. The nodes stay in the scene either way.
pub fn assemble(model: ModelTree, scene: &mut Scene, config: &ModelConfig) -> SceneResult<AircraftParts> {
    let roots = scene.insert_tree(model, None);
    let Some(&root) = roots.first() else {
        return Err(SceneError::MissingNamedPart(PartTag::MainController));
    };
    if let Some(node) = scene.node_mut(root) {
        node.local.position = Vector3::new(0.0, 0.0, 0.0);
        node.local.scale = Vector3::new(config.scale, config.scale, config.scale);
    }

    let mut main = None;
    let mut fan = None;
    let inserted: Vec<NodeId> = roots.iter().flat_map(|&root| scene.descendants(root)).collect();
    for id in inserted {
        let Some(node) = scene.node_mut(id) else {
            continue;
        };
        node.material = match node.tag {
            PartTag::Glass => MaterialKind::Glass,
            _ => MaterialKind::Baked,
        };
        match node.tag {
            PartTag::MainController => {
                main.get_or_insert(id);
            }
            PartTag::FanController => {
                fan.get_or_insert(id);
            }
            PartTag::Glass | PartTag::Unmarked => {}
        }
    }

    let parts = AircraftParts {
        root,
        main: main.ok_or(SceneError::MissingNamedPart(PartTag::MainController))?,
        fan: fan.ok_or(SceneError::MissingNamedPart(PartTag::FanController))?,
    };
    log::info!("Assembled aircraft with {} nodes", scene.len());
    Ok(parts)
}

/// Inserts a pre-extruded text mesh under a new container node and returns the container.
pub fn place_text(tree: ModelTree, scene: &mut Scene, text: &TextConfig) -> NodeId {
    let transform = Instance {
        position: text.position.into(),
        rotation: text.rotation.into(),
        scale: text.scale().into(),
    };
    let mut container = Node::new(text.content.clone()).with_transform(transform);
    container.material = MaterialKind::Matcap;
    let container = scene.add_node(container, None);
    scene.insert_tree(tree, Some(container));

    let subtree = scene.descendants(container);
    let mut meshes = BTreeSet::new();
    for &id in &subtree {
        if let Some(node) = scene.node_mut(id) {
            node.material = MaterialKind::Matcap;
            meshes.extend(node.mesh);
        }
    }

    if text.center {
        center_meshes(scene, &meshes);
    }
    container
}

/// Moves the geometry of `meshes` so their combined bounding box is centred on the origin.
fn center_meshes(scene: &mut Scene, meshes: &BTreeSet<usize>) {
    let bounds = meshes
        .iter()
        .filter_map(|&idx| scene.meshes().get(idx)?.bounds())
        .reduce(|(min_a, max_a), (min_b, max_b)| {
            (
                [0, 1, 2].map(|axis| min_a[axis].min(min_b[axis])),
                [0, 1, 2].map(|axis| max_a[axis].max(max_b[axis])),
            )
        });
    let Some((min, max)) = bounds else {
        return;
    };
    let offset = [0, 1, 2].map(|axis| -(min[axis] + max[axis]) * 0.5);
    for &idx in meshes {
        if let Some(mesh) = scene.mesh_mut(idx) {
            mesh.translate(offset);
        }
    }
}
