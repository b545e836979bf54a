//! Scene graph and hierarchical scene organization.
//!
//! The scene is an arena of [`Node`]s addressed by [`NodeId`]. Nodes carry a
//! local [`Instance`] transform, an opacity, a [`MaterialKind`] and optionally
//! reference a mesh in the scene's mesh table. Model nodes are tagged once on
//! insertion with a [`PartTag`] so later passes match on the tag instead of
//! the node name.
//!
//! World transforms are not kept up to date on every mutation; call
//! [`Scene::update_world_transforms`] once per frame after animating.

use cgmath::{Matrix4, Point3, SquareMatrix};

use crate::data_structures::{instance::Instance, model::MeshData};

/// Handle to a node inside one [`Scene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Role of a model node, resolved from its authored name.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PartTag {
    #[default]
    Unmarked,
    /// The movable body of the aircraft.
    MainController,
    /// The engine fan.
    FanController,
    Glass,
}

impl PartTag {
    pub fn from_name(name: &str) -> Self {
        match name {
            "controllerMain" => PartTag::MainController,
            "controllerFan" => PartTag::FanController,
            "aircraftGlass" => PartTag::Glass,
            _ => PartTag::Unmarked,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MaterialKind {
    /// Unlit baked lighting texture.
    #[default]
    Baked,
    /// Tinted, see-through.
    Glass,
    /// Normal-indexed matcap texture, used for text.
    Matcap,
}

#[derive(Clone, Debug)]
pub struct Node {
    pub name: String,
    pub tag: PartTag,
    pub local: Instance,
    pub opacity: f32,
    pub material: MaterialKind,
    pub mesh: Option<usize>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    world: Matrix4<f32>,
    world_opacity: f32,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            tag: PartTag::from_name(&name),
            name,
            local: Instance::new(),
            opacity: 1.0,
            material: MaterialKind::default(),
            mesh: None,
            parent: None,
            children: Vec::new(),
            world: Matrix4::identity(),
            world_opacity: 1.0,
        }
    }

    pub fn with_transform(mut self, local: Instance) -> Self {
        self.local = local;
        self
    }

    pub fn with_mesh(mut self, mesh: usize) -> Self {
        self.mesh = Some(mesh);
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// World matrix as of the last [`Scene::update_world_transforms`].
    pub fn world(&self) -> Matrix4<f32> {
        self.world
    }

    /// Own opacity multiplied with every ancestor's.
    pub fn world_opacity(&self) -> f32 {
        self.world_opacity
    }

    pub fn world_position(&self) -> Point3<f32> {
        Point3::new(self.world.w.x, self.world.w.y, self.world.w.z)
    }

    pub fn is_transparent(&self) -> bool {
        self.material == MaterialKind::Glass || self.world_opacity < 1.0
    }
}

/// Decoded node hierarchy of one model asset, not yet part of a scene.
#[derive(Clone, Debug, Default)]
pub struct ModelTree {
    pub nodes: Vec<ModelNode>,
    pub roots: Vec<usize>,
    pub meshes: Vec<MeshData>,
}

#[derive(Clone, Debug, Default)]
pub struct ModelNode {
    pub name: String,
    pub transform: Instance,
    /// Index into [`ModelTree::meshes`].
    pub mesh: Option<usize>,
    pub children: Vec<usize>,
}

#[derive(Debug, Default)]
pub struct Scene {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    meshes: Vec<MeshData>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(idx, node)| (NodeId(idx), node))
    }

    pub fn meshes(&self) -> &[MeshData] {
        &self.meshes
    }

    pub fn mesh_mut(&mut self, idx: usize) -> Option<&mut MeshData> {
        self.meshes.get_mut(idx)
    }

    pub fn add_mesh(&mut self, mesh: MeshData) -> usize {
        self.meshes.push(mesh);
        self.meshes.len() - 1
    }

    /// Adds `node` below `parent`, or as a root without one.
    ///
    /// A parent that does not exist makes the node a root.
    pub fn add_node(&mut self, mut node: Node, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        let parent = parent.filter(|p| p.0 < self.nodes.len());
        node.parent = parent;
        node.children.clear();
        self.nodes.push(node);
        match parent {
            Some(parent) => self.nodes[parent.0].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    /// Copies a decoded model into the scene and returns the ids of its top-level nodes.
    pub fn insert_tree(&mut self, tree: ModelTree, parent: Option<NodeId>) -> Vec<NodeId> {
        let mesh_offset = self.meshes.len();
        self.meshes.extend(tree.meshes);
        tree.roots
            .iter()
            .filter_map(|&root| self.insert_model_node(&tree.nodes, root, parent, mesh_offset, 0))
            .collect()
    }

    fn insert_model_node(
        &mut self,
        nodes: &[ModelNode],
        idx: usize,
        parent: Option<NodeId>,
        mesh_offset: usize,
        depth: usize,
    ) -> Option<NodeId> {
        // Cycles are cut once the depth exceeds the node count
        if depth > nodes.len() {
            log::warn!("Model node hierarchy is cyclic at node {idx}, skipping.");
            return None;
        }
        let source = nodes.get(idx)?;
        let mut node = Node::new(source.name.clone()).with_transform(source.transform);
        node.mesh = source.mesh.map(|mesh| mesh + mesh_offset);
        let id = self.add_node(node, parent);
        for &child in &source.children {
            self.insert_model_node(nodes, child, Some(id), mesh_offset, depth + 1);
        }
        Some(id)
    }

    /// Depth-first, pre-order ids of `root` and all of its descendants.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };
            order.push(id);
            stack.extend(node.children.iter().rev().copied());
        }
        order
    }

    pub fn find_tag(&self, tag: PartTag) -> Option<NodeId> {
        self.nodes().find(|(_, node)| node.tag == tag).map(|(id, _)| id)
    }

    /// Propagates local transforms and opacities from the roots downwards.
    pub fn update_world_transforms(&mut self) {
        let mut stack: Vec<(NodeId, Matrix4<f32>, f32)> = self
            .roots
            .iter()
            .rev()
            .map(|&root| (root, Matrix4::identity(), 1.0))
            .collect();
        while let Some((id, parent_world, parent_opacity)) = stack.pop() {
            let node = &mut self.nodes[id.0];
            node.world = parent_world * node.local.to_matrix();
            node.world_opacity = parent_opacity * node.opacity;
            let (world, opacity) = (node.world, node.world_opacity);
            stack.extend(node.children.iter().rev().map(|&child| (child, world, opacity)));
        }
    }

    pub fn world_position(&self, id: NodeId) -> Option<Point3<f32>> {
        self.node(id).map(Node::world_position)
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Vector3;

    use super::*;

    #[test]
    fn should_compose_parent_scale_into_child_world_position() {
        let mut scene = Scene::new();
        let mut root = Instance::new();
        root.scale = Vector3::new(0.2, 0.2, 0.2);
        let root = scene.add_node(Node::new("aircraft").with_transform(root), None);
        let child = scene.add_node(
            Node::new("controllerMain").with_transform(Vector3::new(0.0, 0.0, 10.0).into()),
            Some(root),
        );
        scene.update_world_transforms();
        let position = scene.world_position(child).unwrap();
        assert!((position.z - 2.0).abs() < 1e-5);
    }

    #[test]
    fn should_multiply_opacity_down_the_hierarchy() {
        let mut scene = Scene::new();
        let root = scene.add_node(Node::new("text"), None);
        let glyphs = scene.add_node(Node::new("glyphs"), Some(root));
        scene.node_mut(root).unwrap().opacity = 0.5;
        scene.node_mut(glyphs).unwrap().opacity = 0.5;
        scene.update_world_transforms();
        assert_eq!(scene.node(glyphs).unwrap().world_opacity(), 0.25);
        assert!(scene.node(glyphs).unwrap().is_transparent());
    }

    #[test]
    fn should_visit_descendants_in_pre_order() {
        let tree = ModelTree {
            nodes: vec![
                ModelNode {
                    name: "root".into(),
                    children: vec![1, 2],
                    ..Default::default()
                },
                ModelNode {
                    name: "a".into(),
                    children: vec![3],
                    ..Default::default()
                },
                ModelNode {
                    name: "b".into(),
                    ..Default::default()
                },
                ModelNode {
                    name: "a1".into(),
                    ..Default::default()
                },
            ],
            roots: vec![0],
            meshes: Vec::new(),
        };
        let mut scene = Scene::new();
        let roots = scene.insert_tree(tree, None);
        let names: Vec<_> = scene
            .descendants(roots[0])
            .into_iter()
            .map(|id| scene.node(id).unwrap().name.clone())
            .collect();
        assert_eq!(names, ["root", "a", "a1", "b"]);
    }
}
