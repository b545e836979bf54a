#![allow(dead_code)]

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    io::Cursor,
    pin::Pin,
    rc::Rc,
};

use image::{ImageFormat, Rgba, RgbaImage};
use sky_king::{config::AssetManifest, resources::Fetch, ui::Overlay};

/// In-memory asset source. Paths listed in `failing` error out like a 404.
#[derive(Default)]
pub struct MemoryFetch {
    files: HashMap<String, Vec<u8>>,
    failing: HashSet<String>,
}

impl MemoryFetch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, bytes: Vec<u8>) -> &mut Self {
        self.files.insert(path.into(), bytes);
        self
    }

    pub fn extend(&mut self, files: Vec<(String, Vec<u8>)>) -> &mut Self {
        self.files.extend(files);
        self
    }

    pub fn fail(&mut self, path: impl Into<String>) -> &mut Self {
        self.failing.insert(path.into());
        self
    }
}

impl Fetch for MemoryFetch {
    fn fetch<'a>(
        &'a self,
        path: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<u8>>> + 'a>> {
        Box::pin(async move {
            if self.failing.contains(path) {
                anyhow::bail!("{path}: server returned 500");
            }
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("{path}: not found"))
        })
    }
}

#[derive(Debug, Default)]
pub struct OverlayLog {
    pub percents: Vec<u8>,
    pub ratios: Vec<f32>,
    pub reveals: u32,
    pub end_trip: Vec<bool>,
}

/// Overlay that records every call into a shared log.
#[derive(Clone, Default)]
pub struct RecordingOverlay {
    pub log: Rc<RefCell<OverlayLog>>,
}

impl RecordingOverlay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Overlay for RecordingOverlay {
    fn progress(&mut self, percent: u8, ratio: f32) {
        let mut log = self.log.borrow_mut();
        log.percents.push(percent);
        log.ratios.push(ratio);
    }

    fn reveal(&mut self) {
        self.log.borrow_mut().reveals += 1;
    }

    fn set_end_trip_visible(&mut self, visible: bool) {
        self.log.borrow_mut().end_trip.push(visible);
    }
}

/// One node of a glTF fixture.
#[derive(Clone, Debug)]
pub struct GltfNode {
    pub name: String,
    pub translation: [f32; 3],
    pub mesh: bool,
    pub children: Vec<usize>,
}

pub fn node(name: &str) -> GltfNode {
    GltfNode {
        name: name.to_string(),
        translation: [0.0; 3],
        mesh: false,
        children: Vec::new(),
    }
}

impl GltfNode {
    pub fn at(mut self, translation: [f32; 3]) -> Self {
        self.translation = translation;
        self
    }

    pub fn with_mesh(mut self) -> Self {
        self.mesh = true;
        self
    }

    pub fn children(mut self, children: &[usize]) -> Self {
        self.children = children.to_vec();
        self
    }
}

pub const TRIANGLE: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];

/// A glTF JSON document at `path` plus its external `.bin` buffer next to it.
///
/// Every node flagged `mesh` references the same single-triangle mesh.
pub fn gltf_files(
    path: &str,
    nodes: &[GltfNode],
    roots: &[usize],
    triangle: [[f32; 3]; 3],
) -> Vec<(String, Vec<u8>)> {
    let (dir, file) = match path.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, path),
    };
    let stem = file.rsplit_once('.').map_or(file, |(stem, _)| stem);
    let bin_name = format!("{stem}.bin");
    let bin_path = match dir {
        Some(dir) => format!("{dir}/{bin_name}"),
        None => bin_name.clone(),
    };

    let bin: Vec<u8> = triangle
        .iter()
        .flatten()
        .flat_map(|value| value.to_le_bytes())
        .collect();
    let min = [0, 1, 2].map(|axis| triangle.iter().map(|v| v[axis]).fold(f32::MAX, f32::min));
    let max = [0, 1, 2].map(|axis| triangle.iter().map(|v| v[axis]).fold(f32::MIN, f32::max));

    let nodes_json = nodes
        .iter()
        .map(|node| {
            let mut fields = vec![
                format!("\"name\":\"{}\"", node.name),
                format!(
                    "\"translation\":[{},{},{}]",
                    node.translation[0], node.translation[1], node.translation[2]
                ),
            ];
            if node.mesh {
                fields.push("\"mesh\":0".to_string());
            }
            if !node.children.is_empty() {
                let children = node
                    .children
                    .iter()
                    .map(usize::to_string)
                    .collect::<Vec<_>>()
                    .join(",");
                fields.push(format!("\"children\":[{children}]"));
            }
            format!("{{{}}}", fields.join(","))
        })
        .collect::<Vec<_>>()
        .join(",");
    let roots_json = roots.iter().map(usize::to_string).collect::<Vec<_>>().join(",");

    let json = format!(
        r#"{{
  "asset": {{"version": "2.0"}},
  "scene": 0,
  "scenes": [{{"nodes": [{roots_json}]}}],
  "nodes": [{nodes_json}],
  "meshes": [{{"name": "triangle", "primitives": [{{"attributes": {{"POSITION": 0}}}}]}}],
  "buffers": [{{"uri": "{bin_name}", "byteLength": {len}}}],
  "bufferViews": [{{"buffer": 0, "byteLength": {len}}}],
  "accessors": [{{
    "bufferView": 0,
    "componentType": 5126,
    "count": 3,
    "type": "VEC3",
    "min": [{min0}, {min1}, {min2}],
    "max": [{max0}, {max1}, {max2}]
  }}]
}}"#,
        len = bin.len(),
        min0 = min[0],
        min1 = min[1],
        min2 = min[2],
        max0 = max[0],
        max1 = max[1],
        max2 = max[2],
    );

    vec![(path.to_string(), json.into_bytes()), (bin_path, bin)]
}

/// `Aircraft > controllerMain > (controllerFan, aircraftGlass)`.
pub fn aircraft_nodes() -> Vec<GltfNode> {
    vec![
        node("Aircraft").children(&[1]),
        node("controllerMain").at([0.0, 0.0, 2.0]).children(&[2, 3]),
        node("controllerFan").at([0.0, 0.5, 1.0]).with_mesh(),
        node("aircraftGlass").with_mesh(),
    ]
}

pub fn text_nodes() -> Vec<GltfNode> {
    vec![node("Text").with_mesh()]
}

pub fn png_bytes(colour: [u8; 4]) -> Vec<u8> {
    let img = RgbaImage::from_pixel(2, 2, Rgba(colour));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encoding a fixture PNG");
    bytes
}

/// Every asset of `manifest`, with `model` as the aircraft hierarchy.
pub fn fetch_with_model(manifest: &AssetManifest, model: &[GltfNode]) -> MemoryFetch {
    let mut fetch = MemoryFetch::new();
    fetch
        .extend(gltf_files(&manifest.model, model, &[0], TRIANGLE))
        .extend(gltf_files(&manifest.header_text, &text_nodes(), &[0], TRIANGLE))
        .extend(gltf_files(
            &manifest.banner_text,
            &text_nodes(),
            &[0],
            [[2.0, 0.0, 0.0], [4.0, 0.0, 0.0], [4.0, 2.0, 0.0]],
        ))
        .insert(manifest.baked_texture.clone(), png_bytes([200, 150, 100, 255]))
        .insert(manifest.matcap_texture.clone(), png_bytes([128, 128, 255, 255]));
    for face in &manifest.env_map {
        fetch.insert(face.clone(), png_bytes([20, 40, 80, 255]));
    }
    fetch
}

pub fn complete_fetch(manifest: &AssetManifest) -> MemoryFetch {
    fetch_with_model(manifest, &aircraft_nodes())
}
