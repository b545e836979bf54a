//! glTF/GLB decoding into a [`ModelTree`].
//!
//! Only geometry and the node hierarchy are read; materials come from the
//! experience (baked, glass, matcap), not from the file.

use anyhow::{Context, bail};

use crate::{
    data_structures::{
        instance::Instance,
        model::{MeshData, ModelVertex},
        scene_graph::{ModelNode, ModelTree},
    },
    resources::Fetch,
};

const DRACO: &str = "KHR_draco_mesh_compression";

/// Fetches `path` (and any external buffers next to it) and decodes it.
pub async fn load_model_tree(fetch: &dyn Fetch, path: &str) -> anyhow::Result<ModelTree> {
    let bytes = fetch.fetch(path).await?;
    let gltf = gltf::Gltf::from_slice(&bytes).with_context(|| format!("parsing {path}"))?;

    if gltf.extensions_required().any(|ext| ext == DRACO) {
        bail!("{path} uses Draco mesh compression, re-export it uncompressed");
    }

    // Load buffers
    let mut buffer_data: Vec<Vec<u8>> = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                let blob = gltf
                    .blob
                    .as_deref()
                    .with_context(|| format!("{path} references a binary chunk it does not have"))?;
                buffer_data.push(blob.into());
            }
            gltf::buffer::Source::Uri(uri) if uri.starts_with("data:") => {
                bail!("{path} embeds a data URI buffer, export it as .glb instead");
            }
            gltf::buffer::Source::Uri(uri) => {
                let sibling = relative_to(path, uri);
                let bin = fetch
                    .fetch(&sibling)
                    .await
                    .with_context(|| format!("fetching buffer {sibling}"))?;
                buffer_data.push(bin);
            }
        }
    }

    let meshes = gltf
        .meshes()
        .map(|mesh| read_mesh(&mesh, &buffer_data))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let nodes = gltf
        .nodes()
        .map(|node| {
            let (translation, rotation, scale) = node.transform().decomposed();
            ModelNode {
                name: node.name().unwrap_or_default().to_string(),
                transform: Instance::from_decomposed(translation, rotation, scale),
                mesh: node.mesh().map(|mesh| mesh.index()),
                children: node.children().map(|child| child.index()).collect(),
            }
        })
        .collect::<Vec<_>>();

    let roots = match gltf.default_scene().or_else(|| gltf.scenes().next()) {
        Some(scene) => scene.nodes().map(|node| node.index()).collect(),
        None => {
            let mut is_child = vec![false; nodes.len()];
            for child in nodes.iter().flat_map(|node| &node.children) {
                if let Some(flag) = is_child.get_mut(*child) {
                    *flag = true;
                }
            }
            (0..nodes.len()).filter(|idx| !is_child[*idx]).collect()
        }
    };

    Ok(ModelTree { nodes, roots, meshes })
}

fn read_mesh(mesh: &gltf::Mesh<'_>, buffers: &[Vec<u8>]) -> anyhow::Result<MeshData> {
    let name = mesh.name().map_or_else(|| format!("mesh {}", mesh.index()), str::to_string);
    let mut data = MeshData {
        name,
        ..Default::default()
    };

    for primitive in mesh.primitives() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            log::warn!(
                "Skipping primitive {} of {}: only triangle lists are drawn",
                primitive.index(),
                data.name
            );
            continue;
        }
        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
        let positions: Vec<[f32; 3]> = reader
            .read_positions()
            .with_context(|| format!("primitive {} of {} has no positions", primitive.index(), data.name))?
            .collect();
        let mut normals = reader
            .read_normals()
            .map(|normals| normals.collect::<Vec<_>>())
            .unwrap_or_default();
        normals.resize(positions.len(), [0.0, 1.0, 0.0]);
        let mut tex_coords = reader
            .read_tex_coords(0)
            .map(|coords| coords.into_f32().collect::<Vec<_>>())
            .unwrap_or_default();
        tex_coords.resize(positions.len(), [0.0, 0.0]);

        let vertices = positions
            .into_iter()
            .zip(tex_coords)
            .zip(normals)
            .map(|((position, tex_coords), normal)| ModelVertex {
                position,
                tex_coords,
                normal,
            })
            .collect::<Vec<_>>();
        let indices = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..vertices.len() as u32).collect(),
        };
        data.append(vertices, indices);
    }

    Ok(data)
}

fn relative_to(path: &str, uri: &str) -> String {
    match path.rsplit_once('/') {
        Some((dir, _)) => format!("{dir}/{uri}"),
        None => uri.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_resolve_buffers_next_to_the_model() {
        assert_eq!(relative_to("fonts/header_text.gltf", "header.bin"), "fonts/header.bin");
        assert_eq!(relative_to("aircraft.gltf", "aircraft.bin"), "aircraft.bin");
    }
}
