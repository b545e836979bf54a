//! Asset fetching, decoding and progress reporting.
//!
//! Every declared asset becomes one task in a `FuturesUnordered` set;
//! [`AssetLoader::load_all`] exposes the set as a stream of [`LoadEvent`]s
//! that ends with exactly one [`LoadEvent::Complete`] or the first error.

use std::{fmt, pin::Pin};

use futures::{
    FutureExt, Stream, StreamExt,
    future::LocalBoxFuture,
    stream::{self, FuturesUnordered},
};
use image::RgbaImage;

use crate::{
    config::AssetManifest,
    data_structures::scene_graph::ModelTree,
    error::SceneError,
};

pub mod model;
pub mod texture;

/// Identifies one declared asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetId {
    Model,
    BakedTexture,
    MatcapTexture,
    /// Face index in `+x, -x, +y, -y, +z, -z` order.
    EnvMapFace(usize),
    HeaderText,
    BannerText,
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetId::Model => f.write_str("model"),
            AssetId::BakedTexture => f.write_str("baked texture"),
            AssetId::MatcapTexture => f.write_str("matcap texture"),
            AssetId::EnvMapFace(face) => write!(f, "environment map face {face}"),
            AssetId::HeaderText => f.write_str("header text"),
            AssetId::BannerText => f.write_str("banner text"),
        }
    }
}

/// Source of raw asset bytes, addressed by manifest path.
pub trait Fetch {
    fn fetch<'a>(&'a self, path: &'a str) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<u8>>> + 'a>>;
}

/// Reads from `./assets` natively and from `<origin>/assets` on the web.
#[derive(Clone, Debug)]
pub struct AssetDir {
    root: String,
}

impl AssetDir {
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }
}

impl Default for AssetDir {
    fn default() -> Self {
        Self::new("assets")
    }
}

impl Fetch for AssetDir {
    fn fetch<'a>(&'a self, path: &'a str) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<u8>>> + 'a>> {
        Box::pin(load_binary(&self.root, path))
    }
}

#[cfg(target_arch = "wasm32")]
fn format_url(root: &str, file_name: &str) -> anyhow::Result<reqwest::Url> {
    use anyhow::Context;

    let window = web_sys::window().context("no browser window")?;
    let origin = window
        .location()
        .origin()
        .map_err(|e| anyhow::anyhow!("page origin unavailable: {e:?}"))?;
    let base = reqwest::Url::parse(&format!("{origin}/{root}/"))?;
    Ok(base.join(file_name)?)
}

pub async fn load_binary(root: &str, file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(root, file_name)?;
        reqwest::get(url).await?.error_for_status()?.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        use anyhow::Context;

        let path = std::path::Path::new("./").join(root).join(file_name);
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?
    };

    Ok(data)
}

/// How many of the declared assets have finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgressState {
    pub loaded: usize,
    pub total: usize,
}

impl ProgressState {
    pub fn new(loaded: usize, total: usize) -> Self {
        Self { loaded, total }
    }

    /// `loaded / total`; an empty manifest counts as done.
    pub fn ratio(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            (self.loaded as f32 / self.total as f32).clamp(0.0, 1.0)
        }
    }

    pub fn percent(&self) -> u8 {
        (self.ratio() * 100.0).round() as u8
    }

    pub fn is_complete(&self) -> bool {
        self.loaded >= self.total
    }
}

/// Everything the scene needs, decoded.
#[derive(Debug)]
pub struct LoadedAssets {
    pub model: ModelTree,
    pub header_text: ModelTree,
    pub banner_text: ModelTree,
    pub baked: RgbaImage,
    pub matcap: RgbaImage,
    pub env_map: [RgbaImage; 6],
}

#[derive(Debug)]
pub enum LoadEvent {
    Progress(ProgressState),
    Complete(Box<LoadedAssets>),
}

enum Decoded {
    Model(ModelTree),
    Image(RgbaImage),
}

type AssetTask<'a> = LocalBoxFuture<'a, Result<(AssetId, Decoded), SceneError>>;

#[derive(Default)]
struct PartialAssets {
    model: Option<ModelTree>,
    header_text: Option<ModelTree>,
    banner_text: Option<ModelTree>,
    baked: Option<RgbaImage>,
    matcap: Option<RgbaImage>,
    env_map: [Option<RgbaImage>; 6],
}

impl PartialAssets {
    fn insert(&mut self, id: AssetId, decoded: Decoded) {
        match (id, decoded) {
            (AssetId::Model, Decoded::Model(tree)) => self.model = Some(tree),
            (AssetId::HeaderText, Decoded::Model(tree)) => self.header_text = Some(tree),
            (AssetId::BannerText, Decoded::Model(tree)) => self.banner_text = Some(tree),
            (AssetId::BakedTexture, Decoded::Image(img)) => self.baked = Some(img),
            (AssetId::MatcapTexture, Decoded::Image(img)) => self.matcap = Some(img),
            (AssetId::EnvMapFace(face), Decoded::Image(img)) if face < 6 => self.env_map[face] = Some(img),
            (id, _) => log::warn!("Decoded {id} into an unexpected asset kind, ignoring it."),
        }
    }

    fn finish(self) -> Result<LoadedAssets, SceneError> {
        fn require<T>(value: Option<T>, asset_id: AssetId) -> Result<T, SceneError> {
            value.ok_or_else(|| SceneError::AssetLoad {
                asset_id,
                cause: anyhow::anyhow!("asset was never delivered"),
            })
        }

        let mut env_map = Vec::with_capacity(6);
        for (face, img) in self.env_map.into_iter().enumerate() {
            env_map.push(require(img, AssetId::EnvMapFace(face))?);
        }
        let env_map: [RgbaImage; 6] = env_map.try_into().map_err(|_| SceneError::AssetLoad {
            asset_id: AssetId::EnvMapFace(0),
            cause: anyhow::anyhow!("environment map needs six faces"),
        })?;

        Ok(LoadedAssets {
            model: require(self.model, AssetId::Model)?,
            header_text: require(self.header_text, AssetId::HeaderText)?,
            banner_text: require(self.banner_text, AssetId::BannerText)?,
            baked: require(self.baked, AssetId::BakedTexture)?,
            matcap: require(self.matcap, AssetId::MatcapTexture)?,
            env_map,
        })
    }
}

struct LoadState<'a> {
    tasks: FuturesUnordered<AssetTask<'a>>,
    partial: PartialAssets,
    progress: ProgressState,
    done: bool,
}

pub struct AssetLoader<'a> {
    fetch: &'a dyn Fetch,
    manifest: &'a AssetManifest,
}

impl<'a> AssetLoader<'a> {
    pub fn new(fetch: &'a dyn Fetch, manifest: &'a AssetManifest) -> Self {
        Self { fetch, manifest }
    }

    /// Every declared asset with its manifest path.
    pub fn declared(&self) -> Vec<(AssetId, &'a str)> {
        let manifest = self.manifest;
        let mut declared = vec![
            (AssetId::Model, manifest.model.as_str()),
            (AssetId::BakedTexture, manifest.baked_texture.as_str()),
            (AssetId::MatcapTexture, manifest.matcap_texture.as_str()),
        ];
        declared.extend(
            manifest
                .env_map
                .iter()
                .enumerate()
                .map(|(face, path)| (AssetId::EnvMapFace(face), path.as_str())),
        );
        declared.push((AssetId::HeaderText, manifest.header_text.as_str()));
        declared.push((AssetId::BannerText, manifest.banner_text.as_str()));
        declared
    }

    fn task(&self, id: AssetId, path: &'a str) -> AssetTask<'a> {
        let fetch = self.fetch;
        async move {
            let decoded = match id {
                AssetId::Model | AssetId::HeaderText | AssetId::BannerText => {
                    model::load_model_tree(fetch, path).await.map(Decoded::Model)
                }
                AssetId::BakedTexture | AssetId::MatcapTexture | AssetId::EnvMapFace(_) => {
                    match fetch.fetch(path).await {
                        Ok(bytes) => texture::decode_image(&bytes).map(Decoded::Image),
                        Err(e) => Err(e),
                    }
                }
            };
            decoded
                .map(|decoded| (id, decoded))
                .map_err(|cause| SceneError::AssetLoad { asset_id: id, cause })
        }
        .boxed_local()
    }

    /// Starts every asset task and streams their progress.
    ///
    /// Nothing is fetched until the stream is polled. The first failing
    /// asset ends the stream and drops the tasks still in flight.
    pub fn load_all(self) -> impl Stream<Item = Result<LoadEvent, SceneError>> + 'a {
        let declared = self.declared();
        let total = declared.len();
        let tasks: FuturesUnordered<AssetTask<'a>> =
            declared.into_iter().map(|(id, path)| self.task(id, path)).collect();
        log::info!("Loading {total} assets");

        let state = LoadState {
            tasks,
            partial: PartialAssets::default(),
            progress: ProgressState::new(0, total),
            done: false,
        };

        stream::unfold(state, |mut state| async move {
            if state.done {
                return None;
            }
            match state.tasks.next().await {
                Some(Ok((id, decoded))) => {
                    log::debug!("Loaded {id}");
                    state.partial.insert(id, decoded);
                    state.progress.loaded += 1;
                    let progress = state.progress;
                    Some((Ok(LoadEvent::Progress(progress)), state))
                }
                Some(Err(e)) => {
                    state.done = true;
                    state.tasks = FuturesUnordered::new();
                    Some((Err(e), state))
                }
                None => {
                    state.done = true;
                    let partial = std::mem::take(&mut state.partial);
                    let event = partial.finish().map(|assets| LoadEvent::Complete(Box::new(assets)));
                    Some((event, state))
                }
            }
        })
    }
}
