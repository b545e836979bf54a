use std::{env, path::PathBuf};

use anyhow::Result;
use fs_extra::{copy_items, dir::CopyOptions};

// Native runs read `./assets`; keep a copy next to the build output so
// `cargo run` from the target directory finds the model and textures.
fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=assets");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let assets = manifest_dir.join("assets");
    if !assets.exists() {
        println!("cargo:warning=no assets/ directory, the experience will fail to load");
        return Ok(());
    }

    let out_dir = env::var("OUT_DIR")?;
    let options = CopyOptions {
        overwrite: true,
        ..CopyOptions::new()
    };
    copy_items(&[assets], out_dir, &options)?;
    Ok(())
}
