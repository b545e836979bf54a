#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    sky_king::flow::run(sky_king::Config::default())
}

// The web build starts through `flow::start` from JavaScript.
#[cfg(target_arch = "wasm32")]
fn main() {}
