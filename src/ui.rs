//! Loading screen and end-trip affordance.
//!
//! The experience only talks to an [`Overlay`]. On the web it is backed by
//! the page's DOM; natively progress is logged.

use crate::resources::ProgressState;

pub trait Overlay {
    /// `percent` is the rounded figure, `ratio` the raw `loaded / total`.
    fn progress(&mut self, percent: u8, ratio: f32);

    /// Fades out the loading screen. Called once, after the scene is assembled
    /// and the renderer is up.
    fn reveal(&mut self);

    fn set_end_trip_visible(&mut self, visible: bool);
}

/// Feeds progress into an [`Overlay`], deduplicated, and reveals the scene once.
#[derive(Debug, Default)]
pub struct LoadingScreen {
    last_percent: Option<u8>,
    revealed: bool,
}

impl LoadingScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, progress: &ProgressState, overlay: &mut dyn Overlay) {
        let percent = progress.percent();
        if self.last_percent.is_none_or(|last| percent > last) {
            self.last_percent = Some(percent);
            overlay.progress(percent, progress.ratio());
        }
    }

    /// Hides the loading screen. Only the first call reaches the overlay.
    pub fn reveal(&mut self, overlay: &mut dyn Overlay) {
        if !self.revealed {
            self.revealed = true;
            overlay.reveal();
        }
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }
}

#[derive(Debug, Default)]
pub struct LogOverlay;

impl Overlay for LogOverlay {
    fn progress(&mut self, percent: u8, _ratio: f32) {
        log::info!("Loading assets: {percent}%");
    }

    fn reveal(&mut self) {
        log::info!("All assets loaded");
    }

    fn set_end_trip_visible(&mut self, visible: bool) {
        if visible {
            log::info!("Trip complete, press Escape or Space to land");
        }
    }
}

/// Styles that fade the loading screen out. It stays in the layout but stops
/// catching pointer input, so the canvas underneath can be orbited.
pub const FADE_OUT: &[(&str, &str)] = &[
    ("transition", "opacity 0.5s ease"),
    ("opacity", "0"),
    ("pointer-events", "none"),
];

#[cfg(target_arch = "wasm32")]
pub use dom::DomOverlay;

#[cfg(target_arch = "wasm32")]
mod dom {
    use wasm_bindgen::JsCast;
    use web_sys::HtmlElement;

    use super::Overlay;

    const LOADING_FIGURE: &str = "[data-name='loadingFigure']";
    const LOADING_BAR: &str = "[data-name='loadingBar']";
    const OVERLAY: &str = "[data-name='overlay']";
    const END_TRIP: &str = ".EndTrip";

    /// Writes into the host page's loading overlay. Missing elements are skipped.
    #[derive(Debug, Default)]
    pub struct DomOverlay;

    fn element(selector: &str) -> Option<HtmlElement> {
        let document = web_sys::window()?.document()?;
        let element = document.query_selector(selector).ok().flatten();
        if element.is_none() {
            log::warn!("No element matches {selector}");
        }
        element?.dyn_into::<HtmlElement>().ok()
    }

    fn style(element: &HtmlElement, properties: &[(&str, &str)]) {
        let style = element.style();
        for (property, value) in properties {
            if let Err(e) = style.set_property(property, value) {
                log::warn!("Could not set {property}: {e:?}");
            }
        }
    }

    impl Overlay for DomOverlay {
        fn progress(&mut self, percent: u8, ratio: f32) {
            if let Some(figure) = element(LOADING_FIGURE) {
                figure.set_inner_html(&format!("{percent}%"));
            }
            if let Some(bar) = element(LOADING_BAR) {
                let transform = format!("scaleX({ratio})");
                style(&bar, &[("transform", transform.as_str())]);
            }
        }

        fn reveal(&mut self) {
            for selector in [LOADING_BAR, OVERLAY] {
                if let Some(el) = element(selector) {
                    style(&el, super::FADE_OUT);
                }
            }
        }

        fn set_end_trip_visible(&mut self, visible: bool) {
            if let Some(end_trip) = element(END_TRIP) {
                if visible {
                    style(&end_trip, &[("display", "inline-block"), ("opacity", "1")]);
                } else {
                    style(&end_trip, &[("opacity", "0"), ("display", "none")]);
                }
            }
        }
    }
}
