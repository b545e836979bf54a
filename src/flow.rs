//! Application event loop.
//!
//! [`App`] owns the [`Experience`] and translates winit events into it:
//! window creation on `resumed`, input to the orbit controls and trip
//! commands, resizes, and one [`Experience::tick`] per redraw. A redraw is
//! requested again every frame, so the loop runs at display refresh rate.
//!
//! # Lifecycle
//!
//! 1. `resumed` creates the window (the `canvas.webgl` element on the web)
//! 2. The experience initializes asynchronously: natively on a tokio runtime,
//!    on the web via `spawn_local` and a [`FlowEvent::Initialized`] user event
//! 3. Each `RedrawRequested` ticks the experience and requests the next frame
//!
//! Natively `E` starts the engine, `F` flies and `Escape` or `Space` ends the
//! trip. On the web [`start`] returns an [`ExperienceHandle`] with the same
//! commands.

use std::{fmt::Debug, sync::Arc};

use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use crate::{
    config::Config,
    error::SceneError,
    experience::{Command, Experience},
    resources::AssetDir,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub(crate) enum FlowEvent {
    #[allow(dead_code)]
    Initialized(Box<Experience>),
    #[allow(dead_code)]
    Command(Command),
    #[allow(dead_code)]
    Exit,
}

impl Debug for FlowEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized(_) => f.write_str("Initialized(Experience)"),
            Self::Command(command) => f.debug_tuple("Command").field(command).finish(),
            Self::Exit => f.write_str("Exit"),
        }
    }
}

/// Maps a key press to a trip command.
pub fn command_for_key(event: &KeyEvent) -> Option<Command> {
    if event.state != ElementState::Pressed || event.repeat {
        return None;
    }
    match event.physical_key {
        PhysicalKey::Code(KeyCode::KeyE) => Some(Command::StartEngine),
        PhysicalKey::Code(KeyCode::KeyF) => Some(Command::Fly),
        PhysicalKey::Code(KeyCode::Escape | KeyCode::Space) => Some(Command::EndTrip),
        _ => None,
    }
}

pub(crate) struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[allow(dead_code)]
    proxy: EventLoopProxy<FlowEvent>,
    // Held until `resumed` hands it to the initialization future
    pending: Option<Box<Experience>>,
    experience: Option<Box<Experience>>,
}

impl App {
    fn new(event_loop: &EventLoop<FlowEvent>, experience: Experience) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            pending: Some(Box::new(experience)),
            experience: None,
        })
    }

    fn ready(&mut self, experience: Box<Experience>) {
        let mut experience = experience;
        if let Some(window) = experience.window().cloned() {
            let size = window.inner_size();
            experience.resize(size.width, size.height, window.scale_factor());
            window.request_redraw();
        }
        self.experience = Some(experience);
    }

    fn window_attributes() -> Result<winit::window::WindowAttributes, SceneError> {
        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("Sky King");

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_SELECTOR: &str = "canvas.webgl";

            let canvas = web_sys::window()
                .and_then(|window| window.document())
                .and_then(|document| document.query_selector(CANVAS_SELECTOR).ok().flatten())
                .ok_or(SceneError::MissingSurface)?;
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        Ok(window_attributes)
    }
}

impl ApplicationHandler<FlowEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(mut experience) = self.pending.take() else {
            return;
        };

        let window = match Self::window_attributes()
            .map_err(|e| anyhow::anyhow!(e))
            .and_then(|attributes| Ok(event_loop.create_window(attributes)?))
        {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Cannot create the window: {e}");
                event_loop.exit();
                return;
            }
        };

        let init_future = async move {
            experience.initialize(Some(window)).await.map(|_| experience)
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(init_future) {
                Ok(experience) => self.ready(experience),
                Err(e) => {
                    log::error!("Experience initialization failed: {e}");
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match init_future.await {
                    Ok(experience) => {
                        if proxy.send_event(FlowEvent::Initialized(experience)).is_err() {
                            log::error!("Event loop closed before the experience was ready");
                        }
                    }
                    Err(e) => log::error!("Experience initialization failed: {e}"),
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: FlowEvent) {
        match event {
            // This is the message from our wasm `spawn_local`
            FlowEvent::Initialized(experience) => self.ready(experience),
            FlowEvent::Command(command) => match &mut self.experience {
                Some(experience) => {
                    experience.command(command);
                }
                None => log::debug!("Ignoring {command:?} before the experience is ready"),
            },
            FlowEvent::Exit => event_loop.exit(),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        if let WindowEvent::CloseRequested = event {
            event_loop.exit();
            return;
        }
        let Some(experience) = &mut self.experience else {
            return;
        };

        experience.handle_window_event(&event);

        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let Some(command) = command_for_key(&event) {
                    experience.command(command);
                }
            }
            WindowEvent::Resized(size) => {
                let scale_factor = experience.window().map_or(1.0, |window| window.scale_factor());
                experience.resize(size.width, size.height, scale_factor);
            }
            WindowEvent::RedrawRequested => {
                // invoke main render loop
                if let Some(window) = experience.window() {
                    window.request_redraw();
                }
                if let Err(e) = experience.tick() {
                    log::error!("Unable to render {e}");
                }
            }
            _ => {}
        }
    }
}

fn mk_event_loop() -> anyhow::Result<EventLoop<FlowEvent>> {
    Ok(EventLoop::with_user_event().build()?)
}

/// Opens a window and runs the experience until it is closed.
#[cfg(not(target_arch = "wasm32"))]
pub fn run(config: Config) -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    };

    let experience = Experience::new(
        config,
        Box::new(AssetDir::default()),
        Box::new(crate::ui::LogOverlay),
    );
    let event_loop = mk_event_loop()?;
    let mut app = App::new(&event_loop, experience)?;
    event_loop.run_app(&mut app)?;

    Ok(())
}

/// Trip commands for the host page.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub struct ExperienceHandle {
    proxy: EventLoopProxy<FlowEvent>,
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
impl ExperienceHandle {
    fn send(&self, command: Command) {
        if self.proxy.send_event(FlowEvent::Command(command)).is_err() {
            log::warn!("Event loop is gone, dropping {command:?}");
        }
    }

    pub fn start_engine(&self) {
        self.send(Command::StartEngine);
    }

    pub fn fly_aircraft(&self) {
        self.send(Command::Fly);
    }

    pub fn end_flight_trip(&self) {
        self.send(Command::EndTrip);
    }

    pub fn stop(&self) {
        if self.proxy.send_event(FlowEvent::Exit).is_err() {
            log::warn!("Event loop already stopped");
        }
    }
}

/// Starts the experience in the page's `canvas.webgl`.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn start() -> Result<ExperienceHandle, JsValue> {
    use winit::platform::web::EventLoopExtWebSys;

    console_log::init_with_level(log::Level::Info).map_err(|e| JsValue::from_str(&e.to_string()))?;

    let (event_loop, app, handle) =
        run_web(Config::default()).map_err(|e| JsValue::from_str(&e.to_string()))?;
    event_loop.spawn_app(app);
    Ok(handle)
}

#[cfg(target_arch = "wasm32")]
fn run_web(config: Config) -> anyhow::Result<(EventLoop<FlowEvent>, App, ExperienceHandle)> {
    let experience = Experience::new(
        config,
        Box::new(AssetDir::default()),
        Box::new(crate::ui::DomOverlay),
    );
    let event_loop = mk_event_loop()?;
    let app = App::new(&event_loop, experience)?;
    let handle = ExperienceHandle {
        proxy: event_loop.create_proxy(),
    };
    Ok((event_loop, app, handle))
}
