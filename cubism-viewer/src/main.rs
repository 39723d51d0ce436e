//! Desktop host for `cubism-glow`: owns the window and GL context, and drives
//! a small masked scene through the renderer every frame.

mod cli;
mod logging;
mod scene;
mod window;

use std::{fs, rc::Rc};

use clap::Parser;
use color_eyre::{Report, Result, eyre::WrapErr};
use cubism_glow::GlRenderer;
use glow::HasContext;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::WindowId,
};

use crate::{
    cli::Cli,
    logging::{LoggingConfig, init_logging},
    scene::Scene,
    window::GlWindow,
};

const CLEAR_COLOR: [f32; 4] = [0.12, 0.12, 0.14, 1.0];

fn main() -> Result<()> {
    color_eyre::install()?;
    init_logging(&LoggingConfig::from_env())?;

    let cli = Cli::parse();
    let texture_bytes = fs::read(&cli.texture)
        .wrap_err_with(|| format!("failed to read {}", cli.texture.display()))?;

    let event_loop = EventLoop::new()?;
    let mut app = App { cli, texture_bytes, state: None, error: None };
    event_loop.run_app(&mut app)?;

    match app.error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct App {
    cli: Cli,
    texture_bytes: Vec<u8>,
    state: Option<AppState>,
    error: Option<Report>,
}

/// Field order matters: the renderer releases its GL objects on drop, so it
/// must go before the window takes the context down.
struct AppState {
    renderer: GlRenderer,
    scene: Option<Scene>,
    win: GlWindow,
}

impl AppState {
    fn new(event_loop: &ActiveEventLoop, cli: &Cli, texture_bytes: &[u8]) -> Result<Self> {
        let win = GlWindow::new(event_loop, "cubism-viewer", cli.size)?;

        let mut renderer = GlRenderer::new(Rc::clone(&win.gl), cli.renderer_config())
            .wrap_err("failed to create renderer")?;
        tracing::info!(capabilities = ?renderer.capabilities(), "renderer ready");

        let scene = Scene::new(&mut renderer, texture_bytes, cli.invert_mask)
            .wrap_err("failed to load scene")?;

        Ok(Self { renderer, scene: Some(scene), win })
    }

    fn redraw(&mut self) -> Result<()> {
        let (width, height) = self.win.physical_size();
        if width == 0 || height == 0 {
            return Ok(());
        }

        let gl = &self.win.gl;
        unsafe {
            gl.viewport(0, 0, width as i32, height as i32);
            let [r, g, b, a] = CLEAR_COLOR;
            gl.clear_color(r, g, b, a);
            gl.clear(glow::COLOR_BUFFER_BIT);
        }

        if let Some(scene) = &self.scene
            && let Err(err) = scene.draw(&mut self.renderer, (width, height))
        {
            tracing::error!(%err, "frame failed");
        }

        self.win.swap_buffers()
    }

    fn shutdown(mut self) {
        if let Some(scene) = self.scene.take()
            && let Err(err) = scene.dispose(&mut self.renderer)
        {
            tracing::warn!(%err, "failed to dispose scene resources");
        }
    }
}

impl App {
    fn fail(&mut self, event_loop: &ActiveEventLoop, err: Report) {
        self.error = Some(err);
        if let Some(state) = self.state.take() {
            state.shutdown();
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        match AppState::new(event_loop, &self.cli, &self.texture_bytes) {
            Ok(state) => self.state = Some(state),
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(state) = self.state.as_mut() else { return };

        match event {
            WindowEvent::CloseRequested => {
                if let Some(state) = self.state.take() {
                    state.shutdown();
                }
                event_loop.exit();
            },
            WindowEvent::Resized(new_size) => {
                state.win.resize_surface(new_size);
                state.win.window.request_redraw();
            },
            WindowEvent::RedrawRequested => {
                if let Err(err) = state.redraw() {
                    self.fail(event_loop, err);
                }
            },
            _ => {},
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.win.window.request_redraw();
        }
    }
}
