use std::sync::Arc;

use cellsim::{DriverState, FrameDriver, FrameSink, GridBackend, SimConfig, SimError, SimResult};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

use super::blit::Display;
use super::context::SurfaceContext;
use super::input::InputState;
use crate::gpu::GpuBackend;

/// Open the window and run frames until it is closed or a frame fails.
pub fn run(config: SimConfig) -> SimResult<()> {
    let dims = config.dims()?;
    log::info!(
        "Starting {}x{} grid, {} steps per frame",
        dims.width(),
        dims.height(),
        config.steps_per_frame
    );

    let event_loop = EventLoop::new().map_err(|e| SimError::Device(e.to_string()))?;
    let mut runner = AppRunner::new(config);
    event_loop
        .run_app(&mut runner)
        .map_err(|e| SimError::Device(e.to_string()))?;
    match runner.failure.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

struct AppRunner {
    config: SimConfig,
    display: Option<Display>,
    driver: Option<FrameDriver<GpuBackend>>,
    input: InputState,
    failure: Option<SimError>,
}

impl AppRunner {
    fn new(config: SimConfig) -> Self {
        Self {
            config,
            display: None,
            driver: None,
            input: InputState::default(),
            failure: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> SimResult<()> {
        let dims = self.config.dims()?;
        let (width, height) = self.config.window_size()?;
        let window = event_loop
            .create_window(
                Window::default_attributes()
                    .with_title("cellsim")
                    .with_inner_size(PhysicalSize::new(width, height)),
            )
            .map_err(|e| SimError::Device(e.to_string()))?;

        let surface = pollster::block_on(SurfaceContext::new(Arc::new(window)))?;
        let backend = GpuBackend::new(surface.gpu.clone(), dims, self.config.pixel_format)?;
        let display = Display::new(surface, backend.pixel_layout());
        self.driver = Some(FrameDriver::from_config(backend, &self.config)?);
        self.display = Some(display);
        Ok(())
    }

    fn redraw(&mut self) -> SimResult<()> {
        let (Some(display), Some(driver)) = (&mut self.display, &mut self.driver) else {
            return Ok(());
        };
        let pointer = self
            .input
            .pointer(display.surface.window_size(), driver.backend().dims());
        driver.frame(&pointer)?;
        display.present(driver.backend())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: SimError) {
        log::error!("Stopping: {}", error);
        if let Some(driver) = &mut self.driver {
            driver.stop();
        }
        self.failure = Some(error);
        event_loop.exit();
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(driver) = &mut self.driver {
            driver.stop();
            if let Err(e) = driver.backend_mut().finish() {
                log::error!("Device error during shutdown: {}", e);
            }
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for AppRunner {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.display.is_none() {
            if let Err(e) = self.start(event_loop) {
                self.fail(event_loop, e);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::Resized(size) => {
                if let Some(display) = &mut self.display {
                    display.surface.resize(size.width, size.height);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.input.on_cursor_moved(position.x, position.y);
            }
            WindowEvent::CursorLeft { .. } => self.input.release_all(),
            WindowEvent::MouseInput { state, button, .. } => {
                self.input.on_mouse_input(button, state);
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw() {
                    self.fail(event_loop, e);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        let running = self
            .driver
            .as_ref()
            .is_some_and(|d| d.state() == DriverState::Running);
        if let (true, Some(display)) = (running, &self.display) {
            display.surface.window.request_redraw();
        }
    }
}
