//! Lumen demo - opens a window and clears it every frame
//!
//! The window and the Vulkan context are created before the event loop runs so
//! the window surface can borrow them for the whole run.

use glam::Vec4;
use lumen_engine::lumen::{Config, Engine};
use lumen_engine::lumen::render::Renderer;
use lumen_engine::lumen::surface::WindowSurface;
use lumen_engine::{engine_info, engine_warn, engine_error};
use lumen_engine_renderer_vulkan::{VulkanContext, get_validation_stats};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

const SOURCE: &str = "lumen::demo";

struct App<'a> {
    window: &'a Window,
    context: &'a VulkanContext,
    config: &'a Config,
    renderer: Option<Renderer<'a, VulkanContext>>,
}

impl<'a> App<'a> {
    fn create_renderer(&self) -> lumen_engine::lumen::Result<Renderer<'a, VulkanContext>> {
        let mut surface = WindowSurface::new(self.context, self.window);
        surface.set_clear_color(self.config.clear_color);
        surface.create_surface()?;
        surface.initialize()?;
        Ok(Renderer::new(surface))
    }
}

impl ApplicationHandler for App<'_> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }
        match self.create_renderer() {
            Ok(renderer) => {
                engine_info!(SOURCE, "Renderer ready");
                self.renderer = Some(renderer);
                self.window.request_redraw();
            }
            Err(e) => {
                engine_error!(SOURCE, "Failed to create renderer: {}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                // Surface resources go before the context they were created on
                self.renderer = None;
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(renderer) = self.renderer.as_mut() {
                    engine_info!(SOURCE, "Window resized to {}x{}", size.width, size.height);
                    renderer.surface_mut().notify_resized();
                }
                self.window.request_redraw();
            }
            WindowEvent::RedrawRequested => {
                let Some(renderer) = self.renderer.as_mut() else {
                    return;
                };
                match renderer.render_frame(std::iter::empty()) {
                    Ok(_) => self.window.request_redraw(),
                    Err(e) if e.is_fatal() => {
                        engine_error!(SOURCE, "Fatal rendering error: {}", e);
                        self.renderer = None;
                        event_loop.exit();
                    }
                    Err(e) => {
                        engine_warn!(SOURCE, "Frame {} failed: {}", renderer.frame_number(), e);
                        self.window.request_redraw();
                    }
                }
            }
            _ => {}
        }
    }
}

fn main() {
    let config = Config {
        app_name: "Lumen Demo".to_string(),
        clear_color: Vec4::new(0.05, 0.05, 0.12, 1.0),
        ..Config::default()
    };
    Engine::configure(&config);

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            engine_error!(SOURCE, "Failed to create event loop: {}", e);
            return;
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    #[allow(deprecated)]
    let window = match event_loop.create_window(
        Window::default_attributes()
            .with_title("Lumen Demo")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720)),
    ) {
        Ok(window) => window,
        Err(e) => {
            engine_error!(SOURCE, "Failed to create window: {}", e);
            return;
        }
    };

    let context = match VulkanContext::new(&window, &config) {
        Ok(context) => context,
        Err(e) => {
            engine_error!(SOURCE, "Failed to create Vulkan context: {}", e);
            return;
        }
    };

    let mut app = App {
        window: &window,
        context: &context,
        config: &config,
        renderer: None,
    };
    if let Err(e) = event_loop.run_app(&mut app) {
        engine_error!(SOURCE, "Event loop error: {}", e);
    }
    drop(app);

    let stats = get_validation_stats();
    if stats.total() > 0 {
        engine_warn!(
            SOURCE,
            "Validation: {} error(s), {} warning(s)",
            stats.errors,
            stats.warnings
        );
    }
    engine_info!(SOURCE, "Shutting down");
}
