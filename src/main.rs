use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use glow_viewer::cli::Cli;
use glow_viewer::config::ViewerConfig;
use glow_viewer::render::SurfaceRenderer;
use glow_viewer::traits::{AssetWaker, RenderHost, Viewport};
use glow_viewer::widget::ViewerWidget;

#[derive(Debug, Clone, Copy)]
enum UserEvent {
    /// A background load settled
    AssetReady,
}

/// A transparent window acting as the widget's container
struct WindowHost {
    window: Arc<Window>,
    proxy: EventLoopProxy<UserEvent>,
}

impl RenderHost for WindowHost {
    type Renderer = SurfaceRenderer;

    fn container_size(&self) -> Viewport {
        let size = self.window.inner_size();
        Viewport::new(size.width, size.height)
    }

    fn attach_surface(&mut self, viewport: Viewport, config: &ViewerConfig) -> Result<SurfaceRenderer> {
        pollster::block_on(SurfaceRenderer::new(self.window.clone(), viewport, config))
    }

    fn detach_surface(&mut self, renderer: SurfaceRenderer) {
        drop(renderer);
        log::debug!("Surface released");
    }

    fn request_frame(&self) {
        self.window.request_redraw();
    }

    fn asset_waker(&self) -> AssetWaker {
        let proxy = self.proxy.clone();
        Box::new(move || {
            if proxy.send_event(UserEvent::AssetReady).is_err() {
                log::debug!("Event loop closed before the asset arrived");
            }
        })
    }
}

struct App {
    cli: Cli,
    proxy: EventLoopProxy<UserEvent>,
    widget: ViewerWidget<WindowHost>,
    host: Option<WindowHost>,
}

impl App {
    fn new(cli: Cli, config: ViewerConfig, proxy: EventLoopProxy<UserEvent>) -> Self {
        Self {
            cli,
            proxy,
            widget: ViewerWidget::new(config),
            host: None,
        }
    }

    fn teardown(&mut self) {
        if let Some(host) = self.host.as_mut() {
            self.widget.unmount(host);
        }
    }
}

impl ApplicationHandler<UserEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.host.is_none() {
            let window = match event_loop.create_window(
                Window::default_attributes()
                    .with_title("Glow Viewer")
                    .with_transparent(true)
                    .with_inner_size(winit::dpi::PhysicalSize::new(self.cli.width, self.cli.height)),
            ) {
                Ok(w) => Arc::new(w),
                Err(e) => {
                    log::error!("Failed to create window: {}", e);
                    event_loop.exit();
                    return;
                }
            };
            self.host = Some(WindowHost {
                window,
                proxy: self.proxy.clone(),
            });
        }

        if let Some(host) = self.host.as_mut() {
            if let Err(e) = self.widget.mount(host) {
                log::error!("Failed to mount viewer: {:#}", e);
                event_loop.exit();
            }
        }
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        self.teardown();
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: UserEvent) {
        match event {
            UserEvent::AssetReady => {
                self.widget.poll_asset();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => {
                self.teardown();
                event_loop.exit();
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.widget.pointer_moved(position.x as f32, position.y as f32);
            }
            WindowEvent::Resized(size) => {
                // The surface keeps its mount-time size
                log::debug!("Container resized to {}x{}; ignored", size.width, size.height);
            }
            WindowEvent::RedrawRequested => {
                if let Some(host) = &self.host {
                    self.widget.frame(host);
                }
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.teardown();
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = cli.viewer_config()?;

    let event_loop = EventLoop::<UserEvent>::with_user_event().build()?;
    let mut app = App::new(cli, config, event_loop.create_proxy());

    log::info!("Glow Viewer - move the pointer to orbit, Escape to quit");
    event_loop.run_app(&mut app)?;

    Ok(())
}
