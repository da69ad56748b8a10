//! The viewer widget: mount into a host, load the sword, animate, tear down.

use anyhow::Result;
use std::time::Instant;

use crate::camera::PerspectiveCamera;
use crate::config::ViewerConfig;
use crate::frame::{FrameInfo, FrameLoop, LoopHandle};
use crate::loaders::{AssetLoader, LoadPoll, PendingAsset};
use crate::scene::{AttachOutcome, SceneState};
use crate::traits::{FrameRenderer, RenderHost, Viewport};

/// Everything that exists only between mount and unmount
struct Mounted<R> {
    generation: u64,
    viewport: Viewport,
    renderer: R,
    scene: SceneState,
    camera: PerspectiveCamera,
    frame_loop: FrameLoop,
    pending: Option<PendingAsset>,
}

pub struct ViewerWidget<H: RenderHost> {
    config: ViewerConfig,
    loader: AssetLoader,
    generation: u64,
    mounted: Option<Mounted<H::Renderer>>,
}

impl<H: RenderHost> ViewerWidget<H> {
    pub fn new(config: ViewerConfig) -> Self {
        Self::with_loader(config, AssetLoader::gltf())
    }

    pub fn with_loader(config: ViewerConfig, loader: AssetLoader) -> Self {
        Self {
            config,
            loader,
            generation: 0,
            mounted: None,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Attach to `host` and start loading and animating
    ///
    /// The container is measured once here; later container resizes are not
    /// tracked. Mounting twice without an unmount is a no-op.
    pub fn mount(&mut self, host: &mut H) -> Result<()> {
        if self.mounted.is_some() {
            log::warn!("Viewer is already mounted");
            return Ok(());
        }

        let viewport = host.container_size();
        let renderer = host.attach_surface(viewport, &self.config)?;
        let camera = PerspectiveCamera::new(&self.config.camera, viewport);
        let scene = SceneState::new(&self.config.lights);

        self.generation += 1;
        let pending = self
            .loader
            .spawn(self.config.asset_path.clone(), self.generation, host.asset_waker());

        log::info!(
            "Mounted viewer {}x{} (generation {}), loading {:?}",
            viewport.width,
            viewport.height,
            self.generation,
            self.config.asset_path
        );

        self.mounted = Some(Mounted {
            generation: self.generation,
            viewport,
            renderer,
            scene,
            camera,
            frame_loop: FrameLoop::start(),
            pending: Some(pending),
        });
        host.request_frame();

        Ok(())
    }

    /// Detach the surface, stop the frame loop and forget any in-flight load
    pub fn unmount(&mut self, host: &mut H) {
        let Some(mounted) = self.mounted.take() else {
            return;
        };

        mounted.frame_loop.handle().cancel();
        if let Some(pending) = &mounted.pending {
            log::debug!("Abandoning in-flight load of {:?}", pending.path());
        }
        host.detach_surface(mounted.renderer);

        log::info!("Unmounted viewer (generation {})", mounted.generation);
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    /// Pointer position in container pixels; ignored while unmounted
    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        if let Some(m) = self.mounted.as_mut() {
            m.camera
                .follow_pointer(x, y, m.viewport, self.config.camera.pointer_scale);
        }
    }

    /// Pick up a finished load, if any
    ///
    /// Returns true when a model was added to the scene. Failed loads are
    /// logged and leave the scene without a model.
    pub fn poll_asset(&mut self) -> bool {
        let Some(m) = self.mounted.as_mut() else {
            return false;
        };
        let Some(mut pending) = m.pending.take() else {
            return false;
        };

        let result = match pending.poll() {
            LoadPoll::Pending => {
                m.pending = Some(pending);
                return false;
            }
            LoadPoll::Abandoned => {
                log::error!("Loader for {:?} exited without a result", pending.path());
                return false;
            }
            LoadPoll::Ready(result) => result,
        };

        if pending.generation() != m.generation {
            log::debug!(
                "Discarding load from generation {} (current {})",
                pending.generation(),
                m.generation
            );
            return false;
        }

        match result {
            Ok(asset) => matches!(
                m.scene.attach_asset(asset, &self.config),
                AttachOutcome::Attached { .. }
            ),
            Err(e) => {
                log::error!("Failed to load {:?}: {:#}", pending.path(), e);
                false
            }
        }
    }

    /// One display-refresh callback
    pub fn frame(&mut self, host: &H) -> Option<FrameInfo> {
        self.frame_at(host, Instant::now())
    }

    /// Frame callback observed at `now`
    ///
    /// Returns `None` once the loop has been cancelled or the widget is not
    /// mounted; no further frame is requested in that case.
    pub fn frame_at(&mut self, host: &H, now: Instant) -> Option<FrameInfo> {
        let info = self.mounted.as_mut()?.frame_loop.next_frame_at(now)?;
        host.request_frame();

        self.poll_asset();

        let m = self.mounted.as_mut()?;
        m.scene.advance(info.delta, self.config.rotation_speed);
        if let Err(e) = m.renderer.render(&m.scene, &m.camera) {
            log::error!("Frame {} failed to render: {:#}", info.number, e);
        }

        Some(info)
    }

    pub fn scene(&self) -> Option<&SceneState> {
        self.mounted.as_ref().map(|m| &m.scene)
    }

    pub fn camera(&self) -> Option<&PerspectiveCamera> {
        self.mounted.as_ref().map(|m| &m.camera)
    }

    pub fn renderer(&self) -> Option<&H::Renderer> {
        self.mounted.as_ref().map(|m| &m.renderer)
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.mounted.as_ref().map(|m| m.viewport)
    }

    /// Generation of the current (or most recent) mount
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn loop_handle(&self) -> Option<LoopHandle> {
        self.mounted.as_ref().map(|m| m.frame_loop.handle())
    }

    pub fn is_loading(&self) -> bool {
        self.mounted.as_ref().is_some_and(|m| m.pending.is_some())
    }
}
