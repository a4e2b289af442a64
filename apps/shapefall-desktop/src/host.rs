use shapefall_common::Viewport;
use shapefall_kernel::RenderHost;
use std::sync::Arc;
use winit::window::Window;

/// The application window as a session host.
pub struct WindowHost {
    window: Arc<Window>,
    attached: bool,
}

impl WindowHost {
    pub fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            attached: false,
        }
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }
}

impl RenderHost for WindowHost {
    fn viewport(&self) -> Viewport {
        let size = self.window.inner_size();
        Viewport::new(size.width as f32, size.height as f32)
    }

    fn attach(&mut self) {
        self.attached = true;
        self.window.request_redraw();
    }

    fn detach(&mut self) {
        if self.attached {
            self.attached = false;
            tracing::debug!("window host detached");
        }
    }
}
