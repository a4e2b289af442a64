use shapefall_common::Viewport;

/// Where a session draws and where its clicks come from.
pub trait RenderHost {
    /// Current client-area size in physical pixels.
    fn viewport(&self) -> Viewport;

    /// Called once when a session mounts on this host.
    fn attach(&mut self);

    /// Called once when the session tears down. The host releases its
    /// render surface here.
    fn detach(&mut self);
}

/// Host without a window, for the CLI and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessHost {
    viewport: Viewport,
    attached: bool,
}

impl HeadlessHost {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            attached: false,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }
}

impl RenderHost for HeadlessHost {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn attach(&mut self) {
        self.attached = true;
    }

    fn detach(&mut self) {
        self.attached = false;
    }
}
