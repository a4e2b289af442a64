use crate::config::SceneConfig;
use crate::context::{SceneContext, SpawnedEntity, SyncError};
use crate::host::RenderHost;
use crate::scheduler::FrameScheduler;
use serde::Serialize;
use shapefall_input::PointerEvent;
use shapefall_render::{OrbitControls, Renderer};
use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no render host to mount the scene on")]
    MissingHost,
    #[error(transparent)]
    Sync(#[from] SyncError),
}

/// Point-in-time counters of a session.
///
/// `scene_meshes` and `physics_bodies` include the ground.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SessionSummary {
    pub tick: u64,
    pub sim_time: f64,
    pub entity_count: usize,
    pub scene_meshes: usize,
    pub physics_bodies: usize,
    pub torn_down: bool,
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tick {} ({:.2}s)  entities {}  meshes {}  bodies {}",
            self.tick, self.sim_time, self.entity_count, self.scene_meshes, self.physics_bodies
        )?;
        if self.torn_down {
            f.write_str("  [torn down]")?;
        }
        Ok(())
    }
}

/// A mounted scene: owns the host, the scene context, the click listener
/// and the frame schedule, from [`mount`](Self::mount) to
/// [`teardown`](Self::teardown).
pub struct Session<H: RenderHost> {
    host: Option<H>,
    context: Option<SceneContext>,
    scheduler: FrameScheduler,
    listening: bool,
    last_summary: SessionSummary,
}

impl<H: RenderHost> Session<H> {
    /// Bootstrap a scene on `host`. Fails before building anything when
    /// there is no host.
    pub fn mount(host: Option<H>, config: SceneConfig) -> Result<Self, SessionError> {
        let Some(mut host) = host else {
            tracing::error!("mount requested without a render host");
            return Err(SessionError::MissingHost);
        };

        let viewport = host.viewport();
        let context = SceneContext::bootstrap(config, viewport);
        host.attach();

        let mut scheduler = FrameScheduler::new();
        scheduler.request();

        tracing::info!(width = viewport.width, height = viewport.height, "session mounted");
        Ok(Self {
            host: Some(host),
            last_summary: context.summary(),
            context: Some(context),
            scheduler,
            listening: true,
        })
    }

    pub fn is_mounted(&self) -> bool {
        self.context.is_some()
    }

    pub fn host(&self) -> Option<&H> {
        self.host.as_ref()
    }

    pub fn host_mut(&mut self) -> Option<&mut H> {
        self.host.as_mut()
    }

    pub fn context(&self) -> Option<&SceneContext> {
        self.context.as_ref()
    }

    /// Camera controls, for forwarding drag and wheel input.
    pub fn controls_mut(&mut self) -> Option<&mut OrbitControls> {
        self.context.as_mut().map(SceneContext::controls_mut)
    }

    /// Whether a frame has been requested and not yet run.
    pub fn has_pending_frame(&self) -> bool {
        self.scheduler.is_pending()
    }

    /// Handle a click: map it onto the ground using the host's current
    /// viewport and spawn there on a hit. Misses, an empty viewport, and
    /// clicks after teardown all yield `None`.
    pub fn dispatch_click(&mut self, event: PointerEvent) -> Option<SpawnedEntity> {
        if !self.listening {
            tracing::trace!("click after teardown ignored");
            return None;
        }
        let (Some(host), Some(context)) = (self.host.as_ref(), self.context.as_mut()) else {
            return None;
        };
        match context.map_click(&event, host.viewport()) {
            Ok(Some(point)) => Some(context.spawn_at(point)),
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(%err, "click ignored");
                None
            }
        }
    }

    /// Run one sync-loop iteration and schedule the next.
    ///
    /// Returns `Ok(None)` once torn down. An error is fatal: the scene is
    /// dropped, clicks are ignored and no frame is scheduled again, so later
    /// calls return `Ok(None)`. The host stays until [`teardown`](Self::teardown).
    pub fn frame<R: Renderer>(&mut self, renderer: &mut R) -> Result<Option<R::Output>, SessionError> {
        let Some(context) = self.context.as_mut() else {
            return Ok(None);
        };
        self.scheduler.take();
        match context.sync_frame(renderer) {
            Ok(output) => {
                self.scheduler.request();
                Ok(Some(output))
            }
            Err(err) => {
                self.stop();
                Err(err.into())
            }
        }
    }

    pub fn summary(&self) -> SessionSummary {
        match &self.context {
            Some(context) => context.summary(),
            None => self.last_summary,
        }
    }

    /// Stop listening, cancel scheduled frames and drop the scene, keeping
    /// its final counters.
    fn stop(&mut self) {
        self.listening = false;
        self.scheduler.cancel();
        if let Some(context) = self.context.take() {
            self.last_summary = context.summary();
        }
    }

    /// Stop the session and detach from the host. Returns the host the first
    /// time; later calls do nothing.
    pub fn teardown(&mut self) -> Option<H> {
        self.stop();
        let mut host = self.host.take()?;
        host.detach();
        self.last_summary.torn_down = true;
        tracing::info!(summary = %self.last_summary, "session torn down");
        Some(host)
    }
}

impl<H: RenderHost> Drop for Session<H> {
    fn drop(&mut self) {
        self.teardown();
    }
}
