//! Scene kernel: couples the render scene to the physics world.
//!
//! A [`Session`] owns one [`SceneContext`] from mount to teardown. Clicks go
//! through [`Session::dispatch_click`], frames through [`Session::frame`].
//!
//! # Invariants
//! - Every registry entry names exactly one live mesh and one live body.
//! - The registry grows only through [`SceneContext::spawn_at`].
//! - Each frame steps physics once, before any pose is copied to a mesh.

mod config;
mod context;
mod host;
mod registry;
mod scheduler;
mod session;

pub use config::SceneConfig;
pub use context::{MissingHalf, SceneContext, SpawnedEntity, SyncError};
pub use host::{HeadlessHost, RenderHost};
pub use registry::{EntityIndex, EntityRegistry, PairedEntity};
pub use scheduler::FrameScheduler;
pub use session::{Session, SessionError, SessionSummary};
