//! Reactive data layer between `tutera-api` and UI consumers.
//!
//! This crate owns the session, the device model and the command pipeline
//! for one home-automation processor:
//!
//! - **[`Controller`]**: facade managing the connection lifecycle.
//!   [`connect_with()`](Controller::connect_with) logs in with a user token,
//!   [`auto_connect()`](Controller::auto_connect) with environment
//!   credentials; both load a snapshot and start polling.
//!   [`Controller::oneshot()`](Controller::oneshot) is the CLI path.
//!
//! - **[`SessionManager`]**: holds the active session key behind an
//!   `ArcSwapOption` and renews environment sessions on expiry.
//!
//! - **[`DataStore`]**: `DashMap` + `watch` collections of rooms, devices,
//!   scenes and quick actions, with revision-tagged optimistic updates and
//!   derived [`RoomSummary`] views.
//!
//! - **[`Dispatcher`]**: per-target single-slot mailboxes, debounce for
//!   sliders, and room fan-out. Every intent returns a [`CommandTicket`].
//!
//! - **[`BrightnessMemory`]**: last nonzero level per light, so lights come
//!   back where the user left them.

pub mod config;
pub mod controller;
pub mod convert;
pub mod dispatch;
pub mod error;
mod gateway;
pub mod memory;
pub mod model;
pub mod session;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{AutoConnect, ControllerConfig, TlsVerification};
pub use controller::{ConnectionState, Controller};
pub use dispatch::{
    CommandExecutor, CommandFailure, CommandOutcome, CommandTicket, DispatchSettings, Dispatcher,
    GroupReport, Intent,
};
pub use error::{CoreError, DeviceFailure};
pub use memory::{BrightnessMemory, DEFAULT_RESTORE, FileBrightnessMemory, InMemoryBrightness};
pub use session::{CredentialSource, SessionManager, SessionStatus};
pub use store::{DataStore, RefreshSnapshot};
pub use stream::EntityStream;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    ClimateMode, ClimateState, ClimateSummary, Device, DeviceId, DeviceKind, DevicePatch,
    DeviceState, MediaSource, MediaState, MediaSummary, Percent, QuickAction, QuickActionId, Room,
    RoomId, RoomSummary, Scene, SceneId, Target, Temperature,
};
