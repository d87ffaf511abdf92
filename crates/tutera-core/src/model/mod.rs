// ── Domain model ──
//
// Canonical types the store holds and consumers render. Wire payloads
// from `tutera-api` are converted into these in `crate::convert`.

pub mod device;
pub mod ids;
pub mod level;
pub mod room;
pub mod scene;

pub use device::{ClimateMode, ClimateState, Device, DevicePatch, DeviceState, MediaSource, MediaState};
pub use ids::{DeviceId, DeviceKind, QuickActionId, RoomId, SceneId, Target};
pub use level::{Percent, Temperature};
pub use room::{ClimateSummary, MediaSummary, Room, RoomSummary};
pub use scene::{QuickAction, Scene};
