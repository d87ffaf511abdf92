// ── Scenes and quick actions ──

use serde::Serialize;

use super::ids::{QuickActionId, RoomId, SceneId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scene {
    pub id: SceneId,
    pub name: String,
    pub room_id: Option<RoomId>,
    pub kind: Option<String>,
    /// Reported by the processor while the scene's target state holds.
    pub active: bool,
    /// Local preference; survives refreshes, never sent to the processor.
    pub favorite: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuickAction {
    pub id: QuickActionId,
    pub name: String,
}
