// ── Command executor seam ──
//
// The dispatcher decides *when* a command goes out; an executor decides
// *how*. Production wires in the controller's gateway, tests a fake.

use crate::error::CoreError;
use crate::model::{DevicePatch, DeviceId, DeviceState, QuickActionId, SceneId, Target};

/// One command as it leaves the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Device { id: DeviceId, patch: DevicePatch },
    RecallScene(SceneId),
    RunQuickAction(QuickActionId),
}

impl Intent {
    pub fn target(&self) -> Target {
        match self {
            Self::Device { id, .. } => Target::Device(*id),
            Self::RecallScene(id) => Target::Scene(*id),
            Self::RunQuickAction(id) => Target::QuickAction(*id),
        }
    }
}

/// Performs intents against the processor.
pub trait CommandExecutor: Send + Sync + 'static {
    /// Send one intent. A returned state is the processor's answer for
    /// the device; `None` means "accepted, no state reported".
    fn execute(
        &self,
        intent: &Intent,
    ) -> impl Future<Output = Result<Option<DeviceState>, CoreError>> + Send;

    /// Re-read everything, used after commands with side effects the
    /// client cannot predict (scenes, quick actions).
    fn refresh(&self) -> impl Future<Output = Result<(), CoreError>> + Send;
}
