// ── Command dispatcher ──
//
// Turns UI intents into processor calls. Device intents update the store
// optimistically first; discrete ones then go straight to their target's
// mailbox, continuous ones (brightness, volume) wait out a debounce window.
// When the answer lands the store is reconciled or rolled back by revision.

mod debounce;
mod executor;
mod group;
mod mailbox;

#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, oneshot};
use tracing::{debug, warn};

pub use executor::{CommandExecutor, Intent};
pub use group::GroupReport;

use debounce::Debouncer;
use mailbox::{Mailboxes, Pending};

use crate::error::CoreError;
use crate::memory::{BrightnessMemory, DEFAULT_RESTORE};
use crate::model::{
    ClimateMode, Device, DeviceId, DevicePatch, DeviceState, Percent, QuickActionId, SceneId,
    Target, Temperature,
};
use crate::store::{DataStore, Reconciled, Revision};

const FAILURE_CHANNEL_SIZE: usize = 64;

// ── Outcomes ─────────────────────────────────────────────────────────

/// How a dispatched intent ended, when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Accepted by the processor; the store shows its result.
    Confirmed,
    /// Accepted by the processor, but a newer local intent is shown.
    Overtaken,
    /// Replaced by a newer intent before it was ever sent.
    Superseded,
}

/// Broadcast for every failed command, whether or not its ticket is
/// still being awaited.
#[derive(Debug, Clone)]
pub struct CommandFailure {
    pub target: Target,
    pub error: CoreError,
}

/// Handle to one submitted intent.
#[must_use = "tickets resolve when the processor answers; await `outcome()` to observe it"]
#[derive(Debug)]
pub struct CommandTicket {
    target: Target,
    rx: oneshot::Receiver<Result<CommandOutcome, CoreError>>,
}

impl CommandTicket {
    pub fn target(&self) -> Target {
        self.target
    }

    pub async fn outcome(self) -> Result<CommandOutcome, CoreError> {
        // The sender only disappears when the intent was dropped unsent.
        self.rx.await.unwrap_or(Ok(CommandOutcome::Superseded))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DispatchSettings {
    pub debounce: Duration,
    pub default_restore: Percent,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(250),
            default_restore: DEFAULT_RESTORE,
        }
    }
}

// ── Dispatcher ───────────────────────────────────────────────────────

/// Intent entry point. Cheap to clone; all clones share mailboxes.
pub struct Dispatcher<E: CommandExecutor> {
    shared: Arc<Shared<E>>,
}

impl<E: CommandExecutor> Clone for Dispatcher<E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

struct Shared<E: CommandExecutor> {
    executor: E,
    store: Arc<DataStore>,
    memory: Arc<dyn BrightnessMemory>,
    settings: DispatchSettings,
    mailboxes: Mailboxes,
    debouncer: Debouncer,
    failures: broadcast::Sender<CommandFailure>,
}

impl<E: CommandExecutor> Dispatcher<E> {
    pub fn new(
        executor: E,
        store: Arc<DataStore>,
        memory: Arc<dyn BrightnessMemory>,
        settings: DispatchSettings,
    ) -> Self {
        let (failures, _) = broadcast::channel(FAILURE_CHANNEL_SIZE);
        Self {
            shared: Arc::new(Shared {
                executor,
                store,
                memory,
                settings,
                mailboxes: Mailboxes::default(),
                debouncer: Debouncer::default(),
                failures,
            }),
        }
    }

    pub fn executor(&self) -> &E {
        &self.shared.executor
    }

    pub fn store(&self) -> &Arc<DataStore> {
        &self.shared.store
    }

    pub fn failures(&self) -> broadcast::Receiver<CommandFailure> {
        self.shared.failures.subscribe()
    }

    /// `true` while a call for `target` is out at the processor.
    pub fn is_in_flight(&self, target: &Target) -> bool {
        self.shared.mailboxes.is_busy(target)
    }

    // ── Device intents ───────────────────────────────────────────────

    /// Flip a light, lock or media room. Lights switched on without a level
    /// come back at their remembered brightness.
    pub fn toggle(&self, id: &DeviceId) -> Result<CommandTicket, CoreError> {
        let device = self.device(id)?;
        match &device.state {
            DeviceState::Dimmer { .. } | DeviceState::Switch { .. } => {
                self.set_power(id, !device.is_on())
            }
            DeviceState::Lock { locked } => self.submit_discrete(id, DevicePatch::Locked(!locked)),
            DeviceState::Media(m) => self.submit_discrete(id, DevicePatch::Power(!m.powered)),
            DeviceState::Thermostat(_) => Err(CoreError::validation(
                "thermostats cannot be toggled; set a mode instead",
            )),
        }
    }

    pub fn set_power(&self, id: &DeviceId, on: bool) -> Result<CommandTicket, CoreError> {
        let device = self.device(id)?;
        let patch = self.power_patch(&device, on);
        self.submit_discrete(id, patch)
    }

    /// Continuous: every value shows immediately, only the last is sent.
    pub fn set_brightness(&self, id: &DeviceId, level: Percent) -> Result<CommandTicket, CoreError> {
        let device = self.device(id)?;
        if level.is_zero() {
            if let Some(current) = device.state.brightness() {
                self.shared.memory.remember(id, current);
            }
        }
        self.submit_continuous(id, DevicePatch::Brightness(level))
    }

    pub fn set_locked(&self, id: &DeviceId, locked: bool) -> Result<CommandTicket, CoreError> {
        self.submit_discrete(id, DevicePatch::Locked(locked))
    }

    pub fn set_setpoint(&self, id: &DeviceId, setpoint: Temperature) -> Result<CommandTicket, CoreError> {
        self.submit_discrete(id, DevicePatch::Setpoint(setpoint))
    }

    pub fn set_mode(&self, id: &DeviceId, mode: ClimateMode) -> Result<CommandTicket, CoreError> {
        self.submit_discrete(id, DevicePatch::Mode(mode))
    }

    pub fn set_volume(&self, id: &DeviceId, volume: Percent) -> Result<CommandTicket, CoreError> {
        self.submit_continuous(id, DevicePatch::Volume(volume))
    }

    pub fn select_source(&self, id: &DeviceId, source: u32) -> Result<CommandTicket, CoreError> {
        self.submit_discrete(id, DevicePatch::Source(source))
    }

    // ── Scenes & quick actions ───────────────────────────────────────

    pub fn recall_scene(&self, id: &SceneId) -> Result<CommandTicket, CoreError> {
        if self.shared.store.scene(id).is_none() {
            return Err(CoreError::validation(format!("unknown scene {id}")));
        }
        Ok(self.post(Intent::RecallScene(*id), None))
    }

    pub fn run_quick_action(&self, id: &QuickActionId) -> Result<CommandTicket, CoreError> {
        if self.shared.store.quick_action(id).is_none() {
            return Err(CoreError::validation(format!("unknown quick action {id}")));
        }
        Ok(self.post(Intent::RunQuickAction(*id), None))
    }

    /// Submit a pre-built intent, picking the path its patch calls for.
    pub fn submit(&self, intent: Intent) -> Result<CommandTicket, CoreError> {
        match intent {
            Intent::Device {
                id,
                patch: DevicePatch::Power(on),
            } => self.set_power(&id, on),
            Intent::Device { id, patch } if patch.is_continuous() => {
                self.submit_continuous(&id, patch)
            }
            Intent::Device { id, patch } => self.submit_discrete(&id, patch),
            Intent::RecallScene(id) => self.recall_scene(&id),
            Intent::RunQuickAction(id) => self.run_quick_action(&id),
        }
    }

    // ── Internals ────────────────────────────────────────────────────

    fn device(&self, id: &DeviceId) -> Result<Arc<Device>, CoreError> {
        self.shared
            .store
            .device(id)
            .ok_or_else(|| CoreError::validation(format!("unknown device {id}")))
    }

    /// Dimmers are switched through their level so memory applies.
    fn power_patch(&self, device: &Device, on: bool) -> DevicePatch {
        let DeviceState::Dimmer { brightness } = device.state else {
            return DevicePatch::Power(on);
        };
        if !on {
            self.shared.memory.remember(&device.id, brightness);
            return DevicePatch::Brightness(Percent::ZERO);
        }
        if brightness.is_zero() {
            let restored = self
                .shared
                .memory
                .recall(&device.id)
                .unwrap_or(self.shared.settings.default_restore);
            DevicePatch::Brightness(restored)
        } else {
            DevicePatch::Brightness(brightness)
        }
    }

    fn submit_discrete(&self, id: &DeviceId, patch: DevicePatch) -> Result<CommandTicket, CoreError> {
        let revision = self.shared.store.apply_optimistic(id, &patch)?;
        // A waiting slider value must not land after this.
        self.shared.debouncer.cancel(&Target::Device(*id));
        Ok(self.post(Intent::Device { id: *id, patch }, Some(revision)))
    }

    fn submit_continuous(&self, id: &DeviceId, patch: DevicePatch) -> Result<CommandTicket, CoreError> {
        let revision = self.shared.store.apply_optimistic(id, &patch)?;
        let target = Target::Device(*id);
        let (reply, rx) = oneshot::channel();

        let shared = Arc::clone(&self.shared);
        let id = *id;
        self.shared
            .debouncer
            .schedule(target, self.shared.settings.debounce, async move {
                if shared.store.revision(&id) != Some(revision) {
                    let _ = reply.send(Ok(CommandOutcome::Superseded));
                    return;
                }
                shared.post(Pending {
                    intent: Intent::Device { id, patch },
                    revision: Some(revision),
                    reply,
                });
            });

        Ok(CommandTicket { target, rx })
    }

    fn post(&self, intent: Intent, revision: Option<Revision>) -> CommandTicket {
        let target = intent.target();
        let (reply, rx) = oneshot::channel();
        self.shared.post(Pending {
            intent,
            revision,
            reply,
        });
        CommandTicket { target, rx }
    }
}

impl<E: CommandExecutor> Shared<E> {
    fn post(self: &Arc<Self>, pending: Pending) {
        let target = pending.intent.target();
        if let Some(first) = self.mailboxes.post(target, pending) {
            let shared = Arc::clone(self);
            tokio::spawn(async move {
                shared.drain(target, first).await;
            });
        }
    }

    /// Worker for one target: run the pending call, then whatever queued
    /// behind it, until the slot is empty.
    async fn drain(&self, target: Target, mut pending: Pending) {
        loop {
            let result = self.run(&pending.intent, pending.revision).await;
            if let Err(error) = &result {
                let _ = self.failures.send(CommandFailure {
                    target,
                    error: error.clone(),
                });
            }
            let _ = pending.reply.send(result);

            match self.mailboxes.next(&target) {
                Some(next) => pending = next,
                None => break,
            }
        }
    }

    async fn run(&self, intent: &Intent, revision: Option<Revision>) -> Result<CommandOutcome, CoreError> {
        debug!(to = %intent.target(), ?intent, "dispatching");
        match self.executor.execute(intent).await {
            Ok(answer) => Ok(self.settle(intent, revision, answer).await),
            Err(error) => {
                warn!(to = %intent.target(), %error, "command failed");
                if let (Intent::Device { id, .. }, Some(revision)) = (intent, revision) {
                    self.store.rollback(id, revision);
                }
                Err(error)
            }
        }
    }

    async fn settle(
        &self,
        intent: &Intent,
        revision: Option<Revision>,
        answer: Option<DeviceState>,
    ) -> CommandOutcome {
        match intent {
            Intent::Device { id, patch } => {
                let Some(revision) = revision else {
                    return CommandOutcome::Confirmed;
                };
                let reconciled = match answer {
                    Some(state) => self.store.reconcile(id, state, revision),
                    None => self.store.confirm(id, patch, revision),
                };
                match reconciled {
                    Reconciled::Applied => CommandOutcome::Confirmed,
                    Reconciled::Superseded | Reconciled::Unknown => CommandOutcome::Overtaken,
                }
            }
            Intent::RecallScene(_) | Intent::RunQuickAction(_) => {
                if let Err(error) = self.executor.refresh().await {
                    warn!(%error, "refresh after scene/quick action failed");
                }
                CommandOutcome::Confirmed
            }
        }
    }
}
