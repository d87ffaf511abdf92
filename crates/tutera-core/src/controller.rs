// ── Controller abstraction ──
//
// Lifecycle for one processor connection: session establishment, the
// initial snapshot, periodic polling, and the intent surface consumers
// drive. Everything observable goes through the `DataStore`.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tutera_api::ControllerClient;

use crate::config::ControllerConfig;
use crate::dispatch::{
    CommandFailure, CommandTicket, DispatchSettings, Dispatcher, GroupReport, Intent,
};
use crate::error::CoreError;
use crate::gateway::Gateway;
use crate::memory::BrightnessMemory;
use crate::model::{
    ClimateMode, Device, DeviceId, Percent, QuickAction, QuickActionId, Room, RoomId,
    RoomSummary, Scene, SceneId, Temperature,
};
use crate::session::{SessionManager, SessionStatus};
use crate::store::DataStore;
use crate::stream::EntityStream;

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    /// The session was lost and cannot be renewed unattended.
    Failed,
}

// ── Controller ───────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. Reads are served from the
/// store; intents go through the dispatcher, which talks to the processor
/// under the current session.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: ControllerConfig,
    session: Arc<SessionManager>,
    store: Arc<DataStore>,
    dispatcher: Dispatcher<Gateway>,
    connection_state: watch::Sender<ConnectionState>,
    cancel: CancellationToken,
    /// Child token for the current connection; cancelled on disconnect,
    /// replaced on reconnect.
    cancel_child: Mutex<CancellationToken>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Controller {
    /// Build a controller. Does NOT connect; call
    /// [`connect_with`](Self::connect_with) or
    /// [`auto_connect`](Self::auto_connect).
    pub fn new(
        config: ControllerConfig,
        memory: Arc<dyn BrightnessMemory>,
    ) -> Result<Self, CoreError> {
        let client = ControllerClient::new(&config.transport())?;
        Ok(Self::with_client(config, memory, client))
    }

    /// Build a controller around a pre-built client.
    pub fn with_client(
        config: ControllerConfig,
        memory: Arc<dyn BrightnessMemory>,
        client: ControllerClient,
    ) -> Self {
        let store = Arc::new(DataStore::new());
        let session = Arc::new(SessionManager::new(
            client.clone(),
            config.auto_connect.clone(),
        ));
        let gateway = Gateway::new(client, Arc::clone(&session), Arc::clone(&store));
        let dispatcher = Dispatcher::new(
            gateway,
            Arc::clone(&store),
            memory,
            DispatchSettings {
                debounce: config.debounce,
                default_restore: config.default_restore,
            },
        );
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Self {
            inner: Arc::new(ControllerInner {
                config,
                session,
                store,
                dispatcher,
                connection_state,
                cancel,
                cancel_child: Mutex::new(cancel_child),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<DataStore> {
        &self.inner.store
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Log in with a user-provided token, load the initial snapshot and
    /// start polling.
    ///
    /// Sessions opened this way are never renewed unattended: once the
    /// processor rejects the key the controller disconnects.
    pub async fn connect_with(
        &self,
        processor: &str,
        token: &SecretString,
    ) -> Result<(), CoreError> {
        self.set_state(ConnectionState::Connecting);
        if let Err(e) = self.inner.session.login(processor, token).await {
            self.set_state(ConnectionState::Failed);
            return Err(e);
        }
        self.start().await
    }

    /// Connect with the environment credentials from the config.
    ///
    /// Returns `None` when there are none or the processor refused them;
    /// the reason is logged, never raised.
    pub async fn auto_connect(&self) -> Option<SessionStatus> {
        self.set_state(ConnectionState::Connecting);
        if self.inner.session.try_auto_connect().await.is_none() {
            self.set_state(ConnectionState::Disconnected);
            return None;
        }
        match self.start().await {
            Ok(()) => Some(self.session_status()),
            Err(e) => {
                warn!(error = %e, "auto-connect could not load the processor state");
                None
            }
        }
    }

    /// Initial snapshot and background tasks for a fresh session.
    async fn start(&self) -> Result<(), CoreError> {
        if let Err(e) = self.full_refresh().await {
            self.inner.session.disconnect();
            self.set_state(ConnectionState::Failed);
            return Err(e);
        }

        // A reconnect replaces the poll task of the previous session.
        self.stop_tasks().await;

        let interval_secs = self.inner.config.refresh_interval_secs;
        if interval_secs > 0 {
            let cancel = self.inner.cancel_child.lock().await.clone();
            let ctrl = self.clone();
            self.inner
                .task_handles
                .lock()
                .await
                .push(tokio::spawn(poll_task(ctrl, interval_secs, cancel)));
        }

        self.set_state(ConnectionState::Connected);
        info!(
            devices = self.inner.store.device_count(),
            poll_secs = interval_secs,
            "connected to processor"
        );
        Ok(())
    }

    /// Stop background tasks, log out (best effort) and forget all state.
    pub async fn disconnect(&self) {
        self.stop_tasks().await;

        if let Some(ctx) = self.inner.session.disconnect() {
            self.inner.dispatcher.executor().logout(&ctx).await;
        }
        self.inner.store.clear();
        self.set_state(ConnectionState::Disconnected);
        debug!("disconnected");
    }

    /// Re-read everything from the processor.
    ///
    /// An auth error here means the session is gone for good (it was
    /// renewed once already if it could be).
    pub async fn full_refresh(&self) -> Result<(), CoreError> {
        let result = self.inner.dispatcher.executor().full_refresh().await;
        if let Err(e) = &result {
            if e.is_auth() && !self.inner.session.is_connected() {
                self.set_state(ConnectionState::Failed);
            }
        }
        result
    }

    // ── One-shot convenience ─────────────────────────────────────

    /// Connect with the config's credentials, run `f`, disconnect.
    ///
    /// Meant for single CLI invocations: polling is disabled and login
    /// failures are returned rather than swallowed.
    pub async fn oneshot<F, Fut, T>(
        config: ControllerConfig,
        memory: Arc<dyn BrightnessMemory>,
        f: F,
    ) -> Result<T, CoreError>
    where
        F: FnOnce(Controller) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.refresh_interval_secs = 0;
        let credentials = cfg.auto_connect.clone().ok_or_else(|| CoreError::Config {
            message: "no processor address or auth token configured".into(),
        })?;

        let controller = Controller::new(cfg, memory)?;
        controller
            .connect_with(&credentials.processor, &credentials.token)
            .await?;
        let result = f(controller.clone()).await;
        controller.disconnect().await;
        result
    }

    // ── State observation ────────────────────────────────────────

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    pub fn session_status(&self) -> SessionStatus {
        self.inner.session.status()
    }

    pub fn session_updates(&self) -> watch::Receiver<SessionStatus> {
        self.inner.session.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.inner.session.is_connected()
    }

    /// Every failed command, including ones nobody awaits.
    pub fn failures(&self) -> broadcast::Receiver<CommandFailure> {
        self.inner.dispatcher.failures()
    }

    // ── Snapshot accessors (delegate to DataStore) ───────────────

    pub fn rooms_snapshot(&self) -> Arc<Vec<Arc<Room>>> {
        self.inner.store.rooms_snapshot()
    }

    pub fn devices_snapshot(&self) -> Arc<Vec<Arc<Device>>> {
        self.inner.store.devices_snapshot()
    }

    pub fn scenes_snapshot(&self) -> Arc<Vec<Arc<Scene>>> {
        self.inner.store.scenes_snapshot()
    }

    pub fn quick_actions_snapshot(&self) -> Arc<Vec<Arc<QuickAction>>> {
        self.inner.store.quick_actions_snapshot()
    }

    pub fn room_summaries_snapshot(&self) -> Arc<Vec<Arc<RoomSummary>>> {
        self.inner.store.room_summaries_snapshot()
    }

    pub fn device(&self, id: &DeviceId) -> Option<Arc<Device>> {
        self.inner.store.device(id)
    }

    pub fn room_summary(&self, id: &RoomId) -> Option<Arc<RoomSummary>> {
        self.inner.store.room_summary(id)
    }

    // ── Stream accessors ─────────────────────────────────────────

    pub fn rooms(&self) -> EntityStream<Room> {
        self.inner.store.subscribe_rooms()
    }

    pub fn devices(&self) -> EntityStream<Device> {
        self.inner.store.subscribe_devices()
    }

    pub fn scenes(&self) -> EntityStream<Scene> {
        self.inner.store.subscribe_scenes()
    }

    pub fn quick_actions(&self) -> EntityStream<QuickAction> {
        self.inner.store.subscribe_quick_actions()
    }

    pub fn room_summaries(&self) -> EntityStream<RoomSummary> {
        self.inner.store.subscribe_room_summaries()
    }

    // ── Intents ──────────────────────────────────────────────────

    pub fn toggle(&self, id: &DeviceId) -> Result<CommandTicket, CoreError> {
        self.require_session()?;
        self.inner.dispatcher.toggle(id)
    }

    pub fn set_power(&self, id: &DeviceId, on: bool) -> Result<CommandTicket, CoreError> {
        self.require_session()?;
        self.inner.dispatcher.set_power(id, on)
    }

    pub fn set_brightness(&self, id: &DeviceId, level: Percent) -> Result<CommandTicket, CoreError> {
        self.require_session()?;
        self.inner.dispatcher.set_brightness(id, level)
    }

    pub fn set_locked(&self, id: &DeviceId, locked: bool) -> Result<CommandTicket, CoreError> {
        self.require_session()?;
        self.inner.dispatcher.set_locked(id, locked)
    }

    pub fn set_setpoint(&self, id: &DeviceId, setpoint: Temperature) -> Result<CommandTicket, CoreError> {
        self.require_session()?;
        self.inner.dispatcher.set_setpoint(id, setpoint)
    }

    pub fn set_mode(&self, id: &DeviceId, mode: ClimateMode) -> Result<CommandTicket, CoreError> {
        self.require_session()?;
        self.inner.dispatcher.set_mode(id, mode)
    }

    pub fn set_volume(&self, id: &DeviceId, volume: Percent) -> Result<CommandTicket, CoreError> {
        self.require_session()?;
        self.inner.dispatcher.set_volume(id, volume)
    }

    pub fn select_source(&self, id: &DeviceId, source: u32) -> Result<CommandTicket, CoreError> {
        self.require_session()?;
        self.inner.dispatcher.select_source(id, source)
    }

    pub fn recall_scene(&self, id: &SceneId) -> Result<CommandTicket, CoreError> {
        self.require_session()?;
        self.inner.dispatcher.recall_scene(id)
    }

    pub fn run_quick_action(&self, id: &QuickActionId) -> Result<CommandTicket, CoreError> {
        self.require_session()?;
        self.inner.dispatcher.run_quick_action(id)
    }

    pub fn submit(&self, intent: Intent) -> Result<CommandTicket, CoreError> {
        self.require_session()?;
        self.inner.dispatcher.submit(intent)
    }

    /// Switch every light in a room; see [`GroupReport`].
    pub async fn set_room_power(&self, room: &RoomId, on: bool) -> Result<GroupReport, CoreError> {
        self.require_session()?;
        self.inner.dispatcher.set_room_power(room, on).await
    }

    pub fn set_scene_favorite(&self, id: &SceneId, favorite: bool) -> Result<(), CoreError> {
        self.inner.store.set_scene_favorite(id, favorite)
    }

    // ── Internals ────────────────────────────────────────────────

    /// Cancel and join the background tasks. The child token is replaced,
    /// not the parent, so a later connect can spawn again.
    async fn stop_tasks(&self) {
        {
            let mut child = self.inner.cancel_child.lock().await;
            child.cancel();
            *child = self.inner.cancel.child_token();
        }

        let handles: Vec<_> = self.inner.task_handles.lock().await.drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }
    }

    fn require_session(&self) -> Result<(), CoreError> {
        if self.inner.session.is_connected() {
            Ok(())
        } else {
            Err(CoreError::not_connected())
        }
    }

    fn set_state(&self, state: ConnectionState) {
        self.inner.connection_state.send_replace(state);
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Periodically re-read the processor until cancelled or the session is
/// lost for good.
async fn poll_task(controller: Controller, interval_secs: u64, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                match controller.full_refresh().await {
                    Ok(()) => {}
                    Err(e) if e.is_auth() => {
                        warn!(error = %e, "session lost; polling stopped");
                        break;
                    }
                    Err(e) => warn!(error = %e, "periodic refresh failed"),
                }
            }
        }
    }
}
