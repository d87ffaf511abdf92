// ── Authenticated processor access ──
//
// The one place that pairs the stateless client with the live session.
// Every call goes through `authed`: an expired session is renewed once
// through the session manager and the call is replayed once.

use std::sync::Arc;

use tracing::{debug, info};
use tutera_api::models::LightLevel;
use tutera_api::{ControllerClient, SessionContext};

use crate::dispatch::{CommandExecutor, Intent};
use crate::error::CoreError;
use crate::model::{
    ClimateMode, Device, DeviceId, DeviceKind, DevicePatch, DeviceState, Percent, QuickAction,
    Room, Scene,
};
use crate::session::SessionManager;
use crate::store::{DataStore, RefreshSnapshot};

pub(crate) struct Gateway {
    client: ControllerClient,
    session: Arc<SessionManager>,
    store: Arc<DataStore>,
}

impl Gateway {
    pub(crate) fn new(
        client: ControllerClient,
        session: Arc<SessionManager>,
        store: Arc<DataStore>,
    ) -> Self {
        Self {
            client,
            session,
            store,
        }
    }

    /// Run `op` with the active session, renewing it once on expiry.
    pub(crate) async fn authed<T, F, Fut>(&self, op: F) -> Result<T, CoreError>
    where
        F: Fn(SessionContext) -> Fut,
        Fut: Future<Output = Result<T, tutera_api::Error>>,
    {
        let ctx = self.session.context()?;
        match op(ctx.clone()).await {
            Err(e) if e.is_auth_expired() => {
                debug!(key = %ctx.key(), "session rejected; renewing");
                let fresh = self.session.reauthenticate(&ctx).await?;
                Ok(op(fresh).await?)
            }
            other => Ok(other?),
        }
    }

    /// Fetch every listing and replace the store's contents.
    pub(crate) async fn full_refresh(&self) -> Result<(), CoreError> {
        let client = &self.client;
        let snapshot = self
            .authed(|ctx| async move {
                let (rooms, lights, thermostats, locks, scenes, quick_actions, media) = tokio::join!(
                    client.list_rooms(&ctx),
                    client.list_lights(&ctx),
                    client.list_thermostats(&ctx),
                    client.list_door_locks(&ctx),
                    client.list_scenes(&ctx),
                    client.list_quick_actions(&ctx),
                    client.list_media_rooms(&ctx),
                );

                let mut devices: Vec<Device> = Vec::new();
                devices.extend(lights?.into_iter().map(Device::from));
                devices.extend(thermostats?.into_iter().map(Device::from));
                devices.extend(locks?.into_iter().map(Device::from));
                devices.extend(media?.into_iter().map(Device::from));

                Ok::<_, tutera_api::Error>(RefreshSnapshot {
                    rooms: rooms?.into_iter().map(Room::from).collect(),
                    devices,
                    scenes: scenes?.into_iter().map(Scene::from).collect(),
                    quick_actions: quick_actions?.into_iter().map(QuickAction::from).collect(),
                })
            })
            .await?;

        info!(
            rooms = snapshot.rooms.len(),
            devices = snapshot.devices.len(),
            scenes = snapshot.scenes.len(),
            "refreshed from processor"
        );
        self.store.apply_refresh(snapshot);
        Ok(())
    }

    /// Best-effort remote logout of a session that is already forgotten
    /// locally.
    pub(crate) async fn logout(&self, ctx: &SessionContext) {
        if let Err(e) = self.client.logout(ctx).await {
            debug!(error = %e, "logout failed (ignored)");
        }
    }

    // ── Intent translation ───────────────────────────────────────────

    async fn perform(&self, intent: &Intent) -> Result<(), CoreError> {
        let client = &self.client;
        match intent {
            Intent::RecallScene(id) => {
                let id = id.0;
                self.authed(|ctx| async move { client.recall_scene(&ctx, id).await })
                    .await
            }
            Intent::RunQuickAction(id) => {
                let id = id.0;
                self.authed(|ctx| async move { client.run_quick_action(&ctx, id).await })
                    .await
            }
            Intent::Device { id, patch } => self.perform_device(id, patch).await,
        }
    }

    async fn perform_device(&self, id: &DeviceId, patch: &DevicePatch) -> Result<(), CoreError> {
        let client = &self.client;
        let raw = id.raw();
        match (id.kind(), patch) {
            (DeviceKind::Light, DevicePatch::Brightness(level)) => {
                self.send_light_level(raw, *level).await
            }
            (DeviceKind::Light, DevicePatch::Power(on)) => {
                // A dimmer switched on keeps the level already shown locally.
                let level = match (*on, self.store.device(id).map(|d| d.state.clone())) {
                    (false, _) => Percent::ZERO,
                    (true, Some(DeviceState::Dimmer { brightness })) if !brightness.is_zero() => {
                        brightness
                    }
                    (true, _) => Percent::FULL,
                };
                self.send_light_level(raw, level).await
            }
            (DeviceKind::Lock, DevicePatch::Locked(true)) => {
                self.authed(|ctx| async move { client.lock_door(&ctx, raw).await })
                    .await
            }
            (DeviceKind::Lock, DevicePatch::Locked(false)) => {
                self.authed(|ctx| async move { client.unlock_door(&ctx, raw).await })
                    .await
            }
            (DeviceKind::Thermostat, DevicePatch::Setpoint(temperature)) => {
                let kind = match self.store.device(id).map(|d| d.state.clone()) {
                    Some(DeviceState::Thermostat(climate)) => climate.mode.setpoint_kind(),
                    _ => ClimateMode::default().setpoint_kind(),
                };
                let tenths = temperature.tenths();
                self.authed(|ctx| async move {
                    client
                        .set_thermostat_setpoint(&ctx, raw, kind, tenths)
                        .await
                })
                .await
            }
            (DeviceKind::Thermostat, DevicePatch::Mode(mode)) => {
                let mode = mode.to_string();
                let mode = mode.as_str();
                self.authed(|ctx| async move { client.set_thermostat_mode(&ctx, raw, mode).await })
                    .await
            }
            (DeviceKind::Media, DevicePatch::Power(on)) => {
                let on = *on;
                self.authed(|ctx| async move { client.set_media_power(&ctx, raw, on).await })
                    .await
            }
            (DeviceKind::Media, DevicePatch::Volume(volume)) => {
                let level = volume.to_level();
                self.authed(|ctx| async move { client.set_media_volume(&ctx, raw, level).await })
                    .await
            }
            (DeviceKind::Media, DevicePatch::Source(source)) => {
                let source = *source;
                self.authed(|ctx| async move { client.select_media_source(&ctx, raw, source).await })
                    .await
            }
            (kind, patch) => Err(CoreError::validation(format!(
                "{patch:?} is not supported by {kind} devices"
            ))),
        }
    }

    async fn send_light_level(&self, id: u32, level: Percent) -> Result<(), CoreError> {
        let client = &self.client;
        let levels = [LightLevel {
            id,
            level: level.to_level(),
            time: 0,
        }];
        let levels = &levels;
        self.authed(|ctx| async move { client.set_light_levels(&ctx, levels).await })
            .await
    }
}

impl CommandExecutor for Gateway {
    async fn execute(&self, intent: &Intent) -> Result<Option<DeviceState>, CoreError> {
        self.perform(intent).await?;
        // The processor acknowledges commands without echoing state.
        Ok(None)
    }

    async fn refresh(&self) -> Result<(), CoreError> {
        self.full_refresh().await
    }
}
