use serde_json::json;
use tracing::debug;

use crate::auth::SessionContext;
use crate::client::ControllerClient;
use crate::error::Error;
use crate::models::ThermostatPayload;

impl ControllerClient {
    /// List thermostats.
    ///
    /// `GET /thermostats`
    pub async fn list_thermostats(
        &self,
        ctx: &SessionContext,
    ) -> Result<Vec<ThermostatPayload>, Error> {
        debug!("listing thermostats");
        self.list(ctx, "thermostats", "thermostats").await
    }

    /// Change a setpoint. `kind` is `"Heat"`, `"Cool"` or `"Auto"`;
    /// `temperature` is in tenths of a degree.
    ///
    /// `POST /thermostats/SetPoint`
    pub async fn set_thermostat_setpoint(
        &self,
        ctx: &SessionContext,
        id: u32,
        kind: &str,
        temperature: i32,
    ) -> Result<(), Error> {
        debug!(id, kind, temperature, "setting thermostat setpoint");
        let body = json!({
            "id": id,
            "setpoints": [{ "type": kind, "temperature": temperature }],
        });
        self.post(ctx, "thermostats/SetPoint", &body).await?;
        Ok(())
    }

    /// Change the operating mode (`"HEAT"`, `"COOL"`, `"AUTO"`, `"OFF"`).
    ///
    /// `POST /thermostats/mode`
    pub async fn set_thermostat_mode(
        &self,
        ctx: &SessionContext,
        id: u32,
        mode: &str,
    ) -> Result<(), Error> {
        debug!(id, mode, "setting thermostat mode");
        let body = json!({ "thermostats": [{ "id": id, "mode": mode }] });
        self.post(ctx, "thermostats/mode", &body).await?;
        Ok(())
    }
}
