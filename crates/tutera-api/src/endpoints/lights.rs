use serde_json::json;
use tracing::debug;

use crate::auth::SessionContext;
use crate::client::ControllerClient;
use crate::error::Error;
use crate::models::{LightLevel, LightPayload};

impl ControllerClient {
    /// List dimmers and switches.
    ///
    /// `GET /lights`
    pub async fn list_lights(&self, ctx: &SessionContext) -> Result<Vec<LightPayload>, Error> {
        debug!("listing lights");
        self.list(ctx, "lights", "lights").await
    }

    /// Set one or more light levels in a single request.
    ///
    /// `POST /lights/SetState` with `{"lights": [{"id", "level", "time"}]}`
    pub async fn set_light_levels(
        &self,
        ctx: &SessionContext,
        levels: &[LightLevel],
    ) -> Result<(), Error> {
        debug!(count = levels.len(), "setting light levels");
        self.post(ctx, "lights/SetState", &json!({ "lights": levels }))
            .await?;
        Ok(())
    }
}
