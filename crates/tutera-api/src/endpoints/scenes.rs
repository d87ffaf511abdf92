use tracing::debug;

use crate::auth::SessionContext;
use crate::client::ControllerClient;
use crate::error::Error;
use crate::models::{QuickActionPayload, ScenePayload};

impl ControllerClient {
    /// List scenes.
    ///
    /// `GET /scenes`
    pub async fn list_scenes(&self, ctx: &SessionContext) -> Result<Vec<ScenePayload>, Error> {
        debug!("listing scenes");
        self.list(ctx, "scenes", "scenes").await
    }

    /// `POST /scenes/recall/{id}`
    pub async fn recall_scene(&self, ctx: &SessionContext, id: u32) -> Result<(), Error> {
        debug!(id, "recalling scene");
        self.post_empty(ctx, &format!("scenes/recall/{id}")).await?;
        Ok(())
    }

    /// List quick actions.
    ///
    /// `GET /quickactions`
    pub async fn list_quick_actions(
        &self,
        ctx: &SessionContext,
    ) -> Result<Vec<QuickActionPayload>, Error> {
        debug!("listing quick actions");
        self.list(ctx, "quickactions", "quickActions").await
    }

    /// `POST /quickactions/{id}`
    pub async fn run_quick_action(&self, ctx: &SessionContext, id: u32) -> Result<(), Error> {
        debug!(id, "running quick action");
        self.post_empty(ctx, &format!("quickactions/{id}")).await?;
        Ok(())
    }
}
