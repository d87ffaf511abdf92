use tracing::debug;

use crate::auth::SessionContext;
use crate::client::ControllerClient;
use crate::error::Error;
use crate::models::DoorLockPayload;

impl ControllerClient {
    /// List door locks and their state.
    ///
    /// `GET /doorlocks`
    pub async fn list_door_locks(
        &self,
        ctx: &SessionContext,
    ) -> Result<Vec<DoorLockPayload>, Error> {
        debug!("listing door locks");
        self.list(ctx, "doorlocks", "doorLocks").await
    }

    /// `POST /doorlocks/lock/{id}`
    pub async fn lock_door(&self, ctx: &SessionContext, id: u32) -> Result<(), Error> {
        debug!(id, "locking door");
        self.post_empty(ctx, &format!("doorlocks/lock/{id}")).await?;
        Ok(())
    }

    /// `POST /doorlocks/unlock/{id}`
    pub async fn unlock_door(&self, ctx: &SessionContext, id: u32) -> Result<(), Error> {
        debug!(id, "unlocking door");
        self.post_empty(ctx, &format!("doorlocks/unlock/{id}"))
            .await?;
        Ok(())
    }
}
