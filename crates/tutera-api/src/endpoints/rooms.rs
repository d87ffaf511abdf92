use tracing::debug;

use crate::auth::SessionContext;
use crate::client::ControllerClient;
use crate::error::Error;
use crate::models::RoomPayload;

impl ControllerClient {
    /// List rooms.
    ///
    /// `GET /rooms` -- some firmware returns a bare array, some wraps it
    /// as `{"rooms": [...]}`; both are accepted.
    pub async fn list_rooms(&self, ctx: &SessionContext) -> Result<Vec<RoomPayload>, Error> {
        debug!("listing rooms");
        self.list(ctx, "rooms", "rooms").await
    }
}
