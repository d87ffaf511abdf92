use tracing::debug;

use crate::auth::SessionContext;
use crate::client::ControllerClient;
use crate::error::Error;
use crate::models::MediaRoomPayload;

impl ControllerClient {
    /// List media rooms with power, volume and source state.
    ///
    /// `GET /mediarooms`
    pub async fn list_media_rooms(
        &self,
        ctx: &SessionContext,
    ) -> Result<Vec<MediaRoomPayload>, Error> {
        debug!("listing media rooms");
        self.list(ctx, "mediarooms", "mediaRooms").await
    }

    /// `POST /mediarooms/{id}/power/{on|off}`
    pub async fn set_media_power(
        &self,
        ctx: &SessionContext,
        id: u32,
        on: bool,
    ) -> Result<(), Error> {
        let state = if on { "on" } else { "off" };
        debug!(id, state, "setting media power");
        self.post_empty(ctx, &format!("mediarooms/{id}/power/{state}"))
            .await?;
        Ok(())
    }

    /// `POST /mediarooms/{id}/volume/{level}` (level 0..=65535)
    pub async fn set_media_volume(
        &self,
        ctx: &SessionContext,
        id: u32,
        level: u16,
    ) -> Result<(), Error> {
        debug!(id, level, "setting media volume");
        self.post_empty(ctx, &format!("mediarooms/{id}/volume/{level}"))
            .await?;
        Ok(())
    }

    /// `POST /mediarooms/{id}/selectsource/{source}`
    pub async fn select_media_source(
        &self,
        ctx: &SessionContext,
        id: u32,
        source: u32,
    ) -> Result<(), Error> {
        debug!(id, source, "selecting media source");
        self.post_empty(ctx, &format!("mediarooms/{id}/selectsource/{source}"))
            .await?;
        Ok(())
    }
}
