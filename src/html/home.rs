use axum::response::Response;
use chrono::Utc;

use crate::cookies::Admin;
use crate::db::{AnnouncementId, titles};
use crate::html::with_page;
use crate::{AppError, AppState, RequestBody};

#[derive(serde::Deserialize)]
pub struct HomePage {}

impl RequestBody for HomePage {
    type Response = Response;

    async fn request(
        self,
        state: AppState,
        admin: Option<Admin>,
    ) -> Result<Self::Response, AppError> {
        let today = Utc::now().date_naive();
        let announcements = state.get_active_announcements(today).await?;

        let data = with_page(
            &state,
            titles::HOME,
            serde_json::json!({
                "announcements": announcements.iter().map(|a| a.to_json()).collect::<Vec<_>>(),
            }),
        )
        .await?;
        Ok(crate::render_html_template("home.html", &admin, data))
    }
}

#[derive(serde::Deserialize)]
pub struct AnnouncementDetailPage {
    id: AnnouncementId,
}

impl RequestBody for AnnouncementDetailPage {
    type Response = Response;

    async fn request(
        self,
        state: AppState,
        admin: Option<Admin>,
    ) -> Result<Self::Response, AppError> {
        let announcement = state
            .get_opt_announcement(self.id)
            .await?
            .ok_or(AppError::NotFound)?;

        let data = with_page(
            &state,
            titles::ANNOUNCEMENT_DETAIL,
            serde_json::json!({ "announcement": announcement.to_json() }),
        )
        .await?;
        Ok(crate::render_html_template("detail.html", &admin, data))
    }
}

#[derive(serde::Deserialize)]
pub struct JoinPage {}

impl RequestBody for JoinPage {
    type Response = Response;

    async fn request(
        self,
        state: AppState,
        admin: Option<Admin>,
    ) -> Result<Self::Response, AppError> {
        let today = Utc::now().date_naive();
        let announcements = state.get_join_announcements(today).await?;

        let data = with_page(
            &state,
            titles::JOIN,
            serde_json::json!({
                "announcements": announcements.iter().map(|a| a.to_json()).collect::<Vec<_>>(),
            }),
        )
        .await?;
        Ok(crate::render_html_template("join.html", &admin, data))
    }
}
