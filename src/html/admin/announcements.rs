use axum::response::Response;
use chrono::Utc;

use crate::api::admin::require_admin;
use crate::cookies::Admin;
use crate::db::AnnouncementId;
use crate::util::parse_int_field;
use crate::{AppError, AppState, RequestBody};

#[derive(serde::Deserialize)]
pub struct AnnouncementsPage {}

impl RequestBody for AnnouncementsPage {
    type Response = Response;

    async fn request(
        self,
        state: AppState,
        admin: Option<Admin>,
    ) -> Result<Self::Response, AppError> {
        require_admin(admin.clone())?;

        let announcements = state.get_all_announcements().await?;
        Ok(crate::render_html_template(
            "admin-announcements.html",
            &admin,
            serde_json::json!({
                "announcements": announcements.iter().map(|a| a.to_json()).collect::<Vec<_>>(),
            }),
        ))
    }
}

/// Edit form for one announcement, or a blank form for a new one.
#[derive(serde::Deserialize)]
pub struct AnnouncementPage {
    id: Option<String>,
}

impl RequestBody for AnnouncementPage {
    type Response = Response;

    async fn request(
        self,
        state: AppState,
        admin: Option<Admin>,
    ) -> Result<Self::Response, AppError> {
        require_admin(admin.clone())?;

        let announcement = match parse_int_field("id", self.id)? {
            Some(id) => Some(
                state
                    .get_opt_announcement(AnnouncementId(id))
                    .await?
                    .ok_or(AppError::NotFound)?
                    .to_json(),
            ),
            None => None,
        };

        Ok(crate::render_html_template(
            "admin-announcement.html",
            &admin,
            serde_json::json!({
                "announcement": announcement,
                "today": Utc::now().date_naive(),
            }),
        ))
    }
}
