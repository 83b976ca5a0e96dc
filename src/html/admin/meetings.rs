use axum::response::Response;

use crate::api::admin::require_admin;
use crate::cookies::Admin;
use crate::db::MeetingId;
use crate::util::parse_int_field;
use crate::{AppError, AppState, RequestBody};

#[derive(serde::Deserialize)]
pub struct MeetingsPage {}

impl RequestBody for MeetingsPage {
    type Response = Response;

    async fn request(
        self,
        state: AppState,
        admin: Option<Admin>,
    ) -> Result<Self::Response, AppError> {
        require_admin(admin.clone())?;

        let mut meetings = vec![];
        for meeting in state.get_all_meetings().await? {
            meetings.push(serde_json::json!({
                "has_detail": state.has_detail(&meeting).await?,
                "meeting": meeting,
            }));
        }

        Ok(crate::render_html_template(
            "admin-meetings.html",
            &admin,
            serde_json::json!({ "meetings": meetings }),
        ))
    }
}

/// Edit form for one meeting, or a blank form for a new one.
#[derive(serde::Deserialize)]
pub struct MeetingPage {
    id: Option<String>,
}

impl RequestBody for MeetingPage {
    type Response = Response;

    async fn request(
        self,
        state: AppState,
        admin: Option<Admin>,
    ) -> Result<Self::Response, AppError> {
        require_admin(admin.clone())?;

        let meeting = match parse_int_field("id", self.id)? {
            Some(id) => Some(
                state
                    .get_opt_meeting(MeetingId(id))
                    .await?
                    .ok_or(AppError::NotFound)?,
            ),
            None => None,
        };

        Ok(crate::render_html_template(
            "admin-meeting.html",
            &admin,
            serde_json::json!({ "meeting": meeting }),
        ))
    }
}
