use axum::response::Response;

use crate::cookies::Admin;
use crate::db::titles;
use crate::html::{with_bound_page, with_page};
use crate::traits::Linkable;
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
        let mut meetings = vec![];
        for meeting in state.get_all_meetings().await? {
            meetings.push(serde_json::json!({
                "has_detail": state.has_detail(&meeting).await?,
                "url": meeting.relative_url(),
                "meeting": meeting,
            }));
        }

        let data = with_page(
            &state,
            titles::MEETINGS,
            serde_json::json!({ "meetings": meetings }),
        )
        .await?;
        Ok(crate::render_html_template("meetings.html", &admin, data))
    }
}

#[derive(serde::Deserialize)]
pub struct MeetingDetailPage {
    year: i64,
}

impl RequestBody for MeetingDetailPage {
    type Response = Response;

    async fn request(
        self,
        state: AppState,
        admin: Option<Admin>,
    ) -> Result<Self::Response, AppError> {
        let meeting = state
            .get_meeting_by_year(self.year)
            .await?
            .ok_or(AppError::NotFound)?;
        let abstracts = state.get_accepted_abstracts(meeting.year).await?;

        let page = match meeting.page_id {
            Some(page_id) => state.get_opt_page(page_id).await?.filter(|p| p.is_public),
            None => None,
        };

        let data = with_bound_page(
            &state,
            page,
            serde_json::json!({
                "meeting": meeting,
                "abstracts": abstracts.iter().map(|a| a.to_json()).collect::<Vec<_>>(),
            }),
        )
        .await?;
        Ok(crate::render_html_template("meeting-detail.html", &admin, data))
    }
}

#[derive(serde::Deserialize)]
pub struct ThanksPage {}

impl RequestBody for ThanksPage {
    type Response = Response;

    async fn request(
        self,
        state: AppState,
        admin: Option<Admin>,
    ) -> Result<Self::Response, AppError> {
        let data = with_page(&state, titles::THANKS, serde_json::json!({})).await?;
        Ok(crate::render_html_template("thanks.html", &admin, data))
    }
}
