use axum::response::{IntoResponse, Redirect, Response};

use crate::api::admin::require_admin;
use crate::api::admin::sign_in::safe_redirect;
use crate::cookies::Admin;
use crate::{AppError, AppState, RequestBody};

pub mod abstracts;
pub mod announcements;
pub mod meetings;
pub mod pages;
pub mod profiles;

#[derive(serde::Deserialize)]
pub struct SignInPage {
    redirect: Option<String>,
}

impl RequestBody for SignInPage {
    type Response = Response;

    async fn request(
        self,
        _state: AppState,
        admin: Option<Admin>,
    ) -> Result<Self::Response, AppError> {
        let redirect = safe_redirect(self.redirect.as_deref());
        if admin.is_some() {
            return Ok(Redirect::to(&redirect).into_response());
        }
        Ok(crate::render_html_template(
            "admin-sign-in.html",
            &admin,
            serde_json::json!({
                "redirect": redirect,
                "error_msg": null,
            }),
        ))
    }
}

#[derive(serde::Deserialize)]
pub struct AdminIndexPage {}

impl RequestBody for AdminIndexPage {
    type Response = Response;

    async fn request(
        self,
        state: AppState,
        admin: Option<Admin>,
    ) -> Result<Self::Response, AppError> {
        require_admin(admin.clone())?;

        let announcements = state.get_all_announcements().await?;
        let active_count = announcements.iter().filter(|a| a.is_active()).count();
        let meetings = state.get_all_meetings().await?;
        let abstracts = state.search_abstracts(&Default::default()).await?;
        let accepted_count = abstracts.iter().filter(|a| a.accepted).count();

        Ok(crate::render_html_template(
            "admin-index.html",
            &admin,
            serde_json::json!({
                "announcement_count": announcements.len(),
                "active_announcement_count": active_count,
                "meeting_count": meetings.len(),
                "abstract_count": abstracts.len(),
                "accepted_abstract_count": accepted_count,
            }),
        ))
    }
}
