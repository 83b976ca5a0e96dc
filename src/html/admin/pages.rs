use axum::response::Response;

use crate::api::admin::require_admin;
use crate::cookies::Admin;
use crate::{AppError, AppState, RequestBody};

#[derive(serde::Deserialize)]
pub struct PagesPage {}

impl RequestBody for PagesPage {
    type Response = Response;

    async fn request(
        self,
        state: AppState,
        admin: Option<Admin>,
    ) -> Result<Self::Response, AppError> {
        require_admin(admin.clone())?;
        let pages = state.get_all_pages().await?;
        Ok(crate::render_html_template(
            "admin-pages.html",
            &admin,
            serde_json::json!({ "pages": pages }),
        ))
    }
}
