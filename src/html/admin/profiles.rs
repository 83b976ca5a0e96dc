use axum::response::Response;

use crate::api::admin::require_admin;
use crate::cookies::Admin;
use crate::{AppError, AppState, RequestBody};

#[derive(serde::Deserialize)]
pub struct ProfilesPage {}

impl RequestBody for ProfilesPage {
    type Response = Response;

    async fn request(
        self,
        state: AppState,
        admin: Option<Admin>,
    ) -> Result<Self::Response, AppError> {
        require_admin(admin.clone())?;
        let profiles = state
            .get_all_profiles()
            .await?
            .into_iter()
            .map(|p| serde_json::json!({ "name": p.name(), "profile": p }))
            .collect::<Vec<_>>();
        Ok(crate::render_html_template(
            "admin-profiles.html",
            &admin,
            serde_json::json!({ "profiles": profiles }),
        ))
    }
}
