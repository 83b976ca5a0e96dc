use axum_typed_multipart::TryFromMultipart;

use super::require_admin;
use crate::api::AdminRedirect;
use crate::cookies::Admin;
use crate::db::PageId;
use crate::util::{checkbox, clean_html, parse_int_field};
use crate::{AppError, AppState, RequestBody};

#[derive(Debug, TryFromMultipart)]
pub struct UpdatePage {
    pub id: String,
    pub content: Option<String>,
    pub is_public: Option<String>,
    pub show_in_menu: Option<String>,
}

impl RequestBody for UpdatePage {
    type Response = AdminRedirect;

    async fn request(
        self,
        state: AppState,
        admin: Option<Admin>,
    ) -> Result<Self::Response, AppError> {
        require_admin(admin)?;
        let id = parse_int_field("id", Some(self.id))?
            .map(PageId)
            .ok_or_else(|| AppError::InvalidForm("id is required".to_string()))?;
        let content = clean_html(self.content.as_deref().unwrap_or_default());
        state
            .update_page(id, &content, checkbox(&self.is_public), checkbox(&self.show_in_menu))
            .await?;
        tracing::info!(page = id.0, "updated page");
        Ok(AdminRedirect("/admin/pages"))
    }
}

#[cfg(test)]
mod tests {
    use sqlx::SqlitePool;

    use super::*;
    use crate::AppResult;
    use crate::db::titles;

    #[sqlx::test]
    async fn hiding_a_page_removes_it_from_the_menu(pool: SqlitePool) -> AppResult {
        let state = AppState::for_tests(pool);
        state.init_page_tree().await?;
        let meetings = state.get_page_by_title(titles::MEETINGS).await?.unwrap();

        UpdatePage {
            id: meetings.id.0.to_string(),
            content: Some("<p>Upcoming</p><script>alert(1)</script>".to_string()),
            is_public: None,
            show_in_menu: Some("on".to_string()),
        }
        .request(state.clone(), Some(Admin))
        .await?;

        let page = state.get_opt_page(meetings.id).await?.unwrap();
        assert_eq!(page.content, "<p>Upcoming</p>");
        assert!(!page.is_public);
        assert!(state.get_public_page(titles::MEETINGS).await?.is_none());
        let menu: Vec<String> = state.get_menu_pages().await?.into_iter().map(|p| p.title).collect();
        assert_eq!(menu, [titles::HOME]);

        let missing = UpdatePage {
            id: "9999".to_string(),
            content: None,
            is_public: None,
            show_in_menu: None,
        }
        .request(state, Some(Admin))
        .await;
        assert!(matches!(missing, Err(AppError::NotFound)));
        Ok(())
    }
}
