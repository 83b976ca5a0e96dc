use axum_typed_multipart::TryFromMultipart;

use super::require_admin;
use crate::api::AdminRedirect;
use crate::cookies::Admin;
use crate::db::ProfileData;
use crate::util::{checkbox, is_valid_email, non_blank, required_field};
use crate::{AppError, AppState, RequestBody};

/// Creates or updates the profile of the identity with this email.
#[derive(Debug, TryFromMultipart)]
pub struct UpdateProfile {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub institution: Option<String>,
    pub department: Option<String>,
    pub send_emails: Option<String>,
}

impl RequestBody for UpdateProfile {
    type Response = AdminRedirect;

    async fn request(
        self,
        state: AppState,
        admin: Option<Admin>,
    ) -> Result<Self::Response, AppError> {
        require_admin(admin)?;
        let email = required_field("email", self.email)?;
        if !is_valid_email(&email) {
            return Err(AppError::InvalidForm(
                "email is not a valid email address".to_string(),
            ));
        }
        state
            .upsert_profile(ProfileData {
                email,
                first_name: non_blank(self.first_name).unwrap_or_default(),
                last_name: non_blank(self.last_name).unwrap_or_default(),
                institution: non_blank(self.institution),
                department: non_blank(self.department),
                send_emails: checkbox(&self.send_emails),
            })
            .await?;
        Ok(AdminRedirect("/admin/profiles"))
    }
}

#[cfg(test)]
mod tests {
    use sqlx::SqlitePool;

    use super::*;
    use crate::AppResult;

    fn form(email: &str) -> UpdateProfile {
        UpdateProfile {
            email: Some(email.to_string()),
            first_name: Some("Denne".to_string()),
            last_name: Some("Reed".to_string()),
            institution: Some("Chaos University".to_string()),
            department: None,
            send_emails: Some("on".to_string()),
        }
    }

    #[sqlx::test]
    async fn creates_identity_for_new_email(pool: SqlitePool) -> AppResult {
        let state = AppState::for_tests(pool);
        form("denne.reed@gmail.com").request(state.clone(), Some(Admin)).await?;

        let user = state.get_user_from_email("denne.reed@gmail.com").await?.unwrap();
        let profile = state.get_profile(user.id).await?.unwrap();
        assert!(profile.send_emails);
        assert_eq!(profile.institution.as_deref(), Some("Chaos University"));

        let result = form("not an email").request(state.clone(), Some(Admin)).await;
        assert!(matches!(result, Err(AppError::InvalidForm(_))));
        let result = form("denne.reed@gmail.com").request(state, None).await;
        assert!(matches!(result, Err(AppError::NotLoggedIn)));
        Ok(())
    }
}
