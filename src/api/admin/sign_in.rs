use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use axum_typed_multipart::TryFromMultipart;

use crate::cookies::{APPEND_EXPIRED_TOKEN, Admin, admin_cookie};
use crate::{AppError, AppState, RequestBody};

pub const ADMIN_INDEX_URL: &str = "/admin/";

/// Returns `redirect` if it is a path on this site, or the admin index.
pub fn safe_redirect(redirect: Option<&str>) -> String {
    match redirect {
        Some(r) if r.starts_with('/') && !r.starts_with("//") && !r.contains('\\') => r.to_string(),
        _ => ADMIN_INDEX_URL.to_string(),
    }
}

#[derive(Debug, TryFromMultipart)]
pub struct SignInRequest {
    pub token: String,
    pub redirect: Option<String>,
}

pub enum SignInResponse {
    SignedIn { token: String, redirect: String },
    Rejected { redirect: String },
}

impl RequestBody for SignInRequest {
    type Response = SignInResponse;

    async fn request(
        self,
        state: AppState,
        _admin: Option<Admin>,
    ) -> Result<Self::Response, AppError> {
        let redirect = safe_redirect(self.redirect.as_deref());
        let token = self.token.trim();
        if state.config.accepts_admin_token(token) {
            tracing::info!("admin signed in");
            Ok(SignInResponse::SignedIn {
                token: token.to_string(),
                redirect,
            })
        } else {
            tracing::warn!("rejected admin sign-in");
            Ok(SignInResponse::Rejected { redirect })
        }
    }
}

impl IntoResponse for SignInResponse {
    fn into_response(self) -> Response {
        match self {
            SignInResponse::SignedIn { token, redirect } => {
                let jar = CookieJar::new().add(admin_cookie(token));
                (jar, Redirect::to(&redirect)).into_response()
            }
            SignInResponse::Rejected { redirect } => (
                StatusCode::UNAUTHORIZED,
                crate::render_html_template(
                    "admin-sign-in.html",
                    &None,
                    serde_json::json!({
                        "redirect": redirect,
                        "error_msg": "Incorrect admin token.",
                    }),
                ),
            )
                .into_response(),
        }
    }
}

#[derive(serde::Deserialize)]
pub struct SignOutPage {}

impl RequestBody for SignOutPage {
    type Response = Response;

    async fn request(
        self,
        _state: AppState,
        _admin: Option<Admin>,
    ) -> Result<Self::Response, AppError> {
        Ok((APPEND_EXPIRED_TOKEN, Redirect::to("/home/")).into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirects_stay_on_site() {
        assert_eq!(safe_redirect(Some("/admin/abstracts?year=2016")), "/admin/abstracts?year=2016");
        assert_eq!(safe_redirect(Some("//evil.example.com/")), ADMIN_INDEX_URL);
        assert_eq!(safe_redirect(Some("https://evil.example.com/")), ADMIN_INDEX_URL);
        assert_eq!(safe_redirect(None), ADMIN_INDEX_URL);
    }
}
