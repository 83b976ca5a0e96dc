use axum::response::{IntoResponse, Redirect, Response};

pub mod admin;
pub mod submit_abstract;

/// Redirect back to an admin list after a successful update.
#[must_use]
#[derive(Debug)]
pub struct AdminRedirect(pub &'static str);

impl IntoResponse for AdminRedirect {
    fn into_response(self) -> Response {
        Redirect::to(self.0).into_response()
    }
}
