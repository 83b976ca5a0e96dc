use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;

use crate::AppState;

/// Fallback route handler that returns a 404 error.
#[axum::debug_handler]
pub async fn handler_query(State(state): State<AppState>, jar: CookieJar) -> Response {
    let (admin, headers) = crate::cookies::process_cookies(&state, &jar);
    (
        axum::http::StatusCode::NOT_FOUND,
        headers,
        crate::render_html_template("404.html", &admin, serde_json::json!({ "error_msg": "" })),
    )
        .into_response()
}
