use axum::extract::{Path, Query, State};
use axum::http::Uri;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use axum_typed_multipart::{TryFromMultipart, TypedMultipart};
use serde::de::DeserializeOwned;

use crate::AppState;
use crate::cookies::Admin;
use crate::error::AppError;

/// Object with a page on the site.
pub trait Linkable {
    /// Returns the relative URL. Example: `/meetings/2016/`
    fn relative_url(&self) -> String;

    /// Returns the absolute URL. Example: `https://www.paleoanthro.org/meetings/2016/`
    fn absolute_url(&self) -> String {
        crate::env::DOMAIN_NAME.clone() + &self.relative_url()
    }
}

/// Object that can be received as a request.
pub trait RequestBody {
    type Response;

    async fn request(self, state: AppState, admin: Option<Admin>)
    -> Result<Self::Response, AppError>;

    async fn as_handler_query(
        State(state): State<AppState>,
        uri: Uri,
        jar: CookieJar,
        Query(item): Query<Self>,
    ) -> Result<Response, AppError>
    where
        Self: Sized + DeserializeOwned,
        Self::Response: IntoResponse,
    {
        let (admin, headers) = crate::cookies::process_cookies(&state, &jar);
        let response = redirect_if_not_logged_in(&uri, item.request(state, admin).await)?;
        Ok((headers, response).into_response())
    }

    async fn as_handler_path(
        State(state): State<AppState>,
        uri: Uri,
        jar: CookieJar,
        Path(item): Path<Self>,
    ) -> Result<Response, AppError>
    where
        Self: Sized + DeserializeOwned + Send,
        Self::Response: IntoResponse,
    {
        let (admin, headers) = crate::cookies::process_cookies(&state, &jar);
        let response = redirect_if_not_logged_in(&uri, item.request(state, admin).await)?;
        Ok((headers, response).into_response())
    }

    async fn as_multipart_form_handler(
        State(state): State<AppState>,
        uri: Uri,
        jar: CookieJar,
        TypedMultipart(item): TypedMultipart<Self>,
    ) -> Result<Response, AppError>
    where
        Self: TryFromMultipart,
        Self::Response: IntoResponse,
    {
        let (admin, headers) = crate::cookies::process_cookies(&state, &jar);
        let response = redirect_if_not_logged_in(&uri, item.request(state, admin).await)?;
        Ok((headers, response).into_response())
    }
}

/// Turns [`AppError::NotLoggedIn`] into a redirect to the admin sign-in page
/// that comes back to `uri` afterwards.
fn redirect_if_not_logged_in<T: IntoResponse>(
    uri: &Uri,
    response: Result<T, AppError>,
) -> Result<Response, AppError> {
    match response {
        Err(AppError::NotLoggedIn) => {
            let mut login_redirect =
                url::Url::parse("https://example.com/admin/sign-in").expect("valid url"); // the url crate cannot handle relative urls
            if let Some(path_and_query) = uri.path_and_query() {
                login_redirect
                    .query_pairs_mut()
                    .append_pair("redirect", path_and_query.as_str());
            }

            Ok(Redirect::to(&format!(
                "{}?{}",
                login_redirect.path(),
                login_redirect.query().unwrap_or("")
            ))
            .into_response())
        }
        other => other.map(IntoResponse::into_response),
    }
}
