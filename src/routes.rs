use axum::response::Redirect;

use crate::traits::RequestBody;
use crate::{AppState, api, html};

pub(crate) fn router() -> axum::Router<AppState> {
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/", get(|| async { Redirect::permanent("/home/") }))
        // Public pages
        .route("/home/", get(html::home::HomePage::as_handler_query))
        .route(
            "/home/detail/{id}/",
            get(html::home::AnnouncementDetailPage::as_handler_path),
        )
        .route("/home/join/", get(html::home::JoinPage::as_handler_query))
        .route(
            "/meetings/",
            get(html::meetings::MeetingsPage::as_handler_query),
        )
        .route(
            "/meetings/{year}/",
            get(html::meetings::MeetingDetailPage::as_handler_path),
        )
        .route(
            "/meetings/abstract/add/",
            get(html::forms::submit_abstract::SubmitAbstractPage::as_handler_query)
                .post(api::submit_abstract::AbstractSubmission::as_multipart_form_handler),
        )
        .route(
            "/meetings/abstract/thanks/",
            get(html::meetings::ThanksPage::as_handler_query),
        )
        // Admin authentication
        .route(
            "/admin/sign-in",
            get(html::admin::SignInPage::as_handler_query)
                .post(api::admin::sign_in::SignInRequest::as_multipart_form_handler),
        )
        .route(
            "/admin/sign-out",
            get(api::admin::sign_in::SignOutPage::as_handler_query),
        )
        .route("/admin/", get(html::admin::AdminIndexPage::as_handler_query))
        // Announcements
        .route(
            "/admin/announcements",
            get(html::admin::announcements::AnnouncementsPage::as_handler_query),
        )
        .route(
            "/admin/announcement",
            get(html::admin::announcements::AnnouncementPage::as_handler_query),
        )
        .route(
            "/admin/update-announcement",
            post(api::admin::announcements::UpdateAnnouncement::as_multipart_form_handler),
        )
        .route(
            "/admin/delete-announcement",
            post(api::admin::announcements::DeleteAnnouncement::as_multipart_form_handler),
        )
        // Meetings
        .route(
            "/admin/meetings",
            get(html::admin::meetings::MeetingsPage::as_handler_query),
        )
        .route(
            "/admin/meeting",
            get(html::admin::meetings::MeetingPage::as_handler_query),
        )
        .route(
            "/admin/update-meeting",
            post(api::admin::meetings::UpdateMeeting::as_multipart_form_handler),
        )
        .route(
            "/admin/delete-meeting",
            post(api::admin::meetings::DeleteMeeting::as_multipart_form_handler),
        )
        .route(
            "/admin/create-meeting-page",
            post(api::admin::meetings::CreateMeetingPage::as_multipart_form_handler),
        )
        // Abstracts
        .route(
            "/admin/abstracts",
            get(html::admin::abstracts::AbstractsPage::as_handler_query),
        )
        .route(
            "/admin/update-abstract-list",
            post(api::admin::abstracts::UpdateAbstractList::as_multipart_form_handler),
        )
        .route(
            "/admin/abstract",
            get(html::admin::abstracts::AbstractPage::as_handler_query),
        )
        .route(
            "/admin/update-abstract",
            post(api::admin::abstracts::UpdateAbstract::as_multipart_form_handler),
        )
        .route(
            "/admin/delete-abstract",
            post(api::admin::abstracts::DeleteAbstract::as_multipart_form_handler),
        )
        .route(
            "/admin/abstract-action",
            post(api::admin::export::AbstractAction::as_multipart_form_handler),
        )
        .route(
            "/admin/authors",
            get(html::admin::abstracts::AuthorsPage::as_handler_query),
        )
        // Pages and profiles
        .route(
            "/admin/pages",
            get(html::admin::pages::PagesPage::as_handler_query),
        )
        .route(
            "/admin/update-page",
            post(api::admin::pages::UpdatePage::as_multipart_form_handler),
        )
        .route(
            "/admin/profiles",
            get(html::admin::profiles::ProfilesPage::as_handler_query),
        )
        .route(
            "/admin/update-profile",
            post(api::admin::profiles::UpdateProfile::as_multipart_form_handler),
        )
        .fallback(html::not_found::handler_query)
}
