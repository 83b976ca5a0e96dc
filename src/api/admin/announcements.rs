use axum::body::Bytes;
use axum_typed_multipart::{FieldData, TryFromMultipart};
use chrono::Utc;

use super::{parse_ids, require_admin};
use crate::api::AdminRedirect;
use crate::cookies::Admin;
use crate::db::{AnnouncementData, AnnouncementId};
use crate::media::{UPLOAD_DIR, UploadBatch};
use crate::util::{
    checkbox, clean_html, non_blank, parse_date_field, parse_int_field, required_field, tri_state,
};
use crate::{AppError, AppState, RequestBody};

const ANNOUNCEMENTS_URL: &str = "/admin/announcements";

#[derive(Debug, TryFromMultipart)]
pub struct UpdateAnnouncement {
    /// Absent for a new announcement.
    pub id: Option<String>,
    pub title: Option<String>,
    pub short_title: Option<String>,
    pub stub: Option<String>,
    pub body: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub created: Option<String>,
    pub pub_date: Option<String>,
    pub expires: Option<String>,
    /// `""`, `"true"` or `"false"`.
    pub approved: Option<String>,

    #[form_data(limit = "unlimited")]
    pub upload1: Option<FieldData<Bytes>>,
    #[form_data(limit = "unlimited")]
    pub upload2: Option<FieldData<Bytes>>,
    #[form_data(limit = "unlimited")]
    pub upload3: Option<FieldData<Bytes>>,
    pub clear_upload1: Option<String>,
    pub clear_upload2: Option<String>,
    pub clear_upload3: Option<String>,
}

fn check_length(name: &str, value: &str, max: usize) -> Result<(), AppError> {
    if value.chars().count() > max {
        return Err(AppError::InvalidForm(format!(
            "{name} must have at most {max} characters"
        )));
    }
    Ok(())
}

impl UpdateAnnouncement {
    /// Validates the text fields. Uploads are handled separately.
    fn text_fields(&self) -> Result<AnnouncementData, AppError> {
        let today = Utc::now().date_naive();

        let title = required_field("title", self.title.clone())?;
        check_length("title", &title, 200)?;
        let short_title = required_field("short title", self.short_title.clone())?;
        check_length("short title", &short_title, 50)?;
        let stub = clean_html(&required_field("stub", self.stub.clone())?);
        let category = required_field("category", self.category.clone())?;
        check_length("category", &category, 20)?;
        let priority = parse_int_field("priority", self.priority.clone())?
            .ok_or_else(|| AppError::InvalidForm("priority is required".to_string()))?;
        let expires = parse_date_field("expires", self.expires.clone())?
            .ok_or_else(|| AppError::InvalidForm("expires is required".to_string()))?;

        Ok(AnnouncementData {
            title,
            short_title,
            stub,
            body: non_blank(self.body.clone()).map(|b| clean_html(&b)),
            category,
            priority,
            created: parse_date_field("created", self.created.clone())?.unwrap_or(today),
            pub_date: parse_date_field("publication date", self.pub_date.clone())?
                .unwrap_or(today),
            expires,
            approved: tri_state(&self.approved),
            uploads: [None, None, None],
        })
    }
}

impl RequestBody for UpdateAnnouncement {
    type Response = AdminRedirect;

    async fn request(
        self,
        state: AppState,
        admin: Option<Admin>,
    ) -> Result<Self::Response, AppError> {
        require_admin(admin)?;

        let mut data = self.text_fields()?;
        let id = parse_int_field("id", self.id)?.map(AnnouncementId);

        let existing = match id {
            Some(id) => Some(
                state
                    .get_opt_announcement(id)
                    .await?
                    .ok_or(AppError::NotFound)?,
            ),
            None => None,
        };
        let old_uploads = existing
            .map(|a| [a.upload1, a.upload2, a.upload3])
            .unwrap_or_default();

        let slots = [
            (self.upload1, self.clear_upload1),
            (self.upload2, self.clear_upload2),
            (self.upload3, self.clear_upload3),
        ];
        let mut uploads = UploadBatch::new(&state.config.media_root);
        for (i, ((field, clear), old)) in slots.into_iter().zip(old_uploads).enumerate() {
            data.uploads[i] = match uploads.save(UPLOAD_DIR, field).await? {
                Some(path) => Some(path),
                None if checkbox(&clear) => None,
                None => old,
            };
        }

        let result = match id {
            Some(id) => state.update_announcement(id, data).await,
            None => state.add_announcement(data).await.map(|_| ()),
        };
        uploads.finish(result).await?;
        Ok(AdminRedirect(ANNOUNCEMENTS_URL))
    }
}

#[derive(Debug, TryFromMultipart)]
pub struct DeleteAnnouncement {
    pub id: Vec<String>,
}

impl RequestBody for DeleteAnnouncement {
    type Response = AdminRedirect;

    async fn request(
        self,
        state: AppState,
        admin: Option<Admin>,
    ) -> Result<Self::Response, AppError> {
        require_admin(admin)?;
        for id in parse_ids::<AnnouncementId>("id", &self.id)? {
            state.delete_announcement(id).await?;
        }
        Ok(AdminRedirect(ANNOUNCEMENTS_URL))
    }
}
