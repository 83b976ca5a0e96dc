use axum::body::Bytes;
use axum_typed_multipart::{FieldData, TryFromMultipart};

use super::{parse_ids, require_admin};
use crate::api::AdminRedirect;
use crate::cookies::Admin;
use crate::db::{MeetingData, MeetingId};
use crate::media::{UPLOAD_DIR, UploadBatch};
use crate::util::{checkbox, non_blank, parse_date_field, parse_int_field, required_field};
use crate::{AppError, AppState, RequestBody};

const MEETINGS_URL: &str = "/admin/meetings";

#[derive(Debug, TryFromMultipart)]
pub struct UpdateMeeting {
    /// Absent for a new meeting.
    pub id: Option<String>,
    pub title: Option<String>,
    pub year: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub associated_with: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,

    #[form_data(limit = "unlimited")]
    pub program_pdf: Option<FieldData<Bytes>>,
    #[form_data(limit = "unlimited")]
    pub abstracts_pdf: Option<FieldData<Bytes>>,
    pub clear_program_pdf: Option<String>,
    pub clear_abstracts_pdf: Option<String>,
}

impl RequestBody for UpdateMeeting {
    type Response = AdminRedirect;

    async fn request(
        self,
        state: AppState,
        admin: Option<Admin>,
    ) -> Result<Self::Response, AppError> {
        require_admin(admin)?;

        let title = required_field("title", self.title)?;
        if title.chars().count() > 200 {
            return Err(AppError::InvalidForm(
                "title must have at most 200 characters".to_string(),
            ));
        }
        let year = parse_int_field("year", self.year)?
            .ok_or_else(|| AppError::InvalidForm("year is required".to_string()))?;
        let id = parse_int_field("id", self.id)?.map(MeetingId);

        let start_date = parse_date_field("start date", self.start_date)?;
        let end_date = parse_date_field("end date", self.end_date)?;

        let (old_program, old_abstracts) = match id {
            Some(id) => {
                let m = state.get_opt_meeting(id).await?.ok_or(AppError::NotFound)?;
                (m.program_pdf, m.abstracts_pdf)
            }
            None => (None, None),
        };
        let mut uploads = UploadBatch::new(&state.config.media_root);
        let program_pdf = match uploads.save(UPLOAD_DIR, self.program_pdf).await? {
            Some(path) => Some(path),
            None if checkbox(&self.clear_program_pdf) => None,
            None => old_program,
        };
        let abstracts_pdf = match uploads.save(UPLOAD_DIR, self.abstracts_pdf).await? {
            Some(path) => Some(path),
            None if checkbox(&self.clear_abstracts_pdf) => None,
            None => old_abstracts,
        };

        let data = MeetingData {
            title,
            year,
            start_date,
            end_date,
            associated_with: non_blank(self.associated_with),
            location: non_blank(self.location),
            description: non_blank(self.description),
            program_pdf,
            abstracts_pdf,
        };

        let result = match id {
            Some(id) => state.update_meeting(id, data).await,
            None => state.add_meeting(data).await.map(|_| ()),
        };
        uploads.finish(result).await?;
        Ok(AdminRedirect(MEETINGS_URL))
    }
}

#[derive(Debug, TryFromMultipart)]
pub struct DeleteMeeting {
    pub id: Vec<String>,
}

impl RequestBody for DeleteMeeting {
    type Response = AdminRedirect;

    async fn request(
        self,
        state: AppState,
        admin: Option<Admin>,
    ) -> Result<Self::Response, AppError> {
        require_admin(admin)?;
        for id in parse_ids::<MeetingId>("id", &self.id)? {
            state.delete_meeting(id).await?;
        }
        Ok(AdminRedirect(MEETINGS_URL))
    }
}

/// Creates the CMS page of each selected meeting.
#[derive(Debug, TryFromMultipart)]
pub struct CreateMeetingPage {
    pub id: Vec<String>,
}

impl RequestBody for CreateMeetingPage {
    type Response = AdminRedirect;

    async fn request(
        self,
        state: AppState,
        admin: Option<Admin>,
    ) -> Result<Self::Response, AppError> {
        require_admin(admin)?;
        for id in parse_ids::<MeetingId>("id", &self.id)? {
            state.create_meeting_page(id).await?;
        }
        Ok(AdminRedirect(MEETINGS_URL))
    }
}
