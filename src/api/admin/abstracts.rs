use axum::body::Bytes;
use axum_typed_multipart::{FieldData, TryFromMultipart};
use itertools::Itertools;

use super::{parse_ids, require_admin};
use crate::api::AdminRedirect;
use crate::cookies::Admin;
use crate::db::{AbstractData, AbstractId, AbstractListUpdate, AuthorData, MeetingId};
use crate::media::{ABSTRACT_MEDIA_DIR, UploadBatch};
use crate::util::{checkbox, clean_html, is_valid_email, non_blank, parse_int_field, required_field};
use crate::{AppError, AppState, RequestBody};

const ABSTRACTS_URL: &str = "/admin/abstracts";

/// Inline edits of `accepted` and rank from the abstract list. Rows arrive
/// as parallel lists; `accepted` holds the IDs of the checked rows.
#[derive(Debug, TryFromMultipart)]
pub struct UpdateAbstractList {
    pub abstract_id: Vec<String>,
    pub abstract_rank: Vec<String>,
    pub accepted: Vec<String>,
}

impl UpdateAbstractList {
    fn updates(&self) -> Result<Vec<AbstractListUpdate>, AppError> {
        if self.abstract_id.len() != self.abstract_rank.len() {
            return Err(AppError::InvalidForm(
                "abstract fields have different numbers of rows".to_string(),
            ));
        }
        let ids = parse_ids::<AbstractId>("abstract", &self.abstract_id)?;
        let accepted = parse_ids::<AbstractId>("accepted", &self.accepted)?;

        ids.into_iter()
            .zip(&self.abstract_rank)
            .map(|(id, rank)| {
                Ok(AbstractListUpdate {
                    id,
                    accepted: accepted.contains(&id),
                    abstract_rank: parse_int_field("rank", Some(rank.clone()))?,
                })
            })
            .collect()
    }
}

impl RequestBody for UpdateAbstractList {
    type Response = AdminRedirect;

    async fn request(
        self,
        state: AppState,
        admin: Option<Admin>,
    ) -> Result<Self::Response, AppError> {
        require_admin(admin)?;
        let updates = self.updates()?;
        state.update_abstract_list(&updates).await?;
        tracing::info!(count = updates.len(), "updated abstract list");
        Ok(AdminRedirect(ABSTRACTS_URL))
    }
}

/// Abstract edit form with its author rows, saved as one unit.
#[derive(Debug, TryFromMultipart)]
pub struct UpdateAbstract {
    /// Absent for a new abstract.
    pub id: Option<String>,
    pub meeting_id: Option<String>,
    pub contact_email: Option<String>,
    pub presentation_type: Option<String>,
    pub title: Option<String>,
    pub abstract_text: Option<String>,
    pub acknowledgements: Option<String>,
    pub references: Option<String>,
    pub comments: Option<String>,
    pub abstract_rank: Option<String>,
    pub accepted: Option<String>,
    #[form_data(limit = "unlimited")]
    pub abstract_media: Option<FieldData<Bytes>>,
    pub clear_abstract_media: Option<String>,

    pub author_rank: Vec<String>,
    pub author_first_name: Vec<String>,
    pub author_last_name: Vec<String>,
    pub author_name: Vec<String>,
    pub author_department: Vec<String>,
    pub author_institution: Vec<String>,
    pub author_country: Vec<String>,
    pub author_email: Vec<String>,
}

impl UpdateAbstract {
    /// Returns the non-blank author rows, ordered by submitted rank and then
    /// by row order. Rows without a rank go last.
    fn authors(&self) -> Result<Vec<AuthorData>, AppError> {
        let columns = [
            &self.author_rank,
            &self.author_first_name,
            &self.author_last_name,
            &self.author_name,
            &self.author_department,
            &self.author_institution,
            &self.author_country,
            &self.author_email,
        ];
        let row_count = self.author_name.len();
        if columns.iter().any(|c| c.len() != row_count) {
            return Err(AppError::InvalidForm(
                "author fields have different numbers of rows".to_string(),
            ));
        }

        let mut rows = vec![];
        for i in 0..row_count {
            let field = |column: &Vec<String>| non_blank(Some(column[i].clone()));
            let author = AuthorData {
                last_name: field(&self.author_last_name),
                first_name: field(&self.author_first_name),
                name: self.author_name[i].trim().to_string(),
                department: field(&self.author_department),
                institution: field(&self.author_institution),
                country: field(&self.author_country),
                email_address: field(&self.author_email),
            };
            if author == AuthorData::default() {
                continue;
            }
            if author.name.is_empty() {
                return Err(AppError::InvalidForm(format!(
                    "author row {} has no full name",
                    i + 1
                )));
            }
            if let Some(email) = &author.email_address {
                if !is_valid_email(email) {
                    return Err(AppError::InvalidForm(format!(
                        "author row {} has an invalid email address",
                        i + 1
                    )));
                }
            }
            let rank = parse_int_field("author rank", Some(self.author_rank[i].clone()))?;
            rows.push((rank.unwrap_or(i64::MAX), i, author));
        }

        Ok(rows
            .into_iter()
            .sorted_by_key(|(rank, i, _)| (*rank, *i))
            .map(|(_, _, author)| author)
            .collect())
    }
}

impl RequestBody for UpdateAbstract {
    type Response = AdminRedirect;

    async fn request(
        self,
        state: AppState,
        admin: Option<Admin>,
    ) -> Result<Self::Response, AppError> {
        require_admin(admin)?;

        let authors = self.authors()?;
        let id = parse_int_field("id", self.id)?.map(AbstractId);
        let meeting_id = parse_int_field("meeting", self.meeting_id)?
            .map(MeetingId)
            .ok_or_else(|| AppError::InvalidForm("meeting is required".to_string()))?;
        let contact_email = required_field("contact email", self.contact_email)?;
        if !is_valid_email(&contact_email) {
            return Err(AppError::InvalidForm(
                "contact email is not a valid email address".to_string(),
            ));
        }
        let presentation_type = required_field("presentation type", self.presentation_type)?
            .parse()?;
        let title = clean_html(&required_field("title", self.title)?);
        let abstract_text = clean_html(&required_field("abstract text", self.abstract_text)?);
        let abstract_rank = parse_int_field("rank", self.abstract_rank)?;

        let old_media = match id {
            Some(id) => {
                state
                    .get_opt_abstract(id)
                    .await?
                    .ok_or(AppError::NotFound)?
                    .r#abstract
                    .abstract_media
            }
            None => None,
        };
        let mut uploads = UploadBatch::new(&state.config.media_root);
        let abstract_media = match uploads.save(ABSTRACT_MEDIA_DIR, self.abstract_media).await? {
            Some(path) => Some(path),
            None if checkbox(&self.clear_abstract_media) => None,
            None => old_media,
        };

        let data = AbstractData {
            meeting_id,
            contact_email,
            presentation_type,
            title,
            abstract_text,
            acknowledgements: non_blank(self.acknowledgements),
            references: non_blank(self.references),
            comments: non_blank(self.comments),
            abstract_rank,
            abstract_media,
            accepted: checkbox(&self.accepted),
        };

        let result = match id {
            Some(id) => state.update_abstract_with_authors(id, data, authors).await,
            None => state.add_abstract_with_authors(data, authors).await.map(|_| ()),
        };
        uploads.finish(result).await?;
        Ok(AdminRedirect(ABSTRACTS_URL))
    }
}

#[derive(Debug, TryFromMultipart)]
pub struct DeleteAbstract {
    pub id: Vec<String>,
}

impl RequestBody for DeleteAbstract {
    type Response = AdminRedirect;

    async fn request(
        self,
        state: AppState,
        admin: Option<Admin>,
    ) -> Result<Self::Response, AppError> {
        require_admin(admin)?;
        for id in parse_ids::<AbstractId>("id", &self.id)? {
            state.delete_abstract(id).await?;
        }
        Ok(AdminRedirect(ABSTRACTS_URL))
    }
}
