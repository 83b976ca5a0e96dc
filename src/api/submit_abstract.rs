use axum::response::{IntoResponse, Redirect, Response};
use axum_typed_multipart::TryFromMultipart;
use chrono::{Datelike, Utc};

use crate::cookies::Admin;
use crate::db::{AbstractData, AuthorData, Meeting, MeetingId, PresentationType};
use crate::env::SiteConfig;
use crate::html::forms::submit_abstract::{AbstractForm, AuthorRow, render_abstract_form};
use crate::util::{clean_html, is_valid_email, non_blank, strip_html};
use crate::{AppError, AppState, RequestBody};

pub const THANKS_URL: &str = "/meetings/abstract/thanks/";

const MAX_TITLE_CHARS: usize = 200;
const MAX_NAME_CHARS: usize = 200;
const MAX_CONTACT_EMAIL_CHARS: usize = 128;

const EMAIL_MISMATCH: &str = "The contact email does not match the confirmation email.";
const BAD_ACCESS_CODE: &str =
    "Please verify that you have correctly entered the code printed on the call for papers.";
const FORM_ERROR: &str = "There was an error with the form. Please correct it and try again.";
const AUTHOR_ERROR: &str = "There was an error with the author portion of the form. Please correct it and try again.";

/// Abstract submission form. Author rows arrive as parallel lists, one entry
/// per row.
#[derive(Debug, Default, TryFromMultipart)]
pub struct AbstractSubmission {
    pub meeting_id: Option<String>,
    pub presentation_type: Option<String>,
    pub title: Option<String>,
    pub abstract_text: Option<String>,
    pub acknowledgements: Option<String>,
    pub references: Option<String>,
    pub comments: Option<String>,
    pub contact_email: Option<String>,
    pub confirm_email: Option<String>,
    /// Access code.
    pub pcode: Option<String>,

    pub author_first_name: Vec<String>,
    pub author_last_name: Vec<String>,
    pub author_name: Vec<String>,
    pub author_department: Vec<String>,
    pub author_institution: Vec<String>,
    pub author_country: Vec<String>,
    pub author_email: Vec<String>,

    /// Set by the "add more authors" button.
    pub add_authors: Option<String>,
}

/// Result of processing one submission.
#[derive(Debug)]
pub enum Submission {
    /// Show the form again with more author rows. Nothing is validated.
    Expanded(AbstractForm),
    /// Show the form again with errors.
    Rejected(AbstractForm),
    Accepted {
        data: AbstractData,
        authors: Vec<AuthorData>,
    },
}

impl AbstractSubmission {
    /// Zips the author columns into rows.
    fn author_rows(&self) -> Result<Vec<AuthorRow>, AppError> {
        let columns = [
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

        Ok((0..row_count)
            .map(|i| AuthorRow {
                first_name: self.author_first_name[i].clone(),
                last_name: self.author_last_name[i].clone(),
                name: self.author_name[i].clone(),
                department: self.author_department[i].clone(),
                institution: self.author_institution[i].clone(),
                country: self.author_country[i].clone(),
                email_address: self.author_email[i].clone(),
                errors: vec![],
            })
            .collect())
    }

    /// Returns the form as submitted, without errors.
    fn to_form(&self, authors: Vec<AuthorRow>) -> AbstractForm {
        let text = |s: &Option<String>| s.clone().unwrap_or_default();
        AbstractForm {
            meeting_id: text(&self.meeting_id),
            presentation_type: text(&self.presentation_type),
            title: text(&self.title),
            abstract_text: text(&self.abstract_text),
            acknowledgements: text(&self.acknowledgements),
            references: text(&self.references),
            comments: text(&self.comments),
            contact_email: text(&self.contact_email),
            confirm_email: text(&self.confirm_email),
            authors,
            ..Default::default()
        }
    }

    /// Validates the submission against the meetings that are open for
    /// abstracts.
    ///
    /// Returns an error only if the request is malformed. Problems the user
    /// can fix are reported in [`Submission::Rejected`].
    pub fn process(
        self,
        config: &SiteConfig,
        open_meetings: &[Meeting],
    ) -> Result<Submission, AppError> {
        let author_rows = self.author_rows()?;
        let mut form = self.to_form(author_rows);

        if self.add_authors.is_some() {
            form.add_author_rows();
            return Ok(Submission::Expanded(form));
        }

        let errors = &mut form.errors;

        // Contact email
        let contact_email = non_blank(self.contact_email.clone()).unwrap_or_default();
        let confirm_email = non_blank(self.confirm_email.clone()).unwrap_or_default();
        let emails_match = contact_email == confirm_email;
        if !emails_match {
            errors.contact_email.push(EMAIL_MISMATCH.to_string());
            errors.confirm_email.push(EMAIL_MISMATCH.to_string());
        }
        if contact_email.is_empty() {
            errors.contact_email.push("This field is required.".to_string());
        } else if !is_valid_email(&contact_email) {
            errors.contact_email.push("Enter a valid email address.".to_string());
        } else if contact_email.chars().count() > MAX_CONTACT_EMAIL_CHARS {
            errors.contact_email.push(format!(
                "Ensure this value has at most {MAX_CONTACT_EMAIL_CHARS} characters."
            ));
        }

        // Access code
        let code_ok = config.accepts_access_code(self.pcode.as_deref().unwrap_or_default());
        if !code_ok {
            errors.pcode.push(BAD_ACCESS_CODE.to_string());
        }

        // Meeting
        let meeting = non_blank(self.meeting_id.clone())
            .and_then(|id| id.parse::<i64>().ok())
            .and_then(|id| open_meetings.iter().find(|m| m.id == MeetingId(id)));
        if meeting.is_none() {
            errors
                .meeting_id
                .push("Select a meeting that is open for abstracts.".to_string());
        }

        // Presentation type
        let presentation_type = self
            .presentation_type
            .as_deref()
            .and_then(|t| t.parse::<PresentationType>().ok());
        if presentation_type.is_none() {
            errors
                .presentation_type
                .push("Select a valid presentation type.".to_string());
        }

        // Rich text
        let title = clean_html(self.title.as_deref().unwrap_or_default());
        if strip_html(&title).is_empty() {
            errors.title.push("This field is required.".to_string());
        } else if title.chars().count() > MAX_TITLE_CHARS {
            errors.title.push(format!(
                "Ensure this value has at most {MAX_TITLE_CHARS} characters."
            ));
        }
        let abstract_text = clean_html(self.abstract_text.as_deref().unwrap_or_default());
        if strip_html(&abstract_text).is_empty() {
            errors.abstract_text.push("This field is required.".to_string());
        }

        // Authors
        let mut authors = vec![];
        for row in form.authors.iter_mut().filter(|row| !row.is_blank()) {
            let name = row.name.trim();
            if name.is_empty() {
                row.errors.push("Full name is required.".to_string());
            } else if name.chars().count() > MAX_NAME_CHARS {
                row.errors.push(format!(
                    "Full name must have at most {MAX_NAME_CHARS} characters."
                ));
            }
            let email_address = row.email_address.trim();
            if !email_address.is_empty() && !is_valid_email(email_address) {
                row.errors.push("Enter a valid email address.".to_string());
            }

            authors.push(AuthorData {
                last_name: non_blank(Some(row.last_name.clone())),
                first_name: non_blank(Some(row.first_name.clone())),
                name: name.to_string(),
                department: non_blank(Some(row.department.clone())),
                institution: non_blank(Some(row.institution.clone())),
                country: non_blank(Some(row.country.clone())),
                email_address: non_blank(Some(row.email_address.clone())),
            });
        }
        let author_rows_ok = form.authors.iter().all(|row| row.errors.is_empty());
        if authors.is_empty() {
            form.errors
                .authors
                .push("At least one author is required.".to_string());
        }

        let (Some(meeting), Some(presentation_type), true, true) = (
            meeting,
            presentation_type,
            form.errors.is_empty(),
            author_rows_ok,
        ) else {
            form.error_message = Some(
                if !emails_match {
                    EMAIL_MISMATCH
                } else if !code_ok {
                    BAD_ACCESS_CODE
                } else if form.errors.is_empty() || !form.errors.authors.is_empty() {
                    AUTHOR_ERROR
                } else {
                    FORM_ERROR
                }
                .to_string(),
            );
            return Ok(Submission::Rejected(form));
        };

        Ok(Submission::Accepted {
            data: AbstractData {
                meeting_id: meeting.id,
                contact_email,
                presentation_type,
                title,
                abstract_text,
                acknowledgements: non_blank(self.acknowledgements),
                references: non_blank(self.references),
                comments: non_blank(self.comments),
                abstract_rank: None,
                abstract_media: None,
                accepted: false,
            },
            authors,
        })
    }
}

impl RequestBody for AbstractSubmission {
    type Response = Response;

    async fn request(
        self,
        state: AppState,
        admin: Option<Admin>,
    ) -> Result<Self::Response, AppError> {
        let current_year = i64::from(Utc::now().year());
        let open_meetings = state.get_open_meetings(current_year).await?;

        match self.process(&state.config, &open_meetings)? {
            Submission::Expanded(form) => render_abstract_form(&state, &admin, form).await,
            Submission::Rejected(form) => {
                tracing::debug!(?form.errors, "abstract submission rejected");
                render_abstract_form(&state, &admin, form).await
            }
            Submission::Accepted { data, authors } => {
                let id = state.add_abstract_with_authors(data, authors).await?;
                if let Some(submitted) = state.get_opt_abstract(id).await? {
                    tokio::spawn(async move {
                        crate::email::notify_abstract_submitted(&state, &submitted).await;
                    });
                }
                Ok(Redirect::to(THANKS_URL).into_response())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use sqlx::SqlitePool;

    use super::*;
    use crate::AppResult;
    use crate::db::AbstractFilter;
    use crate::db::meeting::tests::meeting_data;

    fn meeting(id: i64, year: i64) -> Meeting {
        Meeting {
            id: MeetingId(id),
            title: format!("Meeting {year}"),
            year,
            start_date: None,
            end_date: None,
            associated_with: None,
            location: None,
            description: None,
            program_pdf: None,
            abstracts_pdf: None,
            page_id: None,
        }
    }

    fn authors(rows: &[[&str; 7]]) -> AbstractSubmission {
        let column = |i: usize| rows.iter().map(|r| r[i].to_string()).collect();
        AbstractSubmission {
            author_first_name: column(0),
            author_last_name: column(1),
            author_name: column(2),
            author_department: column(3),
            author_institution: column(4),
            author_country: column(5),
            author_email: column(6),
            ..Default::default()
        }
    }

    pub(crate) fn valid_submission(meeting_id: MeetingId) -> AbstractSubmission {
        AbstractSubmission {
            meeting_id: Some(meeting_id.0.to_string()),
            presentation_type: Some("Poster".to_string()),
            title: Some("<p>Silly Walks of the Neanderthals</p>".to_string()),
            abstract_text: Some("<p>Test abstract text</p>".to_string()),
            acknowledgements: Some("Test acknowledgements".to_string()),
            contact_email: Some("denne.reed@gmail.com".to_string()),
            confirm_email: Some("denne.reed@gmail.com".to_string()),
            pcode: Some("PR432".to_string()),
            ..authors(&[
                ["Ima", "Fake", "Ima Fake", "", "Chaos University", "", "ima@example.com"],
                ["", "", "", "", "", "", ""],
                ["Bob", "Reed", "Bob Reed", "Anthropology", "", "US", ""],
            ])
        }
    }

    fn rejected(submission: AbstractSubmission) -> AbstractForm {
        let config = SiteConfig::for_tests();
        match submission.process(&config, &[meeting(1, 2016)]).unwrap() {
            Submission::Rejected(form) => form,
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn valid_submission_drops_blank_rows() {
        let config = SiteConfig::for_tests();
        let Submission::Accepted { data, authors } = valid_submission(MeetingId(1))
            .process(&config, &[meeting(1, 2016)])
            .unwrap()
        else {
            panic!("expected acceptance");
        };

        assert_eq!(data.meeting_id, MeetingId(1));
        assert_eq!(data.presentation_type, PresentationType::Poster);
        assert_eq!(data.title, "<p>Silly Walks of the Neanderthals</p>");
        assert!(!data.accepted);
        let names: Vec<&str> = authors.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["Ima Fake", "Bob Reed"]);
        assert_eq!(authors[1].department.as_deref(), Some("Anthropology"));
        assert_eq!(authors[1].email_address, None);
    }

    #[test]
    fn email_mismatch_is_reported_on_both_fields() {
        let form = rejected(AbstractSubmission {
            confirm_email: Some("denne@example.com".to_string()),
            ..valid_submission(MeetingId(1))
        });

        assert_eq!(form.errors.contact_email, [EMAIL_MISMATCH]);
        assert_eq!(form.errors.confirm_email, [EMAIL_MISMATCH]);
        assert_eq!(form.error_message.as_deref(), Some(EMAIL_MISMATCH));

        // input is preserved
        assert_eq!(form.confirm_email, "denne@example.com");
        assert_eq!(form.title, "<p>Silly Walks of the Neanderthals</p>");
        assert_eq!(form.authors.len(), 3);
        assert_eq!(form.authors[2].name, "Bob Reed");
    }

    #[test]
    fn access_code_must_match_exactly() {
        for code in [None, Some(""), Some("Pr432"), Some("PR4321")] {
            let form = rejected(AbstractSubmission {
                pcode: code.map(str::to_owned),
                ..valid_submission(MeetingId(1))
            });
            assert_eq!(form.errors.pcode, [BAD_ACCESS_CODE]);
            assert_eq!(form.error_message.as_deref(), Some(BAD_ACCESS_CODE));
        }
    }

    #[test]
    fn required_fields() {
        let form = rejected(AbstractSubmission {
            meeting_id: None,
            presentation_type: Some("Talk".to_string()),
            title: Some("<script>alert(1)</script>".to_string()),
            abstract_text: None,
            ..valid_submission(MeetingId(1))
        });
        assert_eq!(form.errors.meeting_id.len(), 1);
        assert_eq!(form.errors.presentation_type.len(), 1);
        assert_eq!(form.errors.title.len(), 1);
        assert_eq!(form.errors.abstract_text.len(), 1);
        assert_eq!(form.error_message.as_deref(), Some(FORM_ERROR));

        // markup with no text counts as empty
        for empty in ["<p></p>", "<p> </p>", "<b></b>"] {
            let form = rejected(AbstractSubmission {
                title: Some(empty.to_string()),
                abstract_text: Some(empty.to_string()),
                ..valid_submission(MeetingId(1))
            });
            assert_eq!(form.errors.title.len(), 1, "{empty}");
            assert_eq!(form.errors.abstract_text.len(), 1, "{empty}");
        }
    }

    #[test]
    fn closed_meeting_is_rejected() {
        let form = rejected(valid_submission(MeetingId(2)));
        assert_eq!(form.errors.meeting_id.len(), 1);
    }

    #[test]
    fn author_rows_are_validated() {
        let form = rejected(
            authors(&[
                ["Ima", "Fake", "", "", "", "", ""],
                ["", "", "Bob Reed", "", "", "", "not-an-email"],
            ])
            .with_abstract(valid_submission(MeetingId(1))),
        );
        assert_eq!(form.authors[0].errors.len(), 1);
        assert_eq!(form.authors[1].errors.len(), 1);
        assert_eq!(form.error_message.as_deref(), Some(AUTHOR_ERROR));

        let form = rejected(
            authors(&[["", "", "", "", "", "", ""]]).with_abstract(valid_submission(MeetingId(1))),
        );
        assert_eq!(form.errors.authors.len(), 1);
        assert_eq!(form.error_message.as_deref(), Some(AUTHOR_ERROR));
    }

    #[test]
    fn ragged_author_columns_are_malformed() {
        let mut submission = valid_submission(MeetingId(1));
        submission.author_email.pop();
        let result = submission.process(&SiteConfig::for_tests(), &[meeting(1, 2016)]);
        assert!(matches!(result, Err(AppError::InvalidForm(_))));
    }

    #[test]
    fn add_authors_adds_three_rows_without_validating() {
        let config = SiteConfig::for_tests();
        let submission = AbstractSubmission {
            add_authors: Some("Add more authors".to_string()),
            pcode: None,
            ..valid_submission(MeetingId(1))
        };
        let Submission::Expanded(form) = submission.process(&config, &[]).unwrap() else {
            panic!("expected expanded form");
        };
        assert_eq!(form.authors.len(), 6);
        assert_eq!(form.authors[0].name, "Ima Fake");
        assert!(form.authors[3..].iter().all(AuthorRow::is_blank));
        assert!(form.errors.is_empty());
        assert_eq!(form.error_message, None);
    }

    impl AbstractSubmission {
        /// Takes the author columns from `self` and everything else from
        /// `other`.
        fn with_abstract(self, other: AbstractSubmission) -> AbstractSubmission {
            AbstractSubmission {
                author_first_name: self.author_first_name,
                author_last_name: self.author_last_name,
                author_name: self.author_name,
                author_department: self.author_department,
                author_institution: self.author_institution,
                author_country: self.author_country,
                author_email: self.author_email,
                ..other
            }
        }
    }

    #[sqlx::test]
    async fn accepted_submission_is_saved_with_ranked_authors(pool: SqlitePool) -> AppResult {
        let state = AppState::for_tests(pool);
        let year = i64::from(Utc::now().year());
        let meeting_id = state
            .add_meeting(meeting_data(year, "This year", "Atlanta"))
            .await?;

        let response = valid_submission(meeting_id)
            .request(state.clone(), None)
            .await?;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], THANKS_URL);

        let saved = state.search_abstracts(&AbstractFilter::default()).await?;
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].year, year);
        let authors = state.get_authors(saved[0].id).await?;
        let ranks: Vec<(i64, &str)> = authors
            .iter()
            .map(|a| (a.author_rank, a.name.as_str()))
            .collect();
        assert_eq!(ranks, [(1, "Ima Fake"), (2, "Bob Reed")]);
        Ok(())
    }

    #[sqlx::test]
    async fn rejected_and_expanded_submissions_save_nothing(pool: SqlitePool) -> AppResult {
        let state = AppState::for_tests(pool);
        let year = i64::from(Utc::now().year());
        let meeting_id = state
            .add_meeting(meeting_data(year, "This year", "Atlanta"))
            .await?;

        let mismatch = AbstractSubmission {
            confirm_email: Some("someone@else.org".to_string()),
            ..valid_submission(meeting_id)
        };
        let response = mismatch.request(state.clone(), None).await?;
        assert_eq!(response.status(), StatusCode::OK);

        let expand = AbstractSubmission {
            add_authors: Some("1".to_string()),
            ..valid_submission(meeting_id)
        };
        let response = expand.request(state.clone(), None).await?;
        assert_eq!(response.status(), StatusCode::OK);

        assert!(state.search_abstracts(&AbstractFilter::default()).await?.is_empty());
        Ok(())
    }

    #[sqlx::test]
    async fn past_meetings_are_closed(pool: SqlitePool) -> AppResult {
        let state = AppState::for_tests(pool);
        let meeting_id = state
            .add_meeting(meeting_data(2014, "Calgary 2014", "Calgary"))
            .await?;

        let response = valid_submission(meeting_id).request(state.clone(), None).await?;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(state.search_abstracts(&AbstractFilter::default()).await?.is_empty());
        Ok(())
    }
}
