use axum::response::Response;
use chrono::{Datelike, Utc};
use serde::Serialize;

use crate::cookies::Admin;
use crate::db::{PresentationType, titles};
use crate::html::with_page;
use crate::{AppError, AppState, RequestBody};

/// Number of blank author rows on a new form, and the number added by the
/// "add more authors" button.
pub const AUTHOR_ROWS_PER_STEP: usize = 3;

/// One author row of the submission form, as typed.
#[derive(Serialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct AuthorRow {
    pub first_name: String,
    pub last_name: String,
    pub name: String,
    pub department: String,
    pub institution: String,
    pub country: String,
    pub email_address: String,
    pub errors: Vec<String>,
}
impl AuthorRow {
    pub fn is_blank(&self) -> bool {
        [
            &self.first_name,
            &self.last_name,
            &self.name,
            &self.department,
            &self.institution,
            &self.country,
            &self.email_address,
        ]
        .iter()
        .all(|s| s.trim().is_empty())
    }
}

/// Field-level errors. Every field is always present so templates can look
/// them up.
#[derive(Serialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct AbstractFormErrors {
    pub meeting_id: Vec<String>,
    pub presentation_type: Vec<String>,
    pub title: Vec<String>,
    pub abstract_text: Vec<String>,
    pub contact_email: Vec<String>,
    pub confirm_email: Vec<String>,
    pub pcode: Vec<String>,
    pub authors: Vec<String>,
}
impl AbstractFormErrors {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Abstract submission form as it is shown to the user. The access code is
/// never echoed back.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AbstractForm {
    pub meeting_id: String,
    pub presentation_type: String,
    pub title: String,
    pub abstract_text: String,
    pub acknowledgements: String,
    pub references: String,
    pub comments: String,
    pub contact_email: String,
    pub confirm_email: String,
    pub authors: Vec<AuthorRow>,
    pub errors: AbstractFormErrors,
    /// Summary shown above the form.
    pub error_message: Option<String>,
}
impl Default for AbstractForm {
    fn default() -> Self {
        Self {
            meeting_id: String::new(),
            presentation_type: String::new(),
            title: String::new(),
            abstract_text: String::new(),
            acknowledgements: String::new(),
            references: String::new(),
            comments: String::new(),
            contact_email: String::new(),
            confirm_email: String::new(),
            authors: vec![AuthorRow::default(); AUTHOR_ROWS_PER_STEP],
            errors: AbstractFormErrors::default(),
            error_message: None,
        }
    }
}
impl AbstractForm {
    pub fn add_author_rows(&mut self) {
        self.authors
            .extend(std::iter::repeat_n(AuthorRow::default(), AUTHOR_ROWS_PER_STEP));
    }
}

/// Renders the submission form, offering the meetings that are open for
/// abstracts.
pub async fn render_abstract_form(
    state: &AppState,
    admin: &Option<Admin>,
    form: AbstractForm,
) -> Result<Response, AppError> {
    let current_year = i64::from(Utc::now().year());
    let meetings = state.get_open_meetings(current_year).await?;
    let presentation_types = PresentationType::ALL.map(|t| t.as_str());

    let data = with_page(
        state,
        titles::ADD_ABSTRACT,
        serde_json::json!({
            "form": form,
            "meetings": meetings,
            "presentation_types": presentation_types,
        }),
    )
    .await?;
    Ok(crate::render_html_template("add-abstract.html", admin, data))
}

#[derive(serde::Deserialize)]
pub struct SubmitAbstractPage {}

impl RequestBody for SubmitAbstractPage {
    type Response = Response;

    async fn request(
        self,
        state: AppState,
        admin: Option<Admin>,
    ) -> Result<Self::Response, AppError> {
        render_abstract_form(&state, &admin, AbstractForm::default()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_form_has_three_blank_author_rows() {
        let mut form = AbstractForm::default();
        assert_eq!(form.authors.len(), 3);
        assert!(form.authors.iter().all(AuthorRow::is_blank));
        assert!(form.errors.is_empty());

        form.add_author_rows();
        assert_eq!(form.authors.len(), 6);
    }

    #[test]
    fn whitespace_only_rows_are_blank() {
        let row = AuthorRow {
            name: "  ".to_string(),
            country: "\t".to_string(),
            ..Default::default()
        };
        assert!(row.is_blank());

        let row = AuthorRow {
            institution: "Chaos University".to_string(),
            ..Default::default()
        };
        assert!(!row.is_blank());
    }
}
