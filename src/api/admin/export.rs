//! Bulk actions over abstracts selected in the admin list.

use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum_typed_multipart::TryFromMultipart;

use super::{parse_ids, require_admin};
use crate::cookies::Admin;
use crate::db::{AbstractId, AbstractWithAuthors};
use crate::templates::render_html_string;
use crate::{AppError, AppState, RequestBody};

const CSV_HEADER: [&str; 11] = [
    "id",
    "contact_email",
    "presentation_type",
    "title",
    "abstract_text",
    "acknowledgements",
    "references",
    "comments",
    "year",
    "abstract_rank",
    "authors",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExportFormat {
    Csv,
    Html,
}

#[derive(Debug, TryFromMultipart)]
pub struct AbstractAction {
    /// `csv` or `html`.
    pub action: String,
    pub selected: Vec<String>,
}

impl AbstractAction {
    fn format(&self) -> Result<ExportFormat, AppError> {
        match self.action.trim() {
            "csv" => Ok(ExportFormat::Csv),
            "html" => Ok(ExportFormat::Html),
            other => Err(AppError::InvalidForm(format!("unknown action {other:?}"))),
        }
    }
}

impl RequestBody for AbstractAction {
    type Response = Response;

    async fn request(
        self,
        state: AppState,
        admin: Option<Admin>,
    ) -> Result<Self::Response, AppError> {
        require_admin(admin)?;
        let format = self.format()?;
        let ids = parse_ids::<AbstractId>("selected", &self.selected)?;
        let abstracts = state.get_abstracts_for_export(&ids).await?;
        tracing::info!(count = abstracts.len(), ?format, "exporting abstracts");

        Ok(match format {
            ExportFormat::Csv => attachment("text/csv", "abstracts.csv", abstracts_csv(&abstracts)?),
            ExportFormat::Html => attachment(
                "text/html; charset=utf-8",
                "abstracts_for_meeting.html",
                abstracts_program(&abstracts)?.into_bytes(),
            ),
        })
    }
}

fn attachment(content_type: &'static str, file_name: &str, body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        body,
    )
        .into_response()
}

/// Writes one row per abstract, with authors joined in rank order.
pub fn abstracts_csv(abstracts: &[AbstractWithAuthors]) -> Result<Vec<u8>, AppError> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(CSV_HEADER)?;
    for a in abstracts {
        let abs = &a.r#abstract;
        writer.write_record([
            abs.id.0.to_string(),
            abs.contact_email.clone(),
            abs.presentation_type.to_string(),
            abs.title.clone(),
            abs.abstract_text.clone(),
            abs.acknowledgements.clone().unwrap_or_default(),
            abs.references.clone().unwrap_or_default(),
            abs.comments.clone().unwrap_or_default(),
            abs.year.to_string(),
            abs.abstract_rank.map(|r| r.to_string()).unwrap_or_default(),
            a.author_names(),
        ])?;
    }
    writer
        .into_inner()
        .map_err(|e| AppError::IoError(e.into_error()))
}

/// Renders the printable program for the selection.
pub fn abstracts_program(abstracts: &[AbstractWithAuthors]) -> Result<String, AppError> {
    let data = serde_json::json!({
        "abstracts": abstracts.iter().map(AbstractWithAuthors::to_json).collect::<Vec<_>>(),
    });
    render_html_string("abstract-program.html", &data)
        .map_err(|e| AppError::Other(format!("template error: {e}")))
}

#[cfg(test)]
mod tests {
    use sqlx::SqlitePool;

    use super::*;
    use crate::AppResult;
    use crate::db::abstracts::tests::{abstract_data, author_data};
    use crate::db::meeting::tests::meeting_data;

    #[sqlx::test]
    async fn csv_joins_authors_in_rank_order(pool: SqlitePool) -> AppResult {
        let state = AppState::for_tests(pool);
        let meeting = state.add_meeting(meeting_data(2016, "Atlanta 2016", "Atlanta")).await?;
        let id = state
            .add_abstract_with_authors(
                abstract_data(meeting, "Hominin teeth"),
                vec![author_data("A"), author_data("B"), author_data("C")],
            )
            .await?;

        let abstracts = state.get_abstracts_for_export(&[id]).await?;
        let csv = String::from_utf8(abstracts_csv(&abstracts)?).unwrap();
        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        assert_eq!(reader.headers().unwrap().iter().collect::<Vec<_>>(), CSV_HEADER);
        let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], id.0.to_string());
        assert_eq!(&rows[0][3], "Hominin teeth");
        assert_eq!(&rows[0][8], "2016");
        assert_eq!(&rows[0][10], "A, B, C");
        Ok(())
    }

    #[sqlx::test]
    async fn html_program_is_an_attachment(pool: SqlitePool) -> AppResult {
        let state = AppState::for_tests(pool);
        let meeting = state.add_meeting(meeting_data(2016, "Atlanta 2016", "Atlanta")).await?;
        let id = state
            .add_abstract_with_authors(abstract_data(meeting, "Hominin teeth"), vec![author_data("A")])
            .await?;

        let response = AbstractAction {
            action: "html".to_string(),
            selected: vec![id.0.to_string()],
        }
        .request(state.clone(), Some(Admin))
        .await?;
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"abstracts_for_meeting.html\""
        );

        let result = AbstractAction {
            action: "pdf".to_string(),
            selected: vec![],
        }
        .request(state, Some(Admin))
        .await;
        assert!(matches!(result, Err(AppError::InvalidForm(_))));
        Ok(())
    }
}
