use axum::response::Response;

use crate::api::admin::require_admin;
use crate::cookies::Admin;
use crate::db::{AbstractFilter, AbstractId, AuthorFilter, PresentationType};
use crate::html::forms::submit_abstract::AUTHOR_ROWS_PER_STEP;
use crate::util::{non_blank, parse_int_field, tri_state};
use crate::{AppError, AppState, RequestBody};

#[derive(serde::Deserialize)]
pub struct AbstractsPage {
    year: Option<String>,
    presentation_type: Option<String>,
    accepted: Option<String>,
    search: Option<String>,
}

impl AbstractsPage {
    fn filter(&self) -> Result<AbstractFilter, AppError> {
        Ok(AbstractFilter {
            year: parse_int_field("year", self.year.clone())?,
            presentation_type: non_blank(self.presentation_type.clone())
                .map(|t| t.parse())
                .transpose()?,
            accepted: tri_state(&self.accepted),
            search: non_blank(self.search.clone()),
        })
    }
}

impl RequestBody for AbstractsPage {
    type Response = Response;

    async fn request(
        self,
        state: AppState,
        admin: Option<Admin>,
    ) -> Result<Self::Response, AppError> {
        require_admin(admin.clone())?;

        let filter = self.filter()?;
        let abstracts = state.search_abstracts(&filter).await?;
        let years: Vec<i64> = state
            .get_all_meetings()
            .await?
            .into_iter()
            .map(|m| m.year)
            .collect();

        Ok(crate::render_html_template(
            "admin-abstracts.html",
            &admin,
            serde_json::json!({
                "abstracts": abstracts,
                "years": years,
                "presentation_types": PresentationType::ALL.map(|t| t.as_str()),
                "filter": {
                    "year": filter.year,
                    "presentation_type": filter.presentation_type.map(|t| t.as_str()),
                    "accepted": filter.accepted,
                    "search": filter.search,
                },
            }),
        ))
    }
}

/// Edit form for one abstract and its authors, or a blank form for a new
/// one.
#[derive(serde::Deserialize)]
pub struct AbstractPage {
    id: Option<String>,
}

impl RequestBody for AbstractPage {
    type Response = Response;

    async fn request(
        self,
        state: AppState,
        admin: Option<Admin>,
    ) -> Result<Self::Response, AppError> {
        require_admin(admin.clone())?;

        let r#abstract = match parse_int_field("id", self.id)? {
            Some(id) => Some(
                state
                    .get_opt_abstract(AbstractId(id))
                    .await?
                    .ok_or(AppError::NotFound)?,
            ),
            None => None,
        };
        let author_count = r#abstract.as_ref().map_or(0, |a| a.authors.len());
        let blank_rows: Vec<usize> = (author_count + 1..)
            .take(AUTHOR_ROWS_PER_STEP)
            .collect();
        let meetings = state.get_all_meetings().await?;

        Ok(crate::render_html_template(
            "admin-abstract.html",
            &admin,
            serde_json::json!({
                "abstract": r#abstract,
                "blank_author_ranks": blank_rows,
                "meetings": meetings,
                "presentation_types": PresentationType::ALL.map(|t| t.as_str()),
            }),
        ))
    }
}

#[derive(serde::Deserialize)]
pub struct AuthorsPage {
    abstract_id: Option<String>,
    search: Option<String>,
}

impl RequestBody for AuthorsPage {
    type Response = Response;

    async fn request(
        self,
        state: AppState,
        admin: Option<Admin>,
    ) -> Result<Self::Response, AppError> {
        require_admin(admin.clone())?;

        let filter = AuthorFilter {
            abstract_id: parse_int_field("abstract", self.abstract_id)?.map(AbstractId),
            search: non_blank(self.search),
        };
        let authors = state
            .search_authors(&filter)
            .await?
            .into_iter()
            .map(|a| serde_json::json!({ "full_name": a.author.full_name(), "author": a }))
            .collect::<Vec<_>>();

        Ok(crate::render_html_template(
            "admin-authors.html",
            &admin,
            serde_json::json!({
                "authors": authors,
                "filter": {
                    "abstract_id": filter.abstract_id,
                    "search": filter.search,
                },
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_from_query() {
        let page = AbstractsPage {
            year: Some("2016".to_string()),
            presentation_type: Some("Undergraduate Poster".to_string()),
            accepted: Some("".to_string()),
            search: Some(" ".to_string()),
        };
        let filter = page.filter().unwrap();
        assert_eq!(filter.year, Some(2016));
        assert_eq!(filter.presentation_type, Some(PresentationType::UndergraduatePoster));
        assert_eq!(filter.accepted, None);
        assert_eq!(filter.search, None);

        let page = AbstractsPage {
            year: None,
            presentation_type: Some("Talk".to_string()),
            accepted: None,
            search: None,
        };
        assert!(page.filter().is_err());
    }
}
