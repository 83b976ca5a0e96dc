use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, query, query_as};

use super::author::{Author, AuthorData};
use super::meeting::MeetingId;
use crate::traits::Linkable;
use crate::{AppError, AppResult, AppState};

id_struct!(AbstractId, Abstract);

#[derive(sqlx::Type, Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[sqlx(type_name = "TEXT")]
pub enum PresentationType {
    Paper,
    Poster,
    #[sqlx(rename = "Undergraduate Poster")]
    #[serde(rename = "Undergraduate Poster")]
    UndergraduatePoster,
}
impl PresentationType {
    pub const ALL: [Self; 3] = [Self::Paper, Self::Poster, Self::UndergraduatePoster];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Paper => "Paper",
            Self::Poster => "Poster",
            Self::UndergraduatePoster => "Undergraduate Poster",
        }
    }
}
impl fmt::Display for PresentationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
impl FromStr for PresentationType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| AppError::InvalidForm(format!("unknown presentation type {s:?}")))
    }
}

/// Conference presentation proposal.
#[derive(Serialize, FromRow, Debug, Clone)]
pub struct Abstract {
    pub id: AbstractId,
    pub meeting_id: MeetingId,
    pub contact_email: String,
    pub presentation_type: PresentationType,
    /// Rich text.
    pub title: String,
    /// Rich text.
    pub abstract_text: String,
    pub acknowledgements: Option<String>,
    #[sqlx(rename = "references_text")]
    pub references: Option<String>,
    pub comments: Option<String>,
    /// Copy of the meeting year.
    pub year: i64,
    pub abstract_rank: Option<i64>,
    pub abstract_media: Option<String>,
    pub accepted: bool,
    pub created: NaiveDate,
    pub last_modified: NaiveDate,
}

impl Linkable for Abstract {
    /// Accepted abstracts are listed on their meeting's page.
    fn relative_url(&self) -> String {
        format!("/meetings/{}/", self.year)
    }
}

/// Abstract along with its authors in rank order.
#[derive(Serialize, Debug, Clone)]
pub struct AbstractWithAuthors {
    #[serde(flatten)]
    pub r#abstract: Abstract,
    pub authors: Vec<Author>,
}
impl AbstractWithAuthors {
    /// Returns the author names joined by commas, in rank order.
    pub fn author_names(&self) -> String {
        self.authors.iter().map(|a| &a.name).join(", ")
    }

    pub fn lead_author_last_name(&self) -> Option<&str> {
        self.authors.first()?.last_name.as_deref()
    }

    /// Returns the JSON used by templates, including computed fields.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "abstract": self,
            "author_names": self.author_names(),
            "lead_author_last_name": self.lead_author_last_name(),
        })
    }
}

/// Fields of an abstract that can be edited. The year is copied from the
/// meeting.
#[derive(Debug, Clone)]
pub struct AbstractData {
    pub meeting_id: MeetingId,
    pub contact_email: String,
    pub presentation_type: PresentationType,
    pub title: String,
    pub abstract_text: String,
    pub acknowledgements: Option<String>,
    pub references: Option<String>,
    pub comments: Option<String>,
    pub abstract_rank: Option<i64>,
    pub abstract_media: Option<String>,
    pub accepted: bool,
}

/// Filters for the admin abstract list.
#[derive(Debug, Default, Clone)]
pub struct AbstractFilter {
    pub year: Option<i64>,
    pub presentation_type: Option<PresentationType>,
    pub accepted: Option<bool>,
    /// Matched against the title and author names.
    pub search: Option<String>,
}

/// Inline edit from the admin abstract list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbstractListUpdate {
    pub id: AbstractId,
    pub accepted: bool,
    pub abstract_rank: Option<i64>,
}

impl AppState {
    pub async fn get_opt_abstract(
        &self,
        id: AbstractId,
    ) -> sqlx::Result<Option<AbstractWithAuthors>> {
        let Some(r#abstract) = query_as::<_, Abstract>("SELECT * FROM Abstract WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };
        let authors = self.get_authors(id).await?;
        Ok(Some(AbstractWithAuthors {
            r#abstract,
            authors,
        }))
    }

    /// Returns the accepted abstracts of the meeting in `year`, ordered by
    /// title.
    pub async fn get_accepted_abstracts(
        &self,
        year: i64,
    ) -> sqlx::Result<Vec<AbstractWithAuthors>> {
        let abstracts = query_as(
            "SELECT Abstract.* FROM Abstract
                JOIN Meeting ON Abstract.meeting_id = Meeting.id
                WHERE Meeting.year = $1 AND Abstract.accepted = TRUE
                ORDER BY Abstract.title, Abstract.id",
        )
        .bind(year)
        .fetch_all(&self.pool)
        .await?;
        self.with_authors(abstracts).await
    }

    /// Returns the selected abstracts ordered by rank, unranked ones last.
    pub async fn get_abstracts_for_export(
        &self,
        ids: &[AbstractId],
    ) -> sqlx::Result<Vec<AbstractWithAuthors>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let mut query_builder = QueryBuilder::<Sqlite>::new("SELECT * FROM Abstract WHERE id IN (");
        let mut separated = query_builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY abstract_rank IS NULL, abstract_rank, id");

        let abstracts = query_builder.build_query_as().fetch_all(&self.pool).await?;
        self.with_authors(abstracts).await
    }

    /// Returns abstracts for the admin list, newest first.
    pub async fn search_abstracts(&self, filter: &AbstractFilter) -> sqlx::Result<Vec<Abstract>> {
        let mut query_builder = QueryBuilder::<Sqlite>::new("SELECT * FROM Abstract WHERE TRUE");
        if let Some(year) = filter.year {
            query_builder.push(" AND year = ");
            query_builder.push_bind(year);
        }
        if let Some(presentation_type) = filter.presentation_type {
            query_builder.push(" AND presentation_type = ");
            query_builder.push_bind(presentation_type);
        }
        if let Some(accepted) = filter.accepted {
            query_builder.push(" AND accepted = ");
            query_builder.push_bind(accepted);
        }
        if let Some(search) = &filter.search {
            let pattern = format!("%{search}%");
            query_builder.push(" AND (title LIKE ");
            query_builder.push_bind(pattern.clone());
            query_builder.push(
                " OR EXISTS (SELECT 1 FROM Author
                    WHERE Author.abstract_id = Abstract.id AND Author.name LIKE ",
            );
            query_builder.push_bind(pattern);
            query_builder.push("))");
        }
        query_builder.push(" ORDER BY id DESC");

        query_builder.build_query_as().fetch_all(&self.pool).await
    }

    /// Saves a new abstract and its authors in one transaction. Authors are
    /// ranked 1..N in list order.
    pub async fn add_abstract_with_authors(
        &self,
        data: AbstractData,
        authors: Vec<AuthorData>,
    ) -> AppResult<AbstractId> {
        let today = Utc::now().date_naive();
        let mut transaction = self.pool.begin().await?;

        let year = Self::meeting_year(&mut transaction, data.meeting_id).await?;
        let AbstractData {
            meeting_id,
            contact_email,
            presentation_type,
            title,
            abstract_text,
            acknowledgements,
            references,
            comments,
            abstract_rank,
            abstract_media,
            accepted,
        } = data;

        let id = query_as::<_, (AbstractId,)>(
            "INSERT INTO Abstract (
                meeting_id, contact_email, presentation_type, title, abstract_text,
                acknowledgements, references_text, comments, year, abstract_rank,
                abstract_media, accepted, created, last_modified
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $13)
            RETURNING id",
        )
        .bind(meeting_id)
        .bind(contact_email)
        .bind(presentation_type)
        .bind(title)
        .bind(abstract_text)
        .bind(acknowledgements)
        .bind(references)
        .bind(comments)
        .bind(year)
        .bind(abstract_rank)
        .bind(abstract_media)
        .bind(accepted)
        .bind(today)
        .fetch_one(&mut *transaction)
        .await?
        .0;

        let author_count = authors.len();
        Self::insert_ranked_authors(&mut transaction, id, authors).await?;

        transaction.commit().await?;
        tracing::info!(id = id.0, year, author_count, "saved abstract");
        Ok(id)
    }

    /// Replaces an abstract and all of its authors in one transaction.
    /// Authors are re-ranked 1..N in list order.
    pub async fn update_abstract_with_authors(
        &self,
        id: AbstractId,
        data: AbstractData,
        authors: Vec<AuthorData>,
    ) -> AppResult {
        let today = Utc::now().date_naive();
        let mut transaction = self.pool.begin().await?;

        let year = Self::meeting_year(&mut transaction, data.meeting_id).await?;
        let AbstractData {
            meeting_id,
            contact_email,
            presentation_type,
            title,
            abstract_text,
            acknowledgements,
            references,
            comments,
            abstract_rank,
            abstract_media,
            accepted,
        } = data;

        let result = query(
            "UPDATE Abstract SET
                meeting_id = $1, contact_email = $2, presentation_type = $3, title = $4,
                abstract_text = $5, acknowledgements = $6, references_text = $7, comments = $8,
                year = $9, abstract_rank = $10, abstract_media = $11, accepted = $12,
                last_modified = $13
            WHERE id = $14",
        )
        .bind(meeting_id)
        .bind(contact_email)
        .bind(presentation_type)
        .bind(title)
        .bind(abstract_text)
        .bind(acknowledgements)
        .bind(references)
        .bind(comments)
        .bind(year)
        .bind(abstract_rank)
        .bind(abstract_media)
        .bind(accepted)
        .bind(today)
        .bind(id)
        .execute(&mut *transaction)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }

        query("DELETE FROM Author WHERE abstract_id = $1")
            .bind(id)
            .execute(&mut *transaction)
            .await?;
        Self::insert_ranked_authors(&mut transaction, id, authors).await?;

        transaction.commit().await?;
        tracing::info!(id = id.0, "updated abstract");
        Ok(())
    }

    /// Applies inline edits from the admin list in one transaction.
    pub async fn update_abstract_list(&self, updates: &[AbstractListUpdate]) -> sqlx::Result<()> {
        let mut transaction = self.pool.begin().await?;
        for update in updates {
            query("UPDATE Abstract SET accepted = $1, abstract_rank = $2 WHERE id = $3")
                .bind(update.accepted)
                .bind(update.abstract_rank)
                .bind(update.id)
                .execute(&mut *transaction)
                .await?;
        }
        transaction.commit().await?;
        Ok(())
    }

    pub async fn delete_abstract(&self, id: AbstractId) -> sqlx::Result<()> {
        query("DELETE FROM Abstract WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        tracing::info!(id = id.0, "deleted abstract");
        Ok(())
    }

    async fn meeting_year(
        transaction: &mut sqlx::Transaction<'_, Sqlite>,
        meeting_id: MeetingId,
    ) -> AppResult<i64> {
        query_as::<_, (i64,)>("SELECT year FROM Meeting WHERE id = $1")
            .bind(meeting_id)
            .fetch_optional(&mut **transaction)
            .await?
            .map(|(year,)| year)
            .ok_or_else(|| AppError::InvalidForm("meeting does not exist".to_string()))
    }

    async fn with_authors(
        &self,
        abstracts: Vec<Abstract>,
    ) -> sqlx::Result<Vec<AbstractWithAuthors>> {
        let ids = abstracts.iter().map(|a| a.id).collect_vec();
        let mut authors = self.get_authors_for_abstracts(&ids).await?;
        Ok(abstracts
            .into_iter()
            .map(|r#abstract| AbstractWithAuthors {
                authors: authors.remove(&r#abstract.id).unwrap_or_default(),
                r#abstract,
            })
            .collect())
    }
}
