use std::collections::HashMap;

use itertools::Itertools;
use serde::Serialize;
use sqlx::{FromRow, QueryBuilder, Sqlite, Transaction, query_as};

use super::abstracts::AbstractId;
use crate::AppState;
use crate::util::title_case;

id_struct!(AuthorId, Author);

/// Contributor to an abstract.
#[derive(Serialize, FromRow, Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: AuthorId,
    pub abstract_id: AbstractId,
    /// Position in the author list, starting at 1 for the lead author.
    pub author_rank: i64,
    pub last_name: Option<String>,
    pub first_name: Option<String>,
    /// Full name as it should be printed.
    pub name: String,
    pub department: Option<String>,
    pub institution: Option<String>,
    pub country: Option<String>,
    pub email_address: Option<String>,
}

impl Author {
    /// Returns "First Last" in title case, if both parts of the name are known.
    pub fn full_name(&self) -> Option<String> {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) if !first.is_empty() && !last.is_empty() => {
                Some(title_case(&format!("{first} {last}")))
            }
            _ => None,
        }
    }
}

/// Fields of one author row. Its rank comes from its position in the list.
#[derive(Serialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct AuthorData {
    pub last_name: Option<String>,
    pub first_name: Option<String>,
    pub name: String,
    pub department: Option<String>,
    pub institution: Option<String>,
    pub country: Option<String>,
    pub email_address: Option<String>,
}

/// Author row in the admin author list.
#[derive(Serialize, FromRow, Debug, Clone)]
pub struct AuthorListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub author: Author,
    pub abstract_title: String,
}

/// Filters for the admin author list.
#[derive(Debug, Default, Clone)]
pub struct AuthorFilter {
    pub abstract_id: Option<AbstractId>,
    /// Matched against name and email address.
    pub search: Option<String>,
}

impl AppState {
    /// Returns the authors of an abstract in rank order.
    pub async fn get_authors(&self, abstract_id: AbstractId) -> sqlx::Result<Vec<Author>> {
        query_as("SELECT * FROM Author WHERE abstract_id = $1 ORDER BY author_rank, id")
            .bind(abstract_id)
            .fetch_all(&self.pool)
            .await
    }

    /// Returns the authors of each abstract in rank order.
    pub async fn get_authors_for_abstracts(
        &self,
        abstract_ids: &[AbstractId],
    ) -> sqlx::Result<HashMap<AbstractId, Vec<Author>>> {
        if abstract_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut query_builder = QueryBuilder::<Sqlite>::new(
            "SELECT * FROM Author
                WHERE abstract_id IN (",
        );
        let mut separated = query_builder.separated(", ");
        for id in abstract_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY abstract_id, author_rank, id");

        let authors: Vec<Author> = query_builder.build_query_as().fetch_all(&self.pool).await?;
        Ok(authors
            .into_iter()
            .map(|author| (author.abstract_id, author))
            .into_group_map())
    }

    /// Returns authors for the admin list, ordered by abstract then rank.
    pub async fn search_authors(&self, filter: &AuthorFilter) -> sqlx::Result<Vec<AuthorListing>> {
        let mut query_builder = QueryBuilder::<Sqlite>::new(
            "SELECT Author.*, Abstract.title AS abstract_title
                FROM Author
                JOIN Abstract ON Author.abstract_id = Abstract.id
                WHERE TRUE",
        );
        if let Some(abstract_id) = filter.abstract_id {
            query_builder.push(" AND Author.abstract_id = ");
            query_builder.push_bind(abstract_id);
        }
        if let Some(search) = &filter.search {
            let pattern = format!("%{search}%");
            query_builder.push(" AND (Author.name LIKE ");
            query_builder.push_bind(pattern.clone());
            query_builder.push(" OR Author.email_address LIKE ");
            query_builder.push_bind(pattern);
            query_builder.push(")");
        }
        query_builder.push(" ORDER BY Author.abstract_id, Author.author_rank, Author.id");

        query_builder.build_query_as().fetch_all(&self.pool).await
    }

    /// Inserts authors for an abstract, ranking them 1..N in list order.
    pub(crate) async fn insert_ranked_authors(
        transaction: &mut Transaction<'_, Sqlite>,
        abstract_id: AbstractId,
        authors: Vec<AuthorData>,
    ) -> sqlx::Result<()> {
        for (rank, author) in (1_i64..).zip(authors) {
            let AuthorData {
                last_name,
                first_name,
                name,
                department,
                institution,
                country,
                email_address,
            } = author;

            sqlx::query(
                "INSERT INTO Author (
                    abstract_id, author_rank, last_name, first_name, name,
                    department, institution, country, email_address
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind(abstract_id)
            .bind(rank)
            .bind(last_name)
            .bind(first_name)
            .bind(name)
            .bind(department)
            .bind(institution)
            .bind(country)
            .bind(email_address)
            .execute(&mut **transaction)
            .await?;
        }
        Ok(())
    }
}
