use chrono::NaiveDate;
use serde::Serialize;
use sqlx::{FromRow, query, query_as};

use super::page::{PageData, PageId, titles};
use crate::traits::Linkable;
use crate::{AppError, AppResult, AppState};

id_struct!(MeetingId, Meeting);

/// Yearly conference.
#[derive(Serialize, FromRow, Debug, Clone)]
pub struct Meeting {
    pub id: MeetingId,
    pub title: String,
    pub year: i64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Sponsoring organization.
    pub associated_with: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub program_pdf: Option<String>,
    pub abstracts_pdf: Option<String>,
    /// CMS page with the meeting details.
    pub page_id: Option<PageId>,
}
impl Linkable for Meeting {
    fn relative_url(&self) -> String {
        format!("/meetings/{}/", self.year)
    }
}

/// Fields of a meeting that can be edited.
#[derive(Debug, Clone)]
pub struct MeetingData {
    pub title: String,
    pub year: i64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub associated_with: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub program_pdf: Option<String>,
    pub abstracts_pdf: Option<String>,
}

impl AppState {
    /// Returns all meetings, most recent first.
    pub async fn get_all_meetings(&self) -> sqlx::Result<Vec<Meeting>> {
        query_as("SELECT * FROM Meeting ORDER BY year DESC")
            .fetch_all(&self.pool)
            .await
    }

    /// Returns meetings that accept abstracts: this year's and later.
    pub async fn get_open_meetings(&self, current_year: i64) -> sqlx::Result<Vec<Meeting>> {
        query_as("SELECT * FROM Meeting WHERE year >= $1 ORDER BY year")
            .bind(current_year)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn get_opt_meeting(&self, id: MeetingId) -> sqlx::Result<Option<Meeting>> {
        query_as("SELECT * FROM Meeting WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn get_meeting_by_year(&self, year: i64) -> sqlx::Result<Option<Meeting>> {
        query_as("SELECT * FROM Meeting WHERE year = $1")
            .bind(year)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn add_meeting(&self, data: MeetingData) -> AppResult<MeetingId> {
        let year = data.year;
        let MeetingData {
            title,
            year: _,
            start_date,
            end_date,
            associated_with,
            location,
            description,
            program_pdf,
            abstracts_pdf,
        } = data;

        let id = query_as::<_, (MeetingId,)>(
            "INSERT INTO Meeting (
                title, year, start_date, end_date, associated_with, location,
                description, program_pdf, abstracts_pdf
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id",
        )
        .bind(title)
        .bind(year)
        .bind(start_date)
        .bind(end_date)
        .bind(associated_with)
        .bind(location)
        .bind(description)
        .bind(program_pdf)
        .bind(abstracts_pdf)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| duplicate_year_error(e, year))?
        .0;

        tracing::info!(id = id.0, year, "added meeting");
        Ok(id)
    }

    /// Updates a meeting. Abstracts keep their copy of the year in sync.
    pub async fn update_meeting(&self, id: MeetingId, data: MeetingData) -> AppResult {
        let year = data.year;
        let MeetingData {
            title,
            year: _,
            start_date,
            end_date,
            associated_with,
            location,
            description,
            program_pdf,
            abstracts_pdf,
        } = data;

        let mut transaction = self.pool.begin().await?;

        let result = query(
            "UPDATE Meeting SET
                title = $1, year = $2, start_date = $3, end_date = $4, associated_with = $5,
                location = $6, description = $7, program_pdf = $8, abstracts_pdf = $9
            WHERE id = $10",
        )
        .bind(title)
        .bind(year)
        .bind(start_date)
        .bind(end_date)
        .bind(associated_with)
        .bind(location)
        .bind(description)
        .bind(program_pdf)
        .bind(abstracts_pdf)
        .bind(id)
        .execute(&mut *transaction)
        .await
        .map_err(|e| duplicate_year_error(e, year))?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }

        query("UPDATE Abstract SET year = $1 WHERE meeting_id = $2")
            .bind(year)
            .bind(id)
            .execute(&mut *transaction)
            .await?;

        // The detail page is addressed by year.
        query("UPDATE Page SET url = $1 WHERE id = (SELECT page_id FROM Meeting WHERE id = $2)")
            .bind(year.to_string())
            .bind(id)
            .execute(&mut *transaction)
            .await?;

        transaction.commit().await?;
        Ok(())
    }

    /// Deletes a meeting along with its abstracts and their authors.
    pub async fn delete_meeting(&self, id: MeetingId) -> sqlx::Result<()> {
        query("DELETE FROM Meeting WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        tracing::info!(id = id.0, "deleted meeting");
        Ok(())
    }

    /// Returns whether the meeting has a public detail page.
    pub async fn has_detail(&self, meeting: &Meeting) -> sqlx::Result<bool> {
        let Some(page_id) = meeting.page_id else {
            return Ok(false);
        };
        Ok(self
            .get_opt_page(page_id)
            .await?
            .is_some_and(|page| page.is_public))
    }

    /// Makes sure the meeting is bound to a CMS page, creating a blank one
    /// under the `meetings` page if needed.
    ///
    /// Returns `None` without changing anything if the `meetings` page does
    /// not exist.
    pub async fn create_meeting_page(&self, id: MeetingId) -> AppResult<Option<PageId>> {
        let mut transaction = self.pool.begin().await?;

        let meeting: Meeting = query_as("SELECT * FROM Meeting WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *transaction)
            .await?
            .ok_or(AppError::NotFound)?;

        if let Some(page_id) = meeting.page_id {
            let existing = query_as::<_, (PageId,)>("SELECT id FROM Page WHERE id = $1")
                .bind(page_id)
                .fetch_optional(&mut *transaction)
                .await?;
            if existing.is_some() {
                tracing::debug!(meeting = meeting.year, "meeting page already exists");
                return Ok(Some(page_id));
            }
        }

        let page_id = match Self::page_by_title(&mut *transaction, &meeting.title).await? {
            Some(page) => {
                tracing::info!(meeting = meeting.year, page = page.id.0, "bound existing page");
                page.id
            }
            None => {
                let Some(parent) = Self::page_by_title(&mut *transaction, titles::MEETINGS).await?
                else {
                    tracing::warn!(
                        meeting = meeting.year,
                        "cannot create meeting page: no {:?} page exists",
                        titles::MEETINGS,
                    );
                    return Ok(None);
                };
                let page = Self::insert_page(
                    &mut transaction,
                    PageData {
                        parent_id: Some(parent.id),
                        title: meeting.title.clone(),
                        url: meeting.year.to_string(),
                        template_name: String::new(),
                        is_public: true,
                        show_in_menu: false,
                    },
                )
                .await?;
                tracing::info!(meeting = meeting.year, page = page.id.0, "created meeting page");
                page.id
            }
        };

        query("UPDATE Meeting SET page_id = $1 WHERE id = $2")
            .bind(page_id)
            .bind(id)
            .execute(&mut *transaction)
            .await?;

        transaction.commit().await?;
        Ok(Some(page_id))
    }
}

fn duplicate_year_error(err: sqlx::Error, year: i64) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return AppError::DuplicateMeetingYear(year);
        }
    }
    err.into()
}

#[cfg(test)]
pub(crate) mod tests {
    use sqlx::SqlitePool;

    use super::*;

    pub(crate) fn meeting_data(year: i64, title: &str, location: &str) -> MeetingData {
        MeetingData {
            title: title.to_string(),
            year,
            start_date: None,
            end_date: None,
            associated_with: Some("AAPA".to_string()),
            location: Some(location.to_string()),
            description: None,
            program_pdf: None,
            abstracts_pdf: None,
        }
    }

    #[sqlx::test]
    async fn meetings_are_listed_by_year_descending(pool: SqlitePool) -> AppResult {
        let state = AppState::for_tests(pool);
        state.add_meeting(meeting_data(2015, "San Francisco 2015", "San Francisco, CA")).await?;
        state.add_meeting(meeting_data(2016, "Atlanta 2016", "Atlanta, GA")).await?;
        state.add_meeting(meeting_data(2014, "Calgary 2014", "Calgary, AB")).await?;

        let years: Vec<i64> = state.get_all_meetings().await?.iter().map(|m| m.year).collect();
        assert_eq!(years, [2016, 2015, 2014]);

        let open: Vec<i64> = state.get_open_meetings(2015).await?.iter().map(|m| m.year).collect();
        assert_eq!(open, [2015, 2016]);

        let atlanta = state.get_meeting_by_year(2016).await?.unwrap();
        assert_eq!(atlanta.relative_url(), "/meetings/2016/");
        Ok(())
    }

    #[sqlx::test]
    async fn duplicate_year_is_an_integrity_error(pool: SqlitePool) -> AppResult {
        let state = AppState::for_tests(pool);
        state.add_meeting(meeting_data(2014, "Calgary 2014", "Calgary, AB")).await?;

        let result = state.add_meeting(meeting_data(2014, "Vancouver 2014", "Vancouver")).await;
        assert!(matches!(result, Err(AppError::DuplicateMeetingYear(2014))));
        assert_eq!(state.get_all_meetings().await?.len(), 1);
        Ok(())
    }

    #[sqlx::test]
    async fn has_detail_follows_page(pool: SqlitePool) -> AppResult {
        let state = AppState::for_tests(pool);
        state.init_page_tree().await?;
        let id = state.add_meeting(meeting_data(2014, "Calgary 2014", "Calgary")).await?;

        let meeting = state.get_opt_meeting(id).await?.unwrap();
        assert!(!state.has_detail(&meeting).await?);

        let page_id = state.create_meeting_page(id).await?.unwrap();
        let meeting = state.get_opt_meeting(id).await?.unwrap();
        assert!(state.has_detail(&meeting).await?);

        let page = state.get_opt_page(page_id).await?.unwrap();
        let meetings_page = state.get_page_by_title(titles::MEETINGS).await?.unwrap();
        assert_eq!(page.parent_id, Some(meetings_page.id));
        assert_eq!(page.url, "2014");
        assert_eq!(page.title, "Calgary 2014");
        assert!(!page.show_in_menu);

        state.update_page(page_id, "", false, false).await?;
        assert!(!state.has_detail(&meeting).await?);
        Ok(())
    }

    #[sqlx::test]
    async fn year_change_moves_page_url(pool: SqlitePool) -> AppResult {
        let state = AppState::for_tests(pool);
        state.init_page_tree().await?;
        let id = state.add_meeting(meeting_data(2014, "Calgary 2014", "Calgary")).await?;
        let page_id = state.create_meeting_page(id).await?.unwrap();

        state
            .update_meeting(id, meeting_data(2015, "Calgary 2014", "Calgary"))
            .await?;
        assert_eq!(state.get_opt_meeting(id).await?.unwrap().year, 2015);
        assert_eq!(state.get_opt_page(page_id).await?.unwrap().url, "2015");

        // meetings without a page leave other pages alone
        let other = state.add_meeting(meeting_data(2010, "Albuquerque 2010", "ABQ")).await?;
        state
            .update_meeting(other, meeting_data(2011, "Minneapolis 2011", "MSP"))
            .await?;
        assert_eq!(state.get_opt_page(page_id).await?.unwrap().url, "2015");
        Ok(())
    }

    #[sqlx::test]
    async fn create_meeting_page_is_idempotent(pool: SqlitePool) -> AppResult {
        let state = AppState::for_tests(pool);
        state.init_page_tree().await?;
        let id = state.add_meeting(meeting_data(2015, "San Francisco 2015", "SF")).await?;

        let first = state.create_meeting_page(id).await?;
        let second = state.create_meeting_page(id).await?;
        assert_eq!(first, second);
        assert_eq!(state.get_all_pages().await?.len(), 8);
        Ok(())
    }

    #[sqlx::test]
    async fn existing_page_with_title_is_bound(pool: SqlitePool) -> AppResult {
        let state = AppState::for_tests(pool);
        state.init_page_tree().await?;
        let page = state
            .add_page(PageData {
                parent_id: None,
                title: "Atlanta 2016".to_string(),
                url: "2016".to_string(),
                template_name: String::new(),
                is_public: true,
                show_in_menu: false,
            })
            .await?;
        let id = state.add_meeting(meeting_data(2016, "Atlanta 2016", "Atlanta")).await?;

        assert_eq!(state.create_meeting_page(id).await?, Some(page.id));
        assert_eq!(state.get_all_pages().await?.len(), 8);
        Ok(())
    }

    #[sqlx::test]
    async fn missing_meetings_page_is_not_fatal(pool: SqlitePool) -> AppResult {
        let state = AppState::for_tests(pool);
        let id = state.add_meeting(meeting_data(2014, "Calgary 2014", "Calgary")).await?;

        assert_eq!(state.create_meeting_page(id).await?, None);
        assert!(state.get_all_pages().await?.is_empty());
        let meeting = state.get_opt_meeting(id).await?.unwrap();
        assert_eq!(meeting.page_id, None);
        assert!(!state.has_detail(&meeting).await?);
        Ok(())
    }
}
