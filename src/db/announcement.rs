use chrono::{NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, query, query_as};

use crate::AppState;
use crate::traits::Linkable;
use crate::util::{basename, excerpt};

id_struct!(AnnouncementId, Announcement);
impl Linkable for AnnouncementId {
    fn relative_url(&self) -> String {
        format!("/home/detail/{}/", self.0)
    }
}

/// Timed public notice.
#[derive(Serialize, FromRow, Debug, Clone)]
pub struct Announcement {
    pub id: AnnouncementId,
    pub title: String,
    pub short_title: String,
    pub stub: String,
    pub body: Option<String>,
    pub category: String,
    pub priority: i64,
    pub created: NaiveDate,
    pub pub_date: NaiveDate,
    pub expires: NaiveDate,
    /// `None` until a moderator has looked at it.
    pub approved: Option<bool>,
    pub upload1: Option<String>,
    pub upload2: Option<String>,
    pub upload3: Option<String>,
}
impl Linkable for Announcement {
    fn relative_url(&self) -> String {
        self.id.relative_url()
    }
}

impl Announcement {
    /// Returns whether the announcement is shown on `today`.
    pub fn is_active_on(&self, today: NaiveDate) -> bool {
        self.expires > today && self.pub_date <= today && self.approved == Some(true)
    }

    /// Returns whether the announcement is shown right now.
    pub fn is_active(&self) -> bool {
        self.is_active_on(Utc::now().date_naive())
    }

    /// Returns the first 50 characters of the body.
    pub fn body_header(&self) -> String {
        excerpt(self.body.as_deref().unwrap_or_default(), 50)
    }

    /// Returns the file names of the uploads, in slot order.
    pub fn upload_filenames(&self) -> [Option<String>; 3] {
        [&self.upload1, &self.upload2, &self.upload3].map(|u| u.as_deref().map(basename))
    }

    /// Returns the JSON used by templates, including computed fields.
    pub fn to_json(&self) -> serde_json::Value {
        let [upload1_filename, upload2_filename, upload3_filename] = self.upload_filenames();
        serde_json::json!({
            "announcement": self,
            "url": self.relative_url(),
            "active": self.is_active(),
            "body_header": self.body_header(),
            "upload1_filename": upload1_filename,
            "upload2_filename": upload2_filename,
            "upload3_filename": upload3_filename,
        })
    }
}

/// Fields of an announcement that can be edited.
#[derive(Debug, Clone)]
pub struct AnnouncementData {
    pub title: String,
    pub short_title: String,
    pub stub: String,
    pub body: Option<String>,
    pub category: String,
    pub priority: i64,
    pub created: NaiveDate,
    pub pub_date: NaiveDate,
    pub expires: NaiveDate,
    pub approved: Option<bool>,
    pub uploads: [Option<String>; 3],
}

impl AppState {
    /// Returns announcements shown on `today`, newest first.
    pub async fn get_active_announcements(
        &self,
        today: NaiveDate,
    ) -> sqlx::Result<Vec<Announcement>> {
        query_as(
            "SELECT * FROM Announcement
                WHERE pub_date <= $1 AND expires > $1 AND approved = TRUE
                ORDER BY pub_date DESC, created DESC, id DESC",
        )
        .bind(today)
        .fetch_all(&self.pool)
        .await
    }

    /// Returns announcements shown on `today`, ordered only by publication
    /// date.
    pub async fn get_join_announcements(
        &self,
        today: NaiveDate,
    ) -> sqlx::Result<Vec<Announcement>> {
        query_as(
            "SELECT * FROM Announcement
                WHERE pub_date <= $1 AND expires > $1 AND approved = TRUE
                ORDER BY pub_date DESC",
        )
        .bind(today)
        .fetch_all(&self.pool)
        .await
    }

    /// Returns all announcements for moderation, newest first.
    pub async fn get_all_announcements(&self) -> sqlx::Result<Vec<Announcement>> {
        query_as("SELECT * FROM Announcement ORDER BY pub_date DESC, id DESC")
            .fetch_all(&self.pool)
            .await
    }

    pub async fn get_opt_announcement(
        &self,
        id: AnnouncementId,
    ) -> sqlx::Result<Option<Announcement>> {
        query_as("SELECT * FROM Announcement WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn add_announcement(&self, data: AnnouncementData) -> sqlx::Result<AnnouncementId> {
        let AnnouncementData {
            title,
            short_title,
            stub,
            body,
            category,
            priority,
            created,
            pub_date,
            expires,
            approved,
            uploads: [upload1, upload2, upload3],
        } = data;

        let id = query_as::<_, (AnnouncementId,)>(
            "INSERT INTO Announcement (
                title, short_title, stub, body, category, priority,
                created, pub_date, expires, approved, upload1, upload2, upload3
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING id",
        )
        .bind(title)
        .bind(short_title)
        .bind(stub)
        .bind(body)
        .bind(category)
        .bind(priority)
        .bind(created)
        .bind(pub_date)
        .bind(expires)
        .bind(approved)
        .bind(upload1)
        .bind(upload2)
        .bind(upload3)
        .fetch_one(&self.pool)
        .await?
        .0;

        tracing::info!(id = id.0, "added announcement");
        Ok(id)
    }

    pub async fn update_announcement(
        &self,
        id: AnnouncementId,
        data: AnnouncementData,
    ) -> sqlx::Result<()> {
        let AnnouncementData {
            title,
            short_title,
            stub,
            body,
            category,
            priority,
            created,
            pub_date,
            expires,
            approved,
            uploads: [upload1, upload2, upload3],
        } = data;

        let result = query(
            "UPDATE Announcement SET
                title = $1, short_title = $2, stub = $3, body = $4, category = $5,
                priority = $6, created = $7, pub_date = $8, expires = $9, approved = $10,
                upload1 = $11, upload2 = $12, upload3 = $13
            WHERE id = $14",
        )
        .bind(title)
        .bind(short_title)
        .bind(stub)
        .bind(body)
        .bind(category)
        .bind(priority)
        .bind(created)
        .bind(pub_date)
        .bind(expires)
        .bind(approved)
        .bind(upload1)
        .bind(upload2)
        .bind(upload3)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
        Ok(())
    }

    pub async fn delete_announcement(&self, id: AnnouncementId) -> sqlx::Result<()> {
        query("DELETE FROM Announcement WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::{Days, NaiveDate};
    use sqlx::SqlitePool;

    use super::*;
    use crate::AppResult;

    pub(crate) fn announcement_data(
        title: &str,
        today: NaiveDate,
        pub_offset: i64,
        expires_offset: i64,
        approved: Option<bool>,
    ) -> AnnouncementData {
        let offset = |days: i64| {
            if days >= 0 {
                today + Days::new(days as u64)
            } else {
                today - Days::new(days.unsigned_abs())
            }
        };
        AnnouncementData {
            title: title.to_string(),
            short_title: "Test_Short_Title".to_string(),
            stub: "<p>Stub</p>".to_string(),
            body: Some("<p>Announcement body text html format</p>".to_string()),
            category: "Job".to_string(),
            priority: 1,
            created: today,
            pub_date: offset(pub_offset),
            expires: offset(expires_offset),
            approved,
            uploads: [None, None, None],
        }
    }

    fn announcement(pub_date: NaiveDate, expires: NaiveDate, approved: Option<bool>) -> Announcement {
        Announcement {
            id: AnnouncementId(1),
            title: "Test Active Announcement".to_string(),
            short_title: "Test".to_string(),
            stub: String::new(),
            body: None,
            category: "Job".to_string(),
            priority: 1,
            created: pub_date,
            pub_date,
            expires,
            approved,
            upload1: Some("uploads/files/flyer.pdf".to_string()),
            upload2: None,
            upload3: None,
        }
    }

    #[test]
    fn each_condition_flips_is_active() {
        let today = NaiveDate::from_ymd_opt(2016, 4, 12).unwrap();
        let yesterday = today - Days::new(1);
        let tomorrow = today + Days::new(1);

        assert!(announcement(yesterday, tomorrow, Some(true)).is_active_on(today));
        assert!(announcement(today, tomorrow, Some(true)).is_active_on(today));

        // expiry
        assert!(!announcement(yesterday, today, Some(true)).is_active_on(today));
        assert!(!announcement(yesterday, yesterday, Some(true)).is_active_on(today));
        // publication
        assert!(!announcement(tomorrow, tomorrow + Days::new(1), Some(true)).is_active_on(today));
        // approval
        assert!(!announcement(yesterday, tomorrow, Some(false)).is_active_on(today));
        assert!(!announcement(yesterday, tomorrow, None).is_active_on(today));
    }

    #[test]
    fn is_active_reads_the_clock() {
        let today = Utc::now().date_naive();
        let a = announcement(today - Days::new(1), today + Days::new(1), Some(true));
        assert!(a.is_active());
    }

    #[test]
    fn derived_fields() {
        let mut a = announcement(
            NaiveDate::from_ymd_opt(2016, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2016, 2, 1).unwrap(),
            Some(true),
        );
        a.body = Some("x".repeat(80));
        assert_eq!(a.body_header().len(), 50);
        assert_eq!(
            a.upload_filenames(),
            [Some("flyer.pdf".to_string()), None, None]
        );
        assert_eq!(a.relative_url(), "/home/detail/1/");
    }

    #[sqlx::test]
    async fn listing_filters_and_orders(pool: SqlitePool) -> AppResult {
        let state = AppState::for_tests(pool);
        let today = Utc::now().date_naive();

        let older = state
            .add_announcement(announcement_data("Older", today, -3, 5, Some(true)))
            .await?;
        let newer = state
            .add_announcement(announcement_data("Newer", today, -1, 1, Some(true)))
            .await?;
        state
            .add_announcement(announcement_data("Expired", today, -3, -1, Some(true)))
            .await?;
        state
            .add_announcement(announcement_data("Future", today, 2, 5, Some(true)))
            .await?;
        state
            .add_announcement(announcement_data("Unapproved", today, -1, 5, None))
            .await?;
        state
            .add_announcement(announcement_data("Rejected", today, -1, 5, Some(false)))
            .await?;

        let active = state.get_active_announcements(today).await?;
        let ids: Vec<_> = active.iter().map(|a| a.id).collect();
        assert_eq!(ids, [newer, older]);
        assert!(active.iter().all(|a| a.is_active_on(today)));

        let join = state.get_join_announcements(today).await?;
        assert_eq!(join.len(), 2);
        assert_eq!(state.get_all_announcements().await?.len(), 6);
        Ok(())
    }

    #[sqlx::test]
    async fn update_and_delete(pool: SqlitePool) -> AppResult {
        let state = AppState::for_tests(pool);
        let today = Utc::now().date_naive();

        let id = state
            .add_announcement(announcement_data("Draft", today, -1, 1, None))
            .await?;
        assert!(state.get_active_announcements(today).await?.is_empty());

        state
            .update_announcement(id, announcement_data("Draft", today, -1, 1, Some(true)))
            .await?;
        assert_eq!(state.get_active_announcements(today).await?.len(), 1);

        state.delete_announcement(id).await?;
        assert!(state.get_opt_announcement(id).await?.is_none());
        Ok(())
    }
}
