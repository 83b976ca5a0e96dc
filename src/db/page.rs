use serde::Serialize;
use sqlx::{Executor, FromRow, Sqlite, Transaction, query, query_as};

use crate::AppState;

id_struct!(PageId, Page);
/// Node of the CMS page tree.
#[derive(Serialize, FromRow, Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub id: PageId,
    pub parent_id: Option<PageId>,
    pub title: String,
    /// URL segment relative to the parent page.
    pub url: String,
    /// HTML body shown around the view.
    pub content: String,
    pub template_name: String,
    pub is_public: bool,
    pub show_in_menu: bool,
}

/// Fields for a new page.
#[derive(Debug, Clone)]
pub struct PageData {
    pub parent_id: Option<PageId>,
    pub title: String,
    pub url: String,
    pub template_name: String,
    pub is_public: bool,
    pub show_in_menu: bool,
}

/// Page titles that the public views bind to.
pub mod titles {
    pub const MAIN_MENU: &str = "mainmenu";
    pub const HOME: &str = "home";
    pub const ANNOUNCEMENT_DETAIL: &str = "detail";
    pub const JOIN: &str = "join";
    pub const MEETINGS: &str = "meetings";
    pub const ADD_ABSTRACT: &str = "add";
    pub const THANKS: &str = "thanks";
}

impl AppState {
    pub async fn get_all_pages(&self) -> sqlx::Result<Vec<Page>> {
        query_as("SELECT * FROM Page ORDER BY id")
            .fetch_all(&self.pool)
            .await
    }

    pub async fn get_opt_page(&self, id: PageId) -> sqlx::Result<Option<Page>> {
        query_as("SELECT * FROM Page WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Returns the first page with exactly this title.
    pub async fn get_page_by_title(&self, title: &str) -> sqlx::Result<Option<Page>> {
        Self::page_by_title(&self.pool, title).await
    }

    /// Returns the public page with this title, or `None` if it is missing or
    /// hidden. Views render without CMS content in that case.
    pub async fn get_public_page(&self, title: &str) -> sqlx::Result<Option<Page>> {
        Ok(self.get_page_by_title(title).await?.filter(|p| p.is_public))
    }

    /// Returns the public pages shown in the site menu: children of the
    /// `mainmenu` page with `show_in_menu` set.
    pub async fn get_menu_pages(&self) -> sqlx::Result<Vec<Page>> {
        query_as(
            "SELECT Child.* FROM Page AS Child
                JOIN Page AS Parent ON Child.parent_id = Parent.id
                WHERE Parent.title = $1 AND Child.is_public = TRUE AND Child.show_in_menu = TRUE
                ORDER BY Child.id",
        )
        .bind(titles::MAIN_MENU)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn add_page(&self, data: PageData) -> sqlx::Result<Page> {
        let mut transaction = self.pool.begin().await?;
        let page = Self::insert_page(&mut transaction, data).await?;
        transaction.commit().await?;
        Ok(page)
    }

    pub async fn update_page(
        &self,
        id: PageId,
        content: &str,
        is_public: bool,
        show_in_menu: bool,
    ) -> sqlx::Result<()> {
        let result =
            query("UPDATE Page SET content = $1, is_public = $2, show_in_menu = $3 WHERE id = $4")
                .bind(content)
                .bind(is_public)
                .bind(show_in_menu)
                .bind(id)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
        Ok(())
    }

    /// Creates the pages that the public views bind to, skipping any that
    /// already exist.
    pub async fn init_page_tree(&self) -> sqlx::Result<()> {
        let mut transaction = self.pool.begin().await?;

        let main_menu = Self::ensure_page(&mut transaction, None, titles::MAIN_MENU, "").await?;
        let home = Self::ensure_page(&mut transaction, Some(main_menu), titles::HOME, "home").await?;
        Self::ensure_page(&mut transaction, Some(home), titles::ANNOUNCEMENT_DETAIL, "detail")
            .await?;
        Self::ensure_page(&mut transaction, Some(home), titles::JOIN, "join").await?;
        let meetings =
            Self::ensure_page(&mut transaction, Some(main_menu), titles::MEETINGS, "meetings")
                .await?;
        Self::ensure_page(&mut transaction, Some(meetings), titles::ADD_ABSTRACT, "add").await?;
        Self::ensure_page(&mut transaction, Some(meetings), titles::THANKS, "thanks").await?;

        transaction.commit().await?;
        Ok(())
    }

    async fn ensure_page(
        transaction: &mut Transaction<'_, Sqlite>,
        parent_id: Option<PageId>,
        title: &str,
        url: &str,
    ) -> sqlx::Result<PageId> {
        if let Some(page) = Self::page_by_title(&mut **transaction, title).await? {
            return Ok(page.id);
        }
        let page = Self::insert_page(
            transaction,
            PageData {
                parent_id,
                title: title.to_string(),
                url: url.to_string(),
                template_name: String::new(),
                is_public: true,
                show_in_menu: true,
            },
        )
        .await?;
        tracing::info!(title, "created page");
        Ok(page.id)
    }

    pub(crate) async fn page_by_title<'e>(
        executor: impl Executor<'e, Database = Sqlite>,
        title: &str,
    ) -> sqlx::Result<Option<Page>> {
        query_as("SELECT * FROM Page WHERE title = $1 ORDER BY id LIMIT 1")
            .bind(title)
            .fetch_optional(executor)
            .await
    }

    pub(crate) async fn insert_page(
        transaction: &mut Transaction<'_, Sqlite>,
        data: PageData,
    ) -> sqlx::Result<Page> {
        let PageData {
            parent_id,
            title,
            url,
            template_name,
            is_public,
            show_in_menu,
        } = data;

        query_as(
            "INSERT INTO Page (parent_id, title, url, template_name, is_public, show_in_menu)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *",
        )
        .bind(parent_id)
        .bind(title)
        .bind(url)
        .bind(template_name)
        .bind(is_public)
        .bind(show_in_menu)
        .fetch_one(&mut **transaction)
        .await
    }
}
