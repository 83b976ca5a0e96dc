use eyre::{Context, Result};
use sqlx::query;

use crate::AppState;

/// Tables in reverse dependency order.
const TABLES: &[&str] = &[
    "Author",
    "Abstract",
    "Meeting",
    "Announcement",
    "Page",
    "UserProfile",
    "UserAccount",
    "_sqlx_migrations",
];

impl AppState {
    /// Drops every table, including the migration history.
    pub async fn reset(&self) -> Result<()> {
        let mut transaction = self.pool.begin().await?;

        for table in TABLES {
            query(&format!("DROP TABLE IF EXISTS {table}"))
                .execute(&mut *transaction)
                .await
                .wrap_err_with(|| format!("error dropping table {table}"))?;
        }

        transaction.commit().await?;
        tracing::info!("dropped all tables");
        Ok(())
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!().run(&self.pool).await?;
        Ok(())
    }

    /// Creates the CMS pages that the public views bind to.
    pub async fn init_pages(&self) -> Result<()> {
        self.init_page_tree()
            .await
            .wrap_err("error creating initial pages")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use sqlx::SqlitePool;

    use super::*;

    #[sqlx::test]
    async fn reset_then_migrate(pool: SqlitePool) -> Result<()> {
        let state = AppState::for_tests(pool);
        state.init_pages().await?;

        state.reset().await?;
        assert!(state.get_all_pages().await.is_err());

        state.migrate().await?;
        assert!(state.get_all_pages().await?.is_empty());
        Ok(())
    }
}
