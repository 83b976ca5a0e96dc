use serde::Serialize;
use sqlx::{FromRow, Sqlite, Transaction, query_as};

use crate::AppState;

id_struct!(UserId, User);

/// Identity that a member profile extends.
#[derive(Serialize, FromRow, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
}

impl User {
    pub fn make_name(first_name: &str, last_name: &str, email: Option<&str>) -> String {
        match (first_name.trim(), last_name.trim()) {
            ("", "") => email.unwrap_or_default().to_string(),
            (first, "") => first.to_string(),
            ("", last) => last.to_string(),
            (first, last) => format!("{first} {last}"),
        }
    }

    /// Returns "First Last", falling back to the email address.
    pub fn name(&self) -> String {
        Self::make_name(&self.first_name, &self.last_name, self.email.as_deref())
    }
}

impl AppState {
    #[cfg(test)]
    pub async fn get_user_from_email(&self, email: &str) -> sqlx::Result<Option<User>> {
        query_as("SELECT * FROM UserAccount WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    /// Returns the identity with this email, creating it if it is new. Names
    /// are updated when given; blank names keep the stored ones.
    pub(crate) async fn upsert_user(
        transaction: &mut Transaction<'_, Sqlite>,
        email: &str,
        first_name: &str,
        last_name: &str,
    ) -> sqlx::Result<User> {
        query_as(
            "INSERT INTO UserAccount (email, first_name, last_name) VALUES ($1, $2, $3)
                ON CONFLICT (email) DO UPDATE SET
                    first_name = COALESCE(NULLIF(excluded.first_name, ''), first_name),
                    last_name = COALESCE(NULLIF(excluded.last_name, ''), last_name)
                RETURNING *",
        )
        .bind(email)
        .bind(first_name)
        .bind(last_name)
        .fetch_one(&mut **transaction)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_fallbacks() {
        assert_eq!(User::make_name("Denne", "Reed", None), "Denne Reed");
        assert_eq!(User::make_name(" ", "Reed", None), "Reed");
        assert_eq!(User::make_name("", "", Some("a@b.org")), "a@b.org");
        assert_eq!(User::make_name("", "", None), "");
    }
}
