//! Member profiles, one per [`User`].

use serde::Serialize;
use sqlx::{FromRow, query_as};

use super::{User, UserId};
use crate::AppState;

id_struct!(ProfileId, UserProfile);

#[derive(Serialize, FromRow, Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: ProfileId,
    pub user_id: UserId,
    pub institution: Option<String>,
    pub department: Option<String>,
    /// Whether the member wants society email.
    pub send_emails: bool,
}

/// Profile together with the identity it extends.
#[derive(Serialize, FromRow, Debug, Clone)]
pub struct ProfileListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub profile: UserProfile,
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
}
impl ProfileListing {
    pub fn name(&self) -> String {
        User::make_name(&self.first_name, &self.last_name, self.email.as_deref())
    }
}

/// Fields submitted from the admin profile form.
#[derive(Debug, Clone)]
pub struct ProfileData {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub institution: Option<String>,
    pub department: Option<String>,
    pub send_emails: bool,
}

impl AppState {
    /// Returns all profiles ordered by last name.
    pub async fn get_all_profiles(&self) -> sqlx::Result<Vec<ProfileListing>> {
        query_as(
            "SELECT UserProfile.*, UserAccount.email, UserAccount.first_name, UserAccount.last_name
                FROM UserProfile
                JOIN UserAccount ON UserProfile.user_id = UserAccount.id
                ORDER BY UserAccount.last_name, UserAccount.first_name, UserProfile.id",
        )
        .fetch_all(&self.pool)
        .await
    }

    pub async fn get_profile(&self, user_id: UserId) -> sqlx::Result<Option<UserProfile>> {
        query_as("SELECT * FROM UserProfile WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Saves the profile for the identity with this email. The identity is
    /// created if it is new, and an existing profile is updated in place.
    pub async fn upsert_profile(&self, data: ProfileData) -> sqlx::Result<UserProfile> {
        let ProfileData {
            email,
            first_name,
            last_name,
            institution,
            department,
            send_emails,
        } = data;

        let mut transaction = self.pool.begin().await?;

        let user = Self::upsert_user(&mut transaction, &email, &first_name, &last_name).await?;
        let profile = query_as(
            "INSERT INTO UserProfile (user_id, institution, department, send_emails)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (user_id) DO UPDATE SET
                    institution = excluded.institution,
                    department = excluded.department,
                    send_emails = excluded.send_emails
                RETURNING *",
        )
        .bind(user.id)
        .bind(institution)
        .bind(department)
        .bind(send_emails)
        .fetch_one(&mut *transaction)
        .await?;

        transaction.commit().await?;
        tracing::info!(user = user.id.0, "saved profile");
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use sqlx::SqlitePool;

    use super::*;
    use crate::AppResult;

    fn profile_data(email: &str, first_name: &str, last_name: &str) -> ProfileData {
        ProfileData {
            email: email.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            institution: Some("Chaos University".to_string()),
            department: None,
            send_emails: true,
        }
    }

    #[sqlx::test]
    async fn one_profile_per_identity(pool: SqlitePool) -> AppResult {
        let state = AppState::for_tests(pool);

        let first = state
            .upsert_profile(profile_data("denne.reed@gmail.com", "Denne", "Reed"))
            .await?;
        let mut data = profile_data("denne.reed@gmail.com", "Denne", "Reed");
        data.send_emails = false;
        data.department = Some("Anthropology".to_string());
        let second = state.upsert_profile(data).await?;

        assert_eq!(first.id, second.id);
        assert!(!second.send_emails);
        assert_eq!(second.department.as_deref(), Some("Anthropology"));

        let user = state.get_user_from_email("denne.reed@gmail.com").await?.unwrap();
        assert_eq!(user.name(), "Denne Reed");
        assert_eq!(state.get_profile(user.id).await?, Some(second));
        Ok(())
    }

    #[sqlx::test]
    async fn blank_names_keep_stored_names(pool: SqlitePool) -> AppResult {
        let state = AppState::for_tests(pool);
        state
            .upsert_profile(profile_data("denne.reed@gmail.com", "Denne", "Reed"))
            .await?;
        state
            .upsert_profile(profile_data("denne.reed@gmail.com", "", ""))
            .await?;
        let user = state.get_user_from_email("denne.reed@gmail.com").await?.unwrap();
        assert_eq!((user.first_name.as_str(), user.last_name.as_str()), ("Denne", "Reed"));

        state
            .upsert_profile(profile_data("denne.reed@gmail.com", "", "Reed-Smith"))
            .await?;
        let user = state.get_user_from_email("denne.reed@gmail.com").await?.unwrap();
        assert_eq!(user.name(), "Denne Reed-Smith");
        Ok(())
    }

    #[sqlx::test]
    async fn profiles_are_listed_by_last_name(pool: SqlitePool) -> AppResult {
        let state = AppState::for_tests(pool);
        state.upsert_profile(profile_data("z@example.com", "Ima", "Zed")).await?;
        state.upsert_profile(profile_data("a@example.com", "Bob", "Adams")).await?;
        state.upsert_profile(profile_data("m@example.com", "Al", "Moss")).await?;

        let names: Vec<String> = state
            .get_all_profiles()
            .await?
            .iter()
            .map(|p| p.name())
            .collect();
        assert_eq!(names, ["Bob Adams", "Al Moss", "Ima Zed"]);
        Ok(())
    }
}
