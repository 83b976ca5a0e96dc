use crate::AppError;
use crate::cookies::Admin;

pub mod abstracts;
pub mod announcements;
pub mod export;
pub mod meetings;
pub mod pages;
pub mod profiles;
pub mod sign_in;

/// Returns an error unless an administrator is signed in.
pub fn require_admin(admin: Option<Admin>) -> Result<Admin, AppError> {
    admin.ok_or(AppError::NotLoggedIn)
}

/// Parses a list of IDs submitted as separate form fields.
pub fn parse_ids<T: From<i64>>(name: &str, values: &[String]) -> Result<Vec<T>, AppError> {
    values
        .iter()
        .map(|v| {
            v.trim()
                .parse::<i64>()
                .map(T::from)
                .map_err(|_| AppError::InvalidForm(format!("{name} must be a list of IDs")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::AbstractId;

    #[test]
    fn id_lists() {
        let ids: Vec<AbstractId> = parse_ids("selected", &["3".into(), " 7 ".into()]).unwrap();
        assert_eq!(ids, [AbstractId(3), AbstractId(7)]);
        assert!(parse_ids::<AbstractId>("selected", &["x".into()]).is_err());
        assert!(require_admin(None).is_err());
    }
}
