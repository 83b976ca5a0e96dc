use std::path::PathBuf;

use eyre::{Context, Result};

lazy_static! {
    /// Logging configuration.
    pub static ref RUST_LOG: String = dotenvy::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    /// Database connection string. Example: `sqlite://society.db?mode=rwc`
    pub static ref DATABASE_URL: String = dotenvy::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://society.db?mode=rwc".to_string());

    /// Address for the HTTP listener.
    pub static ref BIND_ADDRESS: String =
        dotenvy::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

    /// Domain name, with no trailing slash. Example: `https://www.paleoanthro.org`
    pub static ref DOMAIN_NAME: String = dotenvy::var("DOMAIN_NAME")
        .unwrap_or_else(|_| "http://localhost:3000".to_string())
        .trim_end_matches('/')
        .to_string();
}

/// Outgoing mail server.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_name: String,
    pub from_address: String,
}

/// Settings visible to request handlers.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Shared secret for the admin pages. Admin sign-in is disabled when empty.
    pub admin_token: String,
    /// Codes accepted on the abstract submission form.
    pub access_codes: Vec<String>,
    /// Directory that uploaded files are written under.
    pub media_root: PathBuf,
    /// Address that receives a copy of every submitted abstract.
    pub reviewer_email: Option<String>,
    pub smtp: Option<SmtpConfig>,
    pub max_upload_bytes: usize,
}

impl SiteConfig {
    pub fn from_env() -> Result<Self> {
        let smtp = match (optional_var("SMTP_HOST"), optional_var("SMTP_FROM_ADDRESS")) {
            (Some(host), Some(from_address)) => Some(SmtpConfig {
                host,
                port: optional_var("SMTP_PORT")
                    .map(|p| p.parse())
                    .transpose()
                    .wrap_err("invalid value for SMTP_PORT")?
                    .unwrap_or(587),
                username: optional_var("SMTP_USERNAME"),
                password: optional_var("SMTP_PASSWORD"),
                from_name: optional_var("SMTP_FROM_NAME").unwrap_or_default(),
                from_address,
            }),
            _ => None,
        };

        Ok(Self {
            admin_token: optional_var("ADMIN_TOKEN").unwrap_or_default(),
            access_codes: optional_var("ABSTRACT_ACCESS_CODES")
                .map(|codes| parse_access_codes(&codes))
                .unwrap_or_default(),
            media_root: optional_var("MEDIA_ROOT")
                .unwrap_or_else(|| "media".to_string())
                .into(),
            reviewer_email: optional_var("REVIEWER_EMAIL"),
            smtp,
            max_upload_bytes: optional_var("MAX_UPLOAD_BYTES")
                .map(|n| n.parse())
                .transpose()
                .wrap_err("invalid value for MAX_UPLOAD_BYTES")?
                .unwrap_or(20 * 1024 * 1024),
        })
    }

    /// Returns whether `token` is the admin token. Always false if no admin
    /// token is configured.
    pub fn accepts_admin_token(&self, token: &str) -> bool {
        !self.admin_token.is_empty() && token == self.admin_token
    }

    /// Returns whether `code` is on the submission allow-list. The match is
    /// exact.
    pub fn accepts_access_code(&self, code: &str) -> bool {
        !code.is_empty() && self.access_codes.iter().any(|c| c == code)
    }
}

fn optional_var(key: &str) -> Option<String> {
    dotenvy::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_access_codes(codes: &str) -> Vec<String> {
    codes
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
impl SiteConfig {
    pub fn for_tests() -> Self {
        Self {
            admin_token: "admin-secret".to_string(),
            access_codes: vec!["PR432".to_string(), "pr432".to_string()],
            media_root: std::env::temp_dir().join("society-site-test-media"),
            reviewer_email: None,
            smtp: None,
            max_upload_bytes: 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_codes_are_trimmed_and_matched_exactly() {
        let config = SiteConfig {
            access_codes: parse_access_codes(" PR432, ,pr432 "),
            ..SiteConfig::for_tests()
        };
        assert_eq!(config.access_codes, ["PR432", "pr432"]);
        assert!(config.accepts_access_code("PR432"));
        assert!(config.accepts_access_code("pr432"));
        assert!(!config.accepts_access_code(" pr432 "));
        assert!(!config.accepts_access_code("Pr432"));
        assert!(!config.accepts_access_code(""));
    }

    #[test]
    fn empty_admin_token_disables_sign_in() {
        let config = SiteConfig {
            admin_token: String::new(),
            ..SiteConfig::for_tests()
        };
        assert!(!config.accepts_admin_token(""));
        assert!(SiteConfig::for_tests().accepts_admin_token("admin-secret"));
        assert!(!SiteConfig::for_tests().accepts_admin_token("admin"));
    }
}
