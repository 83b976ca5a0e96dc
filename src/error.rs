use axum::body::Body;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;

pub type AppResult<T = ()> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    SqlError(sqlx::Error),
    IoError(std::io::Error),
    EmailError(mail_send::Error),
    CsvError(csv::Error),
    NotLoggedIn,
    NotFound,
    InvalidForm(String),
    DuplicateMeetingYear(i64),

    Other(String),
}

impl AppError {
    pub fn message(&self) -> String {
        match self {
            Self::SqlError(err) => format!("Internal SQL error: {err}"),
            Self::IoError(err) => format!("Internal I/O error: {err}"),
            Self::EmailError(err) => format!("Error sending email: {err}"),
            Self::CsvError(err) => format!("Error writing CSV: {err}"),
            Self::NotLoggedIn => "Not signed in".to_string(),
            Self::NotFound => "Not found".to_string(),
            Self::InvalidForm(msg) => format!("Invalid form: {msg}"),
            Self::DuplicateMeetingYear(year) => {
                format!("A meeting for {year} already exists")
            }

            Self::Other(msg) => msg.to_string(),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::SqlError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::EmailError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::CsvError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotLoggedIn => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InvalidForm(_) => StatusCode::BAD_REQUEST,
            Self::DuplicateMeetingYear(_) => StatusCode::CONFLICT,

            Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response<Body> {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("{}", self.message());
        }
        let template = match self {
            Self::NotFound => "404.html",
            _ => "error.html",
        };
        (
            status,
            crate::render_html_template(
                template,
                &None,
                serde_json::json!({ "error_msg": self.message() }),
            ),
        )
            .into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> AppError {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound,
            other => AppError::SqlError(other),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> AppError {
        AppError::IoError(err)
    }
}

impl From<mail_send::Error> for AppError {
    fn from(err: mail_send::Error) -> AppError {
        AppError::EmailError(err)
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> AppError {
        AppError::CsvError(err)
    }
}
