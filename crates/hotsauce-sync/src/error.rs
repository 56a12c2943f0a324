use thiserror::Error;

use crate::models::Metric;

/// Main error type for hotsauce-sync
#[derive(Error, Debug)]
pub enum HotSauceError {
    #[error("Health data is not available on this device")]
    PlatformUnavailable,

    #[error("Access to health data was denied")]
    AuthorizationDenied,

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("No step data available")]
    NoDataAvailable,

    #[error("Query error for {metric}: {message}")]
    Query { metric: Metric, message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Sync failed: {0}")]
    Sync(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid date format: {0}. Expected YYYY-MM-DD")]
    InvalidDateFormat(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HotSauceError>;

impl HotSauceError {
    /// Create an authorization error from a message
    pub fn authorization(msg: impl Into<String>) -> Self {
        Self::Authorization(msg.into())
    }

    /// Create a provider query error for a metric
    pub fn query(metric: Metric, msg: impl Into<String>) -> Self {
        Self::Query {
            metric,
            message: msg.into(),
        }
    }

    /// Create a database error from a message
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create a configuration error from a message
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error came from the authorization flow
    pub fn is_authorization(&self) -> bool {
        matches!(
            self,
            Self::PlatformUnavailable | Self::AuthorizationDenied | Self::Authorization(_)
        )
    }
}

impl From<rusqlite::Error> for HotSauceError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Database(e.to_string())
    }
}

/// Render an error for terminal output, with a hint where one helps
pub fn format_user_error(err: &HotSauceError) -> String {
    match err {
        HotSauceError::PlatformUnavailable => {
            format!("{}. Pass --samples with a health export file.", err)
        }
        HotSauceError::AuthorizationDenied => {
            format!("{}. Grant read access to steps, distance, energy and exercise.", err)
        }
        _ => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HotSauceError::Authorization("user cancelled".to_string());
        assert_eq!(err.to_string(), "Authorization error: user cancelled");
    }

    #[test]
    fn test_query_error_names_metric() {
        let err = HotSauceError::query(Metric::Distance, "store locked");
        assert_eq!(err.to_string(), "Query error for distance: store locked");
    }

    #[test]
    fn test_invalid_date_format_error() {
        let err = HotSauceError::InvalidDateFormat("not-a-date".to_string());
        assert!(err.to_string().contains("not-a-date"));
        assert!(err.to_string().contains("YYYY-MM-DD"));
    }

    #[test]
    fn test_authorization_classification() {
        assert!(HotSauceError::PlatformUnavailable.is_authorization());
        assert!(HotSauceError::AuthorizationDenied.is_authorization());
        assert!(HotSauceError::authorization("x").is_authorization());
        assert!(!HotSauceError::NoDataAvailable.is_authorization());
        assert!(!HotSauceError::database("x").is_authorization());
    }

    #[test]
    fn test_user_error_hint() {
        let msg = format_user_error(&HotSauceError::PlatformUnavailable);
        assert!(msg.contains("--samples"));

        let msg = format_user_error(&HotSauceError::config("bad"));
        assert_eq!(msg, "Configuration error: bad");
    }

    #[test]
    fn test_rusqlite_conversion() {
        let err: HotSauceError = rusqlite::Error::InvalidQuery.into();
        assert!(matches!(err, HotSauceError::Database(_)));
    }
}
