use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Network failure for {url}")]
    NetworkFailure { url: String, details: String },
    #[error("Server returned {status} for {url}")]
    ServerError {
        url: String,
        status: u16,
        body: Option<String>,
    },
    #[error("Unexpected response body from {url}")]
    Decode { url: String, details: String },
    #[error("Required field is empty: {field}")]
    Validation { field: &'static str },
    #[error("RON {action} error")]
    Ron {
        action: StorageAction,
        path: Option<String>,
        #[source]
        source: ron::Error,
    },
    #[error("Storage {action} error")]
    StorageIo {
        action: StorageAction,
        path: Option<String>,
        #[source]
        source: std::io::Error,
    },
}

/// Errors surfaced by a [`crate::RecordGateway`]. Only the network, server and
/// decode variants are produced on that path.
pub type GatewayError = Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageAction {
    Load,
    Save,
}

impl fmt::Display for StorageAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageAction::Load => f.write_str("load"),
            StorageAction::Save => f.write_str("save"),
        }
    }
}

impl Error {
    pub fn is_gateway_error(&self) -> bool {
        matches!(
            self,
            Error::NetworkFailure { .. } | Error::ServerError { .. } | Error::Decode { .. }
        )
    }

    pub fn user_summary(&self) -> String {
        match self {
            Error::NetworkFailure { .. } => "Could not reach the server.".to_string(),
            Error::ServerError { status, .. } => {
                format!("The server rejected the request ({status}).")
            }
            Error::Decode { .. } => "The server sent an unexpected response.".to_string(),
            Error::Validation { field } => format!("Please fill in the {field} field."),
            Error::Ron { action, .. } => format!("Failed to {action} configuration data."),
            Error::StorageIo { action, .. } => format!("Failed to {action} configuration file."),
        }
    }

    pub fn technical_detail(&self) -> String {
        match self {
            Error::NetworkFailure { url, details } => {
                format!("Network failure for {url}: {details}")
            }
            Error::ServerError { url, status, body } => {
                let body = body
                    .as_ref()
                    .filter(|text| !text.is_empty())
                    .map(|text| format!(" body={text}"))
                    .unwrap_or_default();
                format!("HTTP {status} from {url}.{body}")
            }
            Error::Decode { url, details } => format!("Decode failure for {url}: {details}"),
            Error::Validation { field } => format!("Validation failed: {field} is empty."),
            Error::Ron {
                action,
                path,
                source,
            } => {
                let path = path
                    .as_ref()
                    .map(|value| format!(" path={value}."))
                    .unwrap_or_default();
                format!("RON {action} error.{path} {source}")
            }
            Error::StorageIo {
                action,
                path,
                source,
            } => {
                let path = path
                    .as_ref()
                    .map(|value| format!(" path={value}."))
                    .unwrap_or_default();
                format!("Storage {action} error.{path} {source}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_error_detail_includes_status_and_body() {
        let error = Error::ServerError {
            url: "http://127.0.0.1:5000/api/get_surveys".to_string(),
            status: 503,
            body: Some("maintenance".to_string()),
        };

        assert!(error.is_gateway_error());
        assert_eq!(error.user_summary(), "The server rejected the request (503).");
        assert_eq!(
            error.technical_detail(),
            "HTTP 503 from http://127.0.0.1:5000/api/get_surveys. body=maintenance"
        );
    }

    #[test]
    fn validation_is_not_a_gateway_error() {
        let error = Error::Validation {
            field: "description",
        };
        assert!(!error.is_gateway_error());
        assert_eq!(error.user_summary(), "Please fill in the description field.");
    }
}
