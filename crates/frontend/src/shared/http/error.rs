use thiserror::Error;

use crate::shared::messages;

/// Ошибка AJAX-запроса.
///
/// Every variant is caught at the widget boundary and turned into a message;
/// none of them escapes an event handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// fetch() rejected: offline, DNS, CORS, aborted
    #[error("network failure: {0}")]
    Network(String),

    /// 401 or a redirect (the server sends the login page instead of data)
    #[error("session expired (status {status})")]
    SessionExpired { status: u16 },

    #[error("server responded with status {0}")]
    Status(u16),

    /// 2xx, but the body is not what the endpoint promised
    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("failed to encode request: {0}")]
    Encode(String),
}

impl FetchError {
    pub fn is_session_expired(&self) -> bool {
        matches!(self, FetchError::SessionExpired { .. })
    }

    /// Text shown to the user in place of the failed content
    pub fn user_message(&self) -> &'static str {
        match self {
            FetchError::SessionExpired { .. } => messages::SESSION_EXPIRED,
            FetchError::Malformed(_) => messages::MALFORMED_RESPONSE,
            FetchError::Network(_) | FetchError::Status(_) | FetchError::Encode(_) => {
                messages::RETRY_LATER
            }
        }
    }
}
