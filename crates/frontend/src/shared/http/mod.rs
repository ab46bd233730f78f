//! HTTP fetch adapter для AJAX-запросов виджетов

pub mod adapter;
pub mod error;
#[cfg(test)]
pub mod testing;
pub mod transport;

pub use adapter::{CsrfToken, FetchAdapter, Payload};
pub use error::FetchError;
pub use transport::{GlooTransport, HttpRequest, HttpResponse, HttpTransport};
