pub mod api_utils;
pub mod debounce;
pub mod dom;
pub mod http;
pub mod messages;
pub mod options;
pub mod query;
pub mod sequence;
