pub mod endpoint;
pub mod filter_state;
