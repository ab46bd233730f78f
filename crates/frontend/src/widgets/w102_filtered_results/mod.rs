pub mod controller;
pub mod view;

pub use controller::{RefreshController, RefreshModel, ResultsContent};
pub use view::bind;
