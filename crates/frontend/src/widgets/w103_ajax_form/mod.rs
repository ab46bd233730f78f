pub mod controller;
pub mod view;

pub use controller::{SubmissionController, SubmissionModel, SubmitOutcome};
pub use view::bind;
