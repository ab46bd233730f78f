pub mod controller;
pub mod view;

pub use controller::{CascadeModel, CascadeState, CascadingController};
pub use view::{bind, CascadeHandle};
