pub mod listing;
pub mod submission;
pub mod turmas;
