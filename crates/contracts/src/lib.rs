pub mod academico;
pub mod shared;
