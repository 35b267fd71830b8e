pub mod energy;
pub mod error;
pub mod form;
pub mod grid;
pub mod models;
