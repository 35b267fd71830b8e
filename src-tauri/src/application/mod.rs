pub mod bootstrap;
pub mod calendar_state;
pub mod commands;
pub mod routes;
