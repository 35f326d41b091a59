pub mod command;
pub mod engine;
pub mod limits;
pub mod model;
pub mod observability;
pub mod runner;
pub mod transcript;
