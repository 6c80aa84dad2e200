pub mod app;
pub mod cli;
pub mod form;
pub mod storage;
pub mod terminal;
pub mod types;
pub mod utils;
