pub mod config;
pub mod dictionary;
pub mod error;
pub mod handlers;
pub mod models;
pub mod protocol;
