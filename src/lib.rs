pub mod analytics;
pub mod api;
pub mod app;
pub mod config;
pub mod links;
pub mod models;
pub mod redirect;
pub mod storage;
pub mod suggest;

pub use app::{build_app, App};
