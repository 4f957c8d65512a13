pub mod app;
pub mod config;
pub mod db;
pub mod edit_view;
pub mod errors;
pub mod images;
pub mod list_view;
pub mod live;
pub mod logging;
pub mod models;
pub mod platform;
pub mod repository;
pub mod view_model;

#[cfg(feature = "desktop")]
mod desktop;

#[cfg(feature = "desktop")]
pub use desktop::run;
