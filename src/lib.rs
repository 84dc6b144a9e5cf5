pub mod api;
pub mod config;
pub mod courses;
pub mod extract;
pub mod index;
pub mod output;
pub mod reconcile;
pub mod schema;
pub mod scrape;
