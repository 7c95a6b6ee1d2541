pub mod config;
pub mod cursor_store;
pub mod extract;
pub mod harvester;
pub mod models;
pub mod riot;
pub mod shutdown;
pub mod sink;
