pub mod api;
pub mod app;
pub mod commerce;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod local_store;
pub mod models;
pub mod plants;
pub mod profile;
pub mod session;
pub mod state;
pub mod stats;
pub mod storage;
pub mod tasks;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use storage::load_data;
