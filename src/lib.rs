pub mod app;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod remote;
pub mod state;
pub mod stats;
pub mod store;
pub mod timezone;

pub use app::router;
pub use config::AppConfig;
pub use state::AppState;
pub use store::EntryStore;
