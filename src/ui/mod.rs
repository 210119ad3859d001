mod app;
mod components;
pub mod state;
pub mod update;

pub use app::ChatApp;
