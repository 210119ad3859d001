pub mod client;
pub mod rest;
pub mod socket;

pub use client::NetworkWorker;
pub use rest::ApiClient;
