//! # pubsummary
//!
//! Publication Summary Generator - terminal front end for the faculty
//! publication backend.
//!
//! ## Modules
//!
//! - [`transport`] - HTTP client for search, roster upload and download
//! - [`normalize`] - JSON / HTML reply to canonical results
//! - [`controller`] - view state and its transitions
//! - [`render`] - profile card and publication table as text
//! - [`export`] - local CSV export
//! - [`config`] - backend location
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pubsummary::{config::Config, controller::Controller, render, transport::BackendClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = BackendClient::new(Config::resolve(None)?)?;
//!     let mut controller = Controller::new(client);
//!     controller.submit_single("Grace Hopper", Some("Yale")).await;
//!     print!("{}", render::view(controller.state()));
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod export;
pub mod model;
pub mod normalize;
pub mod render;
pub mod transport;

pub use error::{PubSummaryError, Result};
