//! Spotify Session Controller Library
//!
//! This library drives a client-side session against the Spotify Web API:
//! OAuth 2.0 authorization-code login with CSRF protection, token persistence
//! and refresh, and remote playback on one of the user's Spotify Connect
//! devices.
//!
//! # Modules
//!
//! - `api` - HTTP endpoints of the local callback server
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `management` - Token persistence and refresh
//! - `server` - Local HTTP server for OAuth callbacks
//! - `session` - Session state, login flow, device selection and playback
//! - `spotify` - Spotify Web API client implementation
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers
//!
//! # Example
//!
//! ```
//! use sporlplay::{config, session::SessionController, spotify::SpotifyClient};
//!
//! #[tokio::main]
//! async fn main() -> sporlplay::Res<()> {
//!     config::load_env().await?;
//!     let config = config::Config::from_env()?;
//!     let client = SpotifyClient::restore(config.clone()).await;
//!     let (controller, _alerts) = SessionController::new(client, config.callback_url().clone());
//!     controller.restore().await;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod management;
pub mod server;
pub mod session;
pub mod spotify;
pub mod types;
pub mod utils;

/// A convenient Result type alias for operations that may fail.
///
/// Used at the outer layers (binary, CLI plumbing) where the concrete error
/// type does not matter. The core returns typed errors instead.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Waiting for the Spotify redirect...");
/// info!("Found {} devices", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only the binary and the CLI layer use this. Nothing in the session core
/// is fatal to the process.
///
/// # Example
///
/// ```
/// error!("Failed to load configuration");
/// // Program exits here - code after this will not execute
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// Used for recoverable issues the user should notice, such as a rejected
/// redirect or a failed token exchange.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
