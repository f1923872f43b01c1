//! SIL - K-Beauty skin consultation client library
//!
//! This library drives a personalized skin consultation against the SIL
//! backend: a wizard that builds a five-vector profile (skin, environment,
//! lifestyle, TPO, theme), then a chat with streamed replies.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `profile`: The five-vector profile and its closed enumerations
//! - `api`: Backend client, wire types and the SSE reply stream
//! - `capture`: Photo acquisition, validation, encoding and analysis
//! - `session`: The wizard state machine and per-step forms
//! - `chat`: Chat controller, messages and quick prompts
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`, `commands`: Terminal front end
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use sil_consult::{ApiClient, ChatController, Config, FiveVectors};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     config.validate()?;
//!
//!     let client = Arc::new(ApiClient::new(&config.api)?);
//!     let chat = ChatController::new(client, config.session.language, "dr_beauty");
//!     chat.send("What suits dry skin in winter?", &FiveVectors::default()).await?;
//!     for message in chat.messages() {
//!         println!("{}: {}", message.role, message.content);
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod capture;
pub mod chat;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod language;
pub mod logging;
pub mod profile;
pub mod session;

// Re-export commonly used types
pub use api::{ApiClient, ConsultApi, ConsultStream, VisionApi, WeatherApi};
pub use capture::{CaptureOutcome, CapturePipeline};
pub use chat::{ChatController, ChatEvent, ChatMessage, ExpertInfo};
pub use config::Config;
pub use error::{Result, SilError};
pub use language::Language;
pub use profile::FiveVectors;
pub use session::{SessionEvent, SessionMachine, SessionStep};

#[cfg(test)]
pub mod test_utils;
