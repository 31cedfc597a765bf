//! Scoring backend implementations.
//!
//! This module contains implementations of the `ScoreBackend` trait.
//!
//! ## Available Backends
//!
//! - [`mock`] - A scriptable mock backend for testing
//! - [`openai`] - OpenAI-compatible chat-completions API (requires the
//!   `openai` feature)
//!
//! ## Implementing a Custom Backend
//!
//! To score through a different provider, implement the `ScoreBackend`
//! trait:
//!
//! ```rust,ignore
//! use scorepipe::core::{ScoreBackend, ScoreError, ScorePayload, ScoreRequest};
//! use async_trait::async_trait;
//!
//! #[derive(Debug)]
//! pub struct MyBackend {
//!     // Your backend's configuration
//! }
//!
//! #[async_trait]
//! impl ScoreBackend for MyBackend {
//!     fn name(&self) -> &str {
//!         "my-backend"
//!     }
//!
//!     async fn score(&self, request: &ScoreRequest) -> Result<ScorePayload, ScoreError> {
//!         // Perform one remote call for the batch
//!         todo!()
//!     }
//!
//!     async fn health_check(&self) -> Result<(), ScoreError> {
//!         Ok(())
//!     }
//! }
//! ```

pub mod mock;

#[cfg(feature = "openai")]
pub mod openai;

// Re-exports
pub use mock::MockBackend;

#[cfg(feature = "openai")]
pub use openai::OpenAiBackend;
