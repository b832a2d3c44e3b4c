//! # fabula-llm
//!
//! LLM adapters for the Fabula story workshop engine.
//!
//! The engine treats text generation as an external capability behind the
//! [`LLMAdapter`] trait. This crate ships one concrete provider, Google
//! Gemini, which is what the workshop runs against in production.
//!
//! ## Example
//!
//! ```rust,no_run
//! use fabula_llm::{GeminiAdapter, LLMAdapter, LLMMessage};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let adapter = GeminiAdapter::new("api-key", "gemini-2.0-flash");
//!
//!     let messages = vec![
//!         LLMMessage::system("You are a creative story writer."),
//!         LLMMessage::user("Write an opening line about friendship."),
//!     ];
//!
//!     let response = adapter.generate(&messages).await?;
//!     println!("{}", response.content);
//!
//!     Ok(())
//! }
//! ```

mod error;
mod gemini;
mod traits;

pub use error::LLMError;
pub use gemini::GeminiAdapter;
pub use traits::{FinishReason, LLMAdapter, LLMMessage, LLMResponse, Role, TokenUsage};
