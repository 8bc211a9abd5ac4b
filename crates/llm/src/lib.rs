//! Language model integration for refchat.
//!
//! A provider-agnostic completion interface ([`LlmClient`]) with an Ollama
//! implementation for real use and a scripted client for tests. The pipeline
//! treats the model as plain text in, plain text out.
//!
//! # Example
//! ```no_run
//! use refchat_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Hello, world!", "mistral");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{MockLlmClient, OllamaClient};
