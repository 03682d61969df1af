//! Upstream completion providers for parley
//!
//! This crate provides the provider abstraction used by the relay server and
//! a client for OpenAI-compatible chat completion APIs such as Groq.

pub mod base;
pub mod openai_compat;

pub use base::{Completion, CompletionProvider, GenerationParams, ProviderError, ProviderResult};
pub use openai_compat::OpenAiCompatClient;
