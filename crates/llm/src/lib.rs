//! LLM backends for the pet's chat feature.
//!
//! `provider` defines the backend-neutral request/response types and the
//! [`provider::LlmProvider`] trait; `http` talks to OpenAI-compatible chat
//! completion APIs and `local` to an Ollama-style local inference server.

pub mod http;
pub mod local;
pub mod provider;
