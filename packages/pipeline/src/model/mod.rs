//! Model provider implementations.

pub mod openrouter;

pub use openrouter::OpenRouter;
