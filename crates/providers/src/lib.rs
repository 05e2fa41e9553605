//! Language-model backends for Ask PanDA.
//!
//! All providers implement the `askpanda_core::Provider` trait.
//! The factory builds the one named in configuration.

pub mod factory;
pub mod openai_compat;

pub use factory::{build_from_config, default_base_url, embedding_model};
pub use openai_compat::OpenAiCompatProvider;
