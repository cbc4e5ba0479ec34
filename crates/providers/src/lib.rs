//! LLM provider implementations for Armory.
//!
//! The API stage of the armory turns each configured endpoint into a
//! connected `armory_core::Provider` through a `ProviderFactory`.

pub mod factory;
pub mod openai_compat;

pub use factory::OpenAiCompatFactory;
pub use openai_compat::OpenAiCompatProvider;
