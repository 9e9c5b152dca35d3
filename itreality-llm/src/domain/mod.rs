//! LLM domain: messages, the provider trait, errors and finding candidates

pub mod candidates;
pub mod error;
pub mod messages;
pub mod provider;

pub use candidates::*;
pub use error::*;
pub use messages::*;
pub use provider::*;
