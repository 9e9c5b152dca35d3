//! Language-model backend and report synthesis.
//!
//! [`ReportSynthesizer`] derives finding candidates from a signal bundle,
//! asks the configured [`LlmProvider`] to word them, validates the answer and
//! applies deterministic ranking and confidence before returning a report.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::use_cases::{ReportSynthesizer, SynthesisError};
pub use domain::*;
pub use infrastructure::prompts;
pub use infrastructure::providers::{
    OpenAIProvider, ResilienceConfig, ResilientProvider, build_provider,
};
pub use infrastructure::ResponseParser;
