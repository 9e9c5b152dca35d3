//! Prompt templates for report synthesis

mod templates;

pub use templates::*;
