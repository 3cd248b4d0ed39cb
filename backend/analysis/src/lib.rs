//! Analysis client for Plastiscan.
//!
//! Packages sample images with a fixed instruction and response schema into a
//! single call to a remote vision model, then parses the JSON answer into a
//! `ContaminationReport`.

pub mod analyzer;
pub mod parse;
pub mod prompt;
pub mod providers;
pub mod schema;

pub use analyzer::Analyzer;
pub use parse::parse_report;
pub use prompt::{build_prompt, ANALYSIS_PROMPT};
pub use providers::{build_provider, GeminiProvider, MockProvider, OpenAiProvider};
pub use schema::{response_schema, to_gemini_schema};
