//! LLM summarization for the Morning Brief news sections

pub mod summarizer;

pub use summarizer::{verbatim_fallback, Summarizer, SummaryMode};
