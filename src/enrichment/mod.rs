//! Lead enrichment
//!
//! One search-augmented model request per company, answered with a JSON
//! object that may be wrapped in prose.

mod client;
mod parse;

pub use client::{output_text, research_prompt, CompanyResearch, ResearchRequest, ResponsesClient};
pub use parse::{extract_json_object, parse_profile, CompanyProfile};
