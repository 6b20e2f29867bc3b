//! The LLM-response contract layer: prompt builders, response
//! extraction, and the per-task dispatch pipeline.

pub mod dispatcher;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod prompts;
