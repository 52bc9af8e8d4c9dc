// Tailored-resume generation: prompts, the AI orchestrator, and the background pipeline.
// All model calls go through llm_client; nothing here talks to a provider directly.

pub mod applications;
pub mod ats;
pub mod handlers;
pub mod prompts;
pub mod queue;
pub mod retry;
pub mod service;
pub mod template_style;
pub mod worker;
