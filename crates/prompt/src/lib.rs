//! Prompt system for refchat.
//!
//! - YAML prompt definitions, built in or overridden per workspace
//! - Handlebars template rendering with declared inputs

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{
    builtin_prompt_ids, list_prompts, load_prompt, PromptSet, DRAFT_PROMPT_ID,
    EVALUATE_PROMPT_ID, REFINE_PROMPT_ID,
};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptBehavior, PromptDefinition, PromptOutputSpec};
