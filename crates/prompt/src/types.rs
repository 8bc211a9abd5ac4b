//! Prompt types for refchat.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A prompt definition loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Creator identifier
    #[serde(rename = "createdBy", default)]
    pub created_by: String,

    /// Behavioral settings
    pub behavior: PromptBehavior,

    /// Variables the template requires
    #[serde(default)]
    pub inputs: Vec<String>,

    /// Template string with Handlebars syntax
    pub template: String,

    /// Output specification
    pub output: PromptOutputSpec,
}

/// Behavioral settings for prompt execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptBehavior {
    /// Tone (e.g., "helpful", "critical")
    pub tone: String,

    /// Style (e.g., "structured", "concise")
    pub style: String,
}

/// Output specification for the prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptOutputSpec {
    /// Output format (e.g., "text", "markdown")
    pub format: String,
}

/// A fully rendered prompt ready for the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// System message (optional)
    pub system: Option<String>,

    /// User message (required)
    pub user: String,

    pub metadata: BuiltPromptMetadata,
}

/// Metadata about a built prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPromptMetadata {
    /// Source prompt ID
    #[serde(rename = "sourcePromptId")]
    pub source_prompt_id: String,

    /// Template variables that were resolved
    #[serde(rename = "resolvedVariables")]
    pub resolved_variables: HashMap<String, String>,
}

impl BuiltPrompt {
    pub fn new(
        system: Option<String>,
        user: String,
        source_prompt_id: String,
        resolved_variables: HashMap<String, String>,
    ) -> Self {
        Self {
            system,
            user,
            metadata: BuiltPromptMetadata {
                source_prompt_id,
                resolved_variables,
            },
        }
    }
}
