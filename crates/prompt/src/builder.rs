//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use handlebars::Handlebars;
use refchat_core::{AppError, AppResult};
use std::collections::HashMap;

/// Render a prompt definition with the given variables.
///
/// Every variable listed in `definition.inputs` must be present; values are
/// inserted verbatim (no HTML escaping).
///
/// # Example
/// ```no_run
/// use refchat_prompt::{build_prompt, PromptSet};
/// use std::collections::HashMap;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompts = PromptSet::builtin()?;
/// let mut vars = HashMap::new();
/// vars.insert("query".to_string(), "Plan a 3-day trip to Rome".to_string());
/// vars.insert("chat_history".to_string(), String::new());
///
/// let built = build_prompt(&prompts.draft, vars)?;
/// println!("{}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::trace!("Building prompt: {}", definition.id);

    if let Some(missing) = definition
        .inputs
        .iter()
        .find(|name| !variables.contains_key(name.as_str()))
    {
        return Err(AppError::Prompt(format!(
            "Missing input '{}' for prompt {}",
            missing, definition.id
        )));
    }

    let rendered = render_template(&definition.template, &variables)?;

    Ok(BuiltPrompt::new(
        None,
        rendered,
        definition.id.clone(),
        variables,
    ))
}

/// Render a Handlebars template with variables.
///
/// Strict mode turns references to unknown variables into errors.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.set_strict_mode(true);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PromptBehavior, PromptOutputSpec};

    fn create_test_definition(template: &str, inputs: &[&str]) -> PromptDefinition {
        PromptDefinition {
            id: "test.prompt".to_string(),
            title: "Test".to_string(),
            api_version: "1.0".to_string(),
            created_by: "test".to_string(),
            behavior: PromptBehavior {
                tone: "helpful".to_string(),
                style: "concise".to_string(),
            },
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            template: template.to_string(),
            output: PromptOutputSpec {
                format: "markdown".to_string(),
            },
        }
    }

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_simple_template() {
        let result = render_template("Query: {{query}}", &vars(&[("query", "Hello")]));
        assert_eq!(result.unwrap(), "Query: Hello");
    }

    #[test]
    fn test_render_does_not_escape() {
        let result = render_template(
            "{{history}}",
            &vars(&[("history", "user: <b>R&D</b> \"quotes\"")]),
        );
        assert_eq!(result.unwrap(), "user: <b>R&D</b> \"quotes\"");
    }

    #[test]
    fn test_values_are_not_reinterpreted() {
        let result = render_template("Q: {{query}}", &vars(&[("query", "{{chat_history}}")]));
        assert_eq!(result.unwrap(), "Q: {{chat_history}}");
    }

    #[test]
    fn test_build_prompt() {
        let def = create_test_definition("Query: {{query}}\nHistory: {{chat_history}}", &["query", "chat_history"]);
        let built = build_prompt(
            &def,
            vars(&[("query", "Plan a trip"), ("chat_history", "user: hi")]),
        )
        .unwrap();

        assert_eq!(built.user, "Query: Plan a trip\nHistory: user: hi");
        assert_eq!(built.system, None);
        assert_eq!(built.metadata.source_prompt_id, "test.prompt");
        assert_eq!(built.metadata.resolved_variables.len(), 2);
    }

    #[test]
    fn test_build_prompt_missing_declared_input() {
        let def = create_test_definition("Query: {{query}}", &["query", "chat_history"]);
        let err = build_prompt(&def, vars(&[("query", "x")])).unwrap_err();
        assert!(err.to_string().contains("chat_history"));
    }

    #[test]
    fn test_render_template_undeclared_variable_fails() {
        let result = render_template("Question: {{missing}}", &HashMap::new());
        assert!(matches!(result, Err(AppError::Prompt(_))));
    }

    #[test]
    fn test_render_template_syntax_error() {
        let result = render_template("Question: {{#if}}", &HashMap::new());
        assert!(result.is_err());
    }
}
