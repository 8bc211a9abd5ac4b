//! Prompt loader for built-in and workspace prompt definitions.
//!
//! The three pipeline prompts ship inside the binary. A workspace may
//! replace any of them with `.refchat/prompts/<id>.yml`.

use crate::types::PromptDefinition;
use refchat_core::{AppError, AppResult};
use std::path::{Path, PathBuf};

/// Drafts the answer for a query.
pub const DRAFT_PROMPT_ID: &str = "answer.draft";
/// Judges whether a draft answers the query.
pub const EVALUATE_PROMPT_ID: &str = "answer.evaluate";
/// Rewrites the query after a failed evaluation.
pub const REFINE_PROMPT_ID: &str = "query.refine";

const BUILTIN_PROMPTS: &[(&str, &str)] = &[
    (DRAFT_PROMPT_ID, include_str!("../prompts/answer.draft.yml")),
    (EVALUATE_PROMPT_ID, include_str!("../prompts/answer.evaluate.yml")),
    (REFINE_PROMPT_ID, include_str!("../prompts/query.refine.yml")),
];

/// The prompts used by the query pipeline.
#[derive(Debug, Clone)]
pub struct PromptSet {
    pub draft: PromptDefinition,
    pub evaluate: PromptDefinition,
    pub refine: PromptDefinition,
}

impl PromptSet {
    /// The prompts compiled into the binary.
    pub fn builtin() -> AppResult<Self> {
        Ok(Self {
            draft: load_builtin(DRAFT_PROMPT_ID)?,
            evaluate: load_builtin(EVALUATE_PROMPT_ID)?,
            refine: load_builtin(REFINE_PROMPT_ID)?,
        })
    }

    /// The prompts for a workspace, honoring overrides.
    pub fn load(workspace_path: &Path) -> AppResult<Self> {
        Ok(Self {
            draft: load_prompt(workspace_path, DRAFT_PROMPT_ID)?,
            evaluate: load_prompt(workspace_path, EVALUATE_PROMPT_ID)?,
            refine: load_prompt(workspace_path, REFINE_PROMPT_ID)?,
        })
    }
}

/// Load a prompt definition by ID.
///
/// Looks for `.refchat/prompts/<id>.yml` in the workspace first and falls
/// back to the built-in definition.
///
/// # Example
/// ```no_run
/// use refchat_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), "answer.draft")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let override_file = prompts_dir(workspace_path).join(format!("{}.yml", prompt_id));

    if override_file.exists() {
        tracing::debug!("Loading prompt override from: {:?}", override_file);

        let contents = std::fs::read_to_string(&override_file).map_err(|e| {
            AppError::Prompt(format!(
                "Failed to read prompt file {:?}: {}",
                override_file, e
            ))
        })?;

        let definition = parse_prompt(&contents, &override_file.display().to_string())?;
        if definition.id != prompt_id {
            return Err(AppError::Prompt(format!(
                "Prompt file {:?} declares id '{}', expected '{}'",
                override_file, definition.id, prompt_id
            )));
        }

        tracing::info!("Loaded prompt override: {} ({})", definition.id, definition.title);
        return Ok(definition);
    }

    load_builtin(prompt_id)
}

/// IDs of the prompts compiled into the binary.
pub fn builtin_prompt_ids() -> Vec<&'static str> {
    BUILTIN_PROMPTS.iter().map(|(id, _)| *id).collect()
}

/// List prompt override IDs present in the workspace.
pub fn list_prompts(workspace_path: &Path) -> AppResult<Vec<String>> {
    let prompts_dir = prompts_dir(workspace_path);

    if !prompts_dir.exists() {
        return Ok(Vec::new());
    }

    let mut prompt_ids = Vec::new();

    for entry in walkdir::WalkDir::new(&prompts_dir)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("yml") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                prompt_ids.push(stem.to_string());
            }
        }
    }

    Ok(prompt_ids)
}

fn prompts_dir(workspace_path: &Path) -> PathBuf {
    workspace_path.join(".refchat").join("prompts")
}

fn load_builtin(prompt_id: &str) -> AppResult<PromptDefinition> {
    let (_, contents) = BUILTIN_PROMPTS
        .iter()
        .find(|(id, _)| *id == prompt_id)
        .ok_or_else(|| AppError::Prompt(format!("Unknown prompt: {}", prompt_id)))?;

    parse_prompt(contents, &format!("built-in {}", prompt_id))
}

fn parse_prompt(contents: &str, origin: &str) -> AppResult<PromptDefinition> {
    let definition: PromptDefinition = serde_yaml::from_str(contents)
        .map_err(|e| AppError::Prompt(format!("Failed to parse prompt YAML {}: {}", origin, e)))?;

    validate_prompt(&definition)?;
    Ok(definition)
}

fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(format!(
            "Prompt template cannot be empty: {}",
            def.id
        )));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    if let Some(input) = def
        .inputs
        .iter()
        .find(|input| !def.template.contains(&format!("{{{{{}}}}}", input)))
    {
        return Err(AppError::Prompt(format!(
            "Prompt {} declares input '{}' but never uses it",
            def.id, input
        )));
    }

    Ok(())
}
