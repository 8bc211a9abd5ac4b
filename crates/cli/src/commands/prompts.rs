//! Prompts command handler.

use clap::Args;
use refchat_core::{config::AppConfig, AppResult};
use refchat_prompt::{builtin_prompt_ids, list_prompts, load_prompt};

/// List or show prompt templates
#[derive(Args, Debug)]
pub struct PromptsCommand {
    /// Show the resolved template for one prompt id
    #[arg(long)]
    pub show: Option<String>,
}

impl PromptsCommand {
    /// Execute the prompts command.
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        if let Some(ref id) = self.show {
            let prompt = load_prompt(&config.workspace, id)?;
            println!("# {} ({})", prompt.title, prompt.id);
            println!("inputs: {}", prompt.inputs.join(", "));
            println!();
            println!("{}", prompt.template);
            return Ok(());
        }

        let overrides = list_prompts(&config.workspace)?;
        tracing::debug!("Found {} workspace prompt overrides", overrides.len());

        for id in builtin_prompt_ids() {
            let marker = if overrides.iter().any(|o| o == id) {
                " (overridden)"
            } else {
                ""
            };
            println!("{}{}", id, marker);
        }

        for id in overrides
            .iter()
            .filter(|o| !builtin_prompt_ids().contains(&o.as_str()))
        {
            println!("{} (workspace only, unused)", id);
        }

        Ok(())
    }
}
