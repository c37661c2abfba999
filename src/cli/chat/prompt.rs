use rustyline::{Config, Editor, Result};

pub fn generate_prompt(custom_prompt: Option<&str>) -> String {
    custom_prompt.unwrap_or("you> ").to_string()
}

/// Line editor for the interactive loop. History stays in memory only.
pub fn rl() -> Result<Editor<()>> {
    let config = Config::builder()
        .history_ignore_space(true)
        .history_ignore_dups(true)
        .auto_add_history(false)
        .build();
    Editor::with_config(config)
}
