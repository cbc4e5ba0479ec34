//! `armory init`: write a starter configuration.

use super::CommandResult;
use armory_config::AppConfig;
use std::path::Path;

pub async fn run(config_path: &Path) -> CommandResult {
    if config_path.exists() {
        println!("Config already exists at: {}", config_path.display());
        println!("Edit it manually or delete it and re-run `armory init`.");
        return Ok(());
    }

    if let Some(dir) = config_path.parent()
        && !dir.as_os_str().is_empty()
    {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(config_path, AppConfig::default_toml())?;

    println!("Created {}", config_path.display());
    println!();
    println!("Next steps:");
    println!("  1. Set OPENAI_API_KEY (or api_key in the file)");
    println!("  2. armory assemble --kind client 3001");
    println!("  3. armory run --agent 1 --message \"...\"");
    Ok(())
}
