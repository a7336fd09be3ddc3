use std::path::Path;

use anyhow::Result;

use jobfeed_core::AppConfig;

pub fn run(config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("Config already exists: {}", config_path.display());
        return Ok(());
    }

    AppConfig::default().save_to(config_path)?;
    println!("Wrote default config to {}", config_path.display());

    Ok(())
}
