use anyhow::Result;

use jobfeed_core::AppConfig;

pub fn run(config: &AppConfig) -> Result<()> {
    let sources = config.sources()?;

    if sources.is_empty() {
        println!("No sources configured.");
        println!("\nAdd [[sources]] entries to {}", AppConfig::config_path().display());
        return Ok(());
    }

    println!("Sources ({}):\n", sources.len());

    for source in &sources {
        let cap = match source.max_items {
            Some(max) => format!(", first {} items", max),
            None => String::new(),
        };

        println!("  {} (ttl {} days{})", source.name, source.ttl.num_days(), cap);
        println!("    URL: {}", source.url);
    }

    Ok(())
}
