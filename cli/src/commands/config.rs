//! Config commands

use crate::config::Config;
use crate::ConfigCommands;
use anyhow::{bail, Result};

const KEYS: [&str; 4] = ["api_url", "name", "email", "draft_dir"];

fn field<'a>(config: &'a mut Config, key: &str) -> Result<&'a mut Option<String>> {
    Ok(match key {
        "api_url" => &mut config.api_url,
        "name" => &mut config.name,
        "email" => &mut config.email,
        "draft_dir" => &mut config.draft_dir,
        _ => bail!("Unknown config key: {} (expected one of {})", key, KEYS.join(", ")),
    })
}

pub fn handle(action: ConfigCommands, profile: Option<&str>) -> Result<()> {
    match action {
        ConfigCommands::Init => {
            let path = Config::default().save(profile)?;
            println!("Configuration initialized at {}", path.display());
        }
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load(profile)?;
            *field(&mut config, &key)? = Some(value);
            config.save(profile)?;
            println!("Set {} successfully", key);
        }
        ConfigCommands::Get { key } => {
            let mut config = Config::load(profile)?;
            let value = field(&mut config, &key)?.clone();
            println!("{}: {}", key, value.unwrap_or_else(|| "(not set)".into()));
        }
        ConfigCommands::List => {
            let mut config = Config::load(profile)?;
            for key in KEYS {
                let value = field(&mut config, key)?.clone();
                println!("{}: {}", key, value.unwrap_or_else(|| "(not set)".into()));
            }
            println!("debounce_ms: {}", config.engine.debounce_ms);
        }
    }
    Ok(())
}
