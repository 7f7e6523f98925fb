//! Config commands

use crate::config::{Config, DEFAULT_API_URL};
use crate::ConfigCommands;

pub fn handle(action: ConfigCommands, profile: Option<&str>) -> anyhow::Result<()> {
    match action {
        ConfigCommands::Init => {
            let config = Config { api_url: Some(DEFAULT_API_URL.to_string()), ..Config::default() };
            let path = config.save(profile)?;
            println!("Configuration initialized at {}", path.display());
        }
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load(profile)?;
            config.set(&key, value)?;
            config.save(profile)?;
            println!("Set {key} successfully");
        }
        ConfigCommands::Get { key } => {
            let config = Config::load(profile)?;
            println!("{key}: {}", config.get(&key)?.unwrap_or("(not set)"));
        }
        ConfigCommands::List => {
            let config = Config::load(profile)?;
            for key in Config::KEYS {
                println!("{key}: {}", config.get(key)?.unwrap_or("(not set)"));
            }
        }
    }
    Ok(())
}
