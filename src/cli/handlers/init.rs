use std::fs;
use std::path::Path;

use crate::cli::commands::{ConfigArgs, InitArgs};
use crate::io::config_io::{self, CONFIG_FILE, CONFIG_TEMPLATE};

/// Write the commented config template into the app home
pub fn cmd_init(home: &Path, args: InitArgs) -> Result<(), Box<dyn std::error::Error>> {
    let path = home.join(CONFIG_FILE);
    if path.exists() && !args.force {
        return Err(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )
        .into());
    }
    fs::create_dir_all(home)?;
    fs::write(&path, CONFIG_TEMPLATE)?;
    println!("Initialized {}", path.display());
    Ok(())
}

/// `tdb config` prints the effective config, `tdb config <key>` one value,
/// `tdb config <key> <value>` edits the file in place
pub fn cmd_config(home: &Path, args: ConfigArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (config, mut doc) = config_io::read_config(home)?;
    match (args.key, args.value) {
        (None, _) => {
            println!("# {}", home.join(CONFIG_FILE).display());
            print!("{}", toml::to_string(&config)?);
        }
        (Some(key), None) => {
            let effective = toml::Value::try_from(&config)?;
            let value = lookup(&effective, &key)
                .ok_or_else(|| config_io::ConfigError::InvalidKey(key.clone()))?;
            match value {
                toml::Value::String(s) => println!("{}", s),
                other => println!("{}", other),
            }
        }
        (Some(key), Some(value)) => {
            config_io::set_config_value(&mut doc, &key, &value)?;
            config_io::write_config(home, &doc)?;
            println!("{} = {}", key, value);
        }
    }
    Ok(())
}

fn lookup<'a>(value: &'a toml::Value, dotted: &str) -> Option<&'a toml::Value> {
    dotted
        .split('.')
        .try_fold(value, |current, part| current.as_table()?.get(part))
}
