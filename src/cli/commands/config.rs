//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::{SdbError, SdbResult};
use crate::ui::{self, UiContext};

/// Keys accepted by `sdb config set`
const VALID_KEYS: [&str; 6] = [
    "general.log_format",
    "engine.binary",
    "facts.builtin",
    "facts.timeout_secs",
    "build.push",
    "build.prefix",
];

/// Execute the config command
pub async fn execute(args: ConfigArgs, manager: &ConfigManager, config: &Config) -> SdbResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
        Some(ConfigAction::Set { key, value }) => {
            let mut config = config.clone();
            set_value(&mut config, &key, &value)?;
            manager.save(&config).await?;
            ui::step_ok(&UiContext::detect(), &format!("Set {} = {}", key, value));
        }
    }

    Ok(())
}

fn show_config(config: &Config) -> SdbResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

async fn init_config(manager: &ConfigManager, force: bool) -> SdbResult<()> {
    let ctx = UiContext::detect();
    let path = manager.path();

    if path.exists() && !force {
        ui::step_warn(
            &ctx,
            &format!(
                "Config already exists at {} (use --force to overwrite)",
                path.display()
            ),
        );
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    ui::step_ok_detail(&ctx, "Configuration initialized", &path.display().to_string());

    Ok(())
}

fn set_value(config: &mut Config, key: &str, value: &str) -> SdbResult<()> {
    match key {
        "general.log_format" => match value {
            "text" | "json" => config.general.log_format = value.to_string(),
            _ => {
                return Err(SdbError::User(format!(
                    "Invalid log format: {}. Use text or json",
                    value
                )))
            }
        },
        "engine.binary" => config.engine.binary = value.to_string(),
        "facts.builtin" => config.facts.builtin = parse_bool(value)?,
        "facts.timeout_secs" => {
            config.facts.timeout_secs = value
                .parse()
                .map_err(|_| SdbError::User(format!("Invalid number: {}", value)))?
        }
        "build.push" => config.build.push = parse_bool(value)?,
        "build.prefix" => config.build.prefix = value.to_string(),
        _ => {
            return Err(SdbError::User(format!(
                "Unknown config key: {} (valid keys: {})",
                key,
                VALID_KEYS.join(", ")
            )))
        }
    }
    Ok(())
}

fn parse_bool(value: &str) -> SdbResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(SdbError::User(format!(
            "Invalid boolean value: {}. Use true/false",
            value
        ))),
    }
}
