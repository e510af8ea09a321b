//! Config subcommand handlers. None of these touch the hub.

use flichub_config::Config;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config;
use crate::error::CliError;
use crate::output;

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet)
        }
        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let rendered = render(&cfg, global.output)?;
            output::print_output(&rendered, global.quiet)
        }
    }
}

/// Table view is the TOML file itself; plain lists profile names.
fn render(cfg: &Config, format: OutputFormat) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => Ok(toml::to_string_pretty(cfg)?.trim_end().to_owned()),
        OutputFormat::Plain => Ok(cfg.profiles.keys().cloned().collect::<Vec<_>>().join("\n")),
        _ => output::render_single(format, cfg, |_| String::new(), |_| String::new()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use flichub_config::HubProfile;

    use super::*;

    fn config() -> Config {
        let mut cfg = Config::default();
        cfg.profiles.insert("default".into(), HubProfile::new("10.0.0.5"));
        cfg.profiles.insert("cabin".into(), HubProfile::new("10.1.0.2"));
        cfg
    }

    #[test]
    fn show_renders_toml_and_names() {
        let toml = render(&config(), OutputFormat::Table).unwrap();
        assert!(toml.contains("[profiles.cabin]"));
        assert!(toml.contains("host = \"10.0.0.5\""));

        assert_eq!(render(&config(), OutputFormat::Plain).unwrap(), "cabin\ndefault");
    }

    #[test]
    fn show_renders_json() {
        let json = render(&config(), OutputFormat::JsonCompact).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["profiles"]["cabin"]["port"], 8124);
    }
}
