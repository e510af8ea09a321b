//! CLI configuration: thin wrapper around `flichub_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (`--hub`, `--host`, `--port`, `--timeout`).

use flichub_config::{Config, HubProfile, profile_to_bridge_config};
use flichub_core::BridgeConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use flichub_config::{config_path, load_config};

/// Build a `BridgeConfig` from the config file, the active profile, and
/// CLI overrides.
///
/// Flags win over the profile. Without any profile, `--host` alone is
/// enough.
pub fn resolve_bridge_config(global: &GlobalOpts, config: &Config) -> Result<BridgeConfig, CliError> {
    let mut profile = match active_profile(global, config)? {
        Some(profile) => profile.clone(),
        None => {
            let host = global.host.as_deref().ok_or_else(|| CliError::NoConfig {
                path: config_path().display().to_string(),
            })?;
            HubProfile::new(host)
        }
    };

    if let Some(host) = &global.host {
        profile.host.clone_from(host);
    }
    if let Some(port) = global.port {
        profile.port = port;
    }
    if let Some(timeout) = global.timeout {
        profile.ready_timeout_secs = Some(timeout);
    }

    Ok(profile_to_bridge_config(&profile, &config.defaults)?)
}

/// The profile selected by `--hub` or `default_profile`.
///
/// An explicitly named profile must exist; a missing default profile is
/// not an error.
fn active_profile<'a>(global: &GlobalOpts, config: &'a Config) -> Result<Option<&'a HubProfile>, CliError> {
    match (global.hub.as_deref(), config.default_profile.as_deref()) {
        (Some(name), _) => config
            .profiles
            .get(name)
            .map(Some)
            .ok_or_else(|| CliError::ProfileNotFound {
                name: name.into(),
                available: available_profiles(config),
            }),
        (None, Some(name)) => Ok(config.profiles.get(name)),
        (None, None) => Ok(None),
    }
}

fn available_profiles(config: &Config) -> String {
    if config.profiles.is_empty() {
        "(none)".into()
    } else {
        config.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use crate::cli::{ColorMode, OutputFormat};

    use super::*;

    fn global() -> GlobalOpts {
        GlobalOpts {
            hub: None,
            host: None,
            port: None,
            output: OutputFormat::Table,
            color: ColorMode::Never,
            verbose: 0,
            quiet: false,
            timeout: None,
        }
    }

    fn config_with_home() -> Config {
        let mut cfg = Config {
            default_profile: Some("home".into()),
            ..Config::default()
        };
        cfg.profiles.insert("home".into(), HubProfile::new("192.168.1.20"));
        cfg.profiles.insert("cabin".into(), HubProfile::new("10.1.0.2"));
        cfg
    }

    #[test]
    fn default_profile_is_used() {
        let bridge = resolve_bridge_config(&global(), &config_with_home()).unwrap();
        assert_eq!(bridge.address, "192.168.1.20:8124");
    }

    #[test]
    fn flags_override_profile() {
        let opts = GlobalOpts {
            hub: Some("cabin".into()),
            port: Some(9000),
            timeout: Some(5),
            ..global()
        };
        let bridge = resolve_bridge_config(&opts, &config_with_home()).unwrap();
        assert_eq!(bridge.address, "10.1.0.2:9000");
        assert_eq!(bridge.ready_timeout, Duration::from_secs(5));
    }

    #[test]
    fn host_flag_works_without_profiles() {
        let opts = GlobalOpts {
            host: Some("10.0.0.7".into()),
            ..global()
        };
        let bridge = resolve_bridge_config(&opts, &Config::default()).unwrap();
        assert_eq!(bridge.address, "10.0.0.7:8124");
    }

    #[test]
    fn missing_hub_is_reported() {
        assert!(matches!(
            resolve_bridge_config(&global(), &Config::default()),
            Err(CliError::NoConfig { .. })
        ));

        let opts = GlobalOpts {
            hub: Some("office".into()),
            ..global()
        };
        match resolve_bridge_config(&opts, &config_with_home()) {
            Err(CliError::ProfileNotFound { name, available }) => {
                assert_eq!(name, "office");
                assert_eq!(available, "cabin, home");
            }
            other => panic!("expected ProfileNotFound, got {other:?}"),
        }
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let opts = GlobalOpts {
            host: Some("10.0.0.7".into()),
            timeout: Some(0),
            ..global()
        };
        assert!(matches!(
            resolve_bridge_config(&opts, &Config::default()),
            Err(CliError::Validation { .. })
        ));
    }
}
