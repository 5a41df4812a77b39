#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::collections::HashMap;
use std::env;
use std::path;
use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use clap::ArgMatches;
use clap::Command;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;
use tokio::fs;

static CONFIG: Lazy<DashMap<String, String>> = Lazy::new(DashMap::new);

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ConfigKey {
    AskTimeout,
    BackendHealthCheckTimeout,
    BackendURL,
    ConfigFile,
    RequestTimeout,
    Username,
}

impl ConfigKey {
    fn is_timeout(&self) -> bool {
        return matches!(
            self,
            ConfigKey::AskTimeout | ConfigKey::BackendHealthCheckTimeout | ConfigKey::RequestTimeout
        );
    }
}

pub struct Config {}

impl Config {
    pub fn get(key: ConfigKey) -> String {
        if let Some(val) = CONFIG.get(&key.to_string()) {
            return val.to_string();
        }

        return Config::default(key);
    }

    pub fn set(key: ConfigKey, value: &str) {
        CONFIG.insert(key.to_string(), value.to_string());
    }

    /// Reads a millisecond timeout key.
    pub fn duration(key: ConfigKey) -> Result<Duration> {
        let val = Config::get(key);
        let millis = match val.parse::<u64>() {
            Ok(millis) => millis,
            Err(_) => bail!(format!("{key} must be a number of milliseconds, got '{val}'")),
        };

        return Ok(Duration::from_millis(millis));
    }

    pub fn default(key: ConfigKey) -> String {
        if key == ConfigKey::Username {
            let mut user = env::var("USER").unwrap_or_else(|_| return "".to_string());
            if user.is_empty() {
                user = "User".to_string();
            }

            return user;
        }

        let config_path = dirs::config_dir()
            .unwrap_or_else(|| return path::PathBuf::from("."))
            .join("uploadit/config.toml");

        let res = match key {
            ConfigKey::AskTimeout => "120000",
            ConfigKey::BackendHealthCheckTimeout => "1000",
            ConfigKey::BackendURL => "http://localhost:8000",
            ConfigKey::RequestTimeout => "30000",

            // Special
            ConfigKey::ConfigFile => return config_path.to_string_lossy().to_string(),
            ConfigKey::Username => "",
        };

        return res.to_string();
    }

    /// Resolves every key from defaults, then the TOML config file, then CLI flags
    /// and environment variables. Nothing is applied unless all of it is valid.
    pub async fn load(clap_arg_matches: Vec<&ArgMatches>) -> Result<()> {
        let mut resolved: HashMap<ConfigKey, String> = HashMap::new();
        for key in ConfigKey::iter() {
            resolved.insert(key, Config::default(key));
        }

        let mut config_file = Config::default(ConfigKey::ConfigFile);
        for matches in clap_arg_matches.as_slice() {
            if let Ok(Some(arg_config_file)) =
                matches.try_get_one::<String>(&ConfigKey::ConfigFile.to_string())
            {
                config_file = arg_config_file.to_string();
            }
        }

        let config_path = path::PathBuf::from(&config_file);
        if config_path.exists() {
            let toml_str = fs::read_to_string(config_path).await?;
            let doc = toml_str.parse::<toml_edit::Document>()?;

            for key in ConfigKey::iter() {
                if let Some(val) = doc.get(&key.to_string()) {
                    if let Some(val_int) = val.as_integer() {
                        resolved.insert(key, val_int.to_string());
                    } else if let Some(val_str) = val.as_str() {
                        if val_str.is_empty() {
                            continue;
                        }
                        resolved.insert(key, val_str.to_string());
                    }
                }
            }
        }
        resolved.insert(ConfigKey::ConfigFile, config_file);

        for key in ConfigKey::iter() {
            for matches in clap_arg_matches.as_slice() {
                if let Ok(Some(val)) = matches.try_get_one::<String>(&key.to_string()) {
                    if val.is_empty() {
                        continue;
                    }
                    resolved.insert(key, val.to_string());
                }
            }
        }

        for (key, val) in resolved.iter() {
            if key.is_timeout() && val.parse::<u64>().is_err() {
                bail!(format!(
                    "Configuration has an invalid value for key '{key}': {val}\nExpected a number of milliseconds."
                ));
            }
        }

        for (key, val) in resolved.iter() {
            Config::set(*key, val);
        }

        tracing::debug!(
            username = Config::get(ConfigKey::Username),
            backend_url = Config::get(ConfigKey::BackendURL),
            request_timeout = Config::get(ConfigKey::RequestTimeout),
            ask_timeout = Config::get(ConfigKey::AskTimeout),
            "config"
        );

        return Ok(());
    }

    pub fn serialize_default(cmd: Command) -> String {
        let toml_str = ConfigKey::iter()
            .filter_map(|key| {
                if key == ConfigKey::ConfigFile {
                    return None;
                }

                if key == ConfigKey::Username {
                    return Some(
                        "# Your user name displayed above your questions.\n# username = \"\""
                            .to_string(),
                    );
                }

                let arg = cmd
                    .get_arguments()
                    .find(|e| return e.get_long() == Some(key.to_string().as_str()))?;

                let description = arg
                    .get_help()
                    .map(|e| return e.to_string())
                    .unwrap_or_default()
                    .split("[default:")
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string();

                let mut val = Config::default(key);
                if val.is_empty() {
                    val = format!("# {key} = \"\"");
                } else if val.parse::<u64>().is_ok() {
                    val = format!("{key} = {val}");
                } else {
                    val = format!("{key} = \"{val}\"");
                }

                return Some(format!("# {description}\n{val}"));
            })
            .collect::<Vec<String>>()
            .join("\n\n");

        return toml_str;
    }
}
