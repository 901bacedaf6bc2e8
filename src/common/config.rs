// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

use super::Error;
use serde::de::DeserializeOwned;
use serde::Deserialize;
#[allow(deprecated)]
use std::env::home_dir;
use std::fs::read_to_string;
use std::time::Duration;

/// Looked up in the home directory first, then in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "kas_hook.toml";

/// Configuration parameters read from TOML.
#[derive(Debug)]
pub struct HookConfig {
    debug_enabled: bool,
    toml: String,
}

impl HookConfig {
    /// Creates a configuration builder.
    pub fn builder() -> HookConfigBuilder {
        HookConfigBuilder {
            hook_config: None,
            debug_enabled: false,
            error: None,
        }
    }

    /// Returns `true` if debug is enabled.
    pub fn debug(&self) -> bool {
        self.debug_enabled
    }

    /// Returns configuration parameters.
    pub fn get<T: DeserializeOwned>(&self) -> Result<T, Error> {
        toml::from_str(&self.toml).map_err(|e: toml::de::Error| Error::String(format!("toml: {e}")))
    }

    /// Returns the hook settings, with defaults for anything the file leaves out.
    pub fn settings(&self) -> Result<HookSettings, Error> {
        self.get()
    }
}

/// Builds a `HookConfig` from a file or a string.
pub struct HookConfigBuilder {
    hook_config: Option<HookConfig>,
    debug_enabled: bool,
    error: Option<Error>,
}

impl HookConfigBuilder {
    /// Returns the configuration, or the first error encountered while building it.
    pub fn build(self) -> Result<HookConfig, Error> {
        if let Some(error) = self.error {
            Err(error)
        } else if let Some(hook_config) = self.hook_config {
            Ok(hook_config)
        } else {
            Err(Error::String("config not set".to_string()))
        }
    }

    /// Enables or disables debug output.
    pub fn debug(self, debug_enabled: bool) -> Self {
        Self {
            hook_config: self.hook_config.map(|c| HookConfig {
                debug_enabled,
                toml: c.toml,
            }),
            debug_enabled,
            error: self.error,
        }
    }

    /// Reads `file_name` from the home directory, or else from the working
    /// directory. Absolute paths are read as given.
    pub fn toml_file(self, file_name: &str) -> Self {
        let debug_enabled = self.debug_enabled;
        #[allow(deprecated)]
        let home_path = if file_name.starts_with('/') {
            None
        } else {
            home_dir().and_then(|pathbuf| pathbuf.to_str().map(|path| format!("{path}/{file_name}")))
        };
        let local_path = if file_name.starts_with('/') {
            file_name.to_string()
        } else {
            format!("./{file_name}")
        };
        let result = home_path
            .and_then(|path| read_to_string(path).ok())
            .map(Ok)
            .unwrap_or_else(|| {
                read_to_string(&local_path).map_err(|_| Error::String(format!("{local_path}: cannot read")))
            });
        match result {
            Ok(toml) => Self {
                hook_config: Some(HookConfig {
                    toml,
                    debug_enabled,
                }),
                debug_enabled,
                error: None,
            },
            Err(e) => Self {
                hook_config: None,
                debug_enabled,
                error: Some(e),
            },
        }
    }

    /// Uses `toml` as the configuration text.
    pub fn toml_str(self, toml: &str) -> Self {
        Self {
            hook_config: Some(HookConfig {
                toml: toml.to_string(),
                debug_enabled: self.debug_enabled,
            }),
            debug_enabled: self.debug_enabled,
            error: None,
        }
    }
}

/// All settings of the hook.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct HookSettings {
    /// Provider endpoints and session parameters.
    pub kas: KasSettings,
    /// How to check that a record is publicly visible.
    pub propagation: PropagationSettings,
}

/// Provider endpoints and session parameters.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct KasSettings {
    /// Session creation endpoint.
    pub auth_url: String,
    /// Action dispatch endpoint.
    pub api_url: String,
    /// Requested session lifetime in seconds. The provider extends it on every call.
    pub session_lifetime: u64,
    /// Timeout of a single HTTP request in seconds.
    pub timeout_secs: u64,
}

impl Default for KasSettings {
    fn default() -> Self {
        Self {
            auth_url: "https://kasapi.kasserver.com/soap/KasAuth.php".to_string(),
            api_url: "https://kasapi.kasserver.com/soap/KasApi.php".to_string(),
            session_lifetime: 600,
            timeout_secs: 30,
        }
    }
}

impl KasSettings {
    /// Timeout of a single HTTP request.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Propagation polling parameters.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct PropagationSettings {
    /// Authoritative nameservers, resolved once at startup.
    pub nameservers: Vec<String>,
    /// Pause between two checks in seconds.
    pub interval_secs: u64,
    /// Give up after this many seconds; 0 waits forever.
    pub timeout_secs: u64,
    /// Timeout of a single DNS query in seconds.
    pub query_timeout_secs: u64,
}

impl Default for PropagationSettings {
    fn default() -> Self {
        Self {
            nameservers: vec!["ns5.kasserver.com".to_string(), "ns6.kasserver.com".to_string()],
            interval_secs: 30,
            timeout_secs: 0,
            query_timeout_secs: 5,
        }
    }
}

impl PropagationSettings {
    /// Pause between two checks.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Overall deadline, if any.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Timeout of a single DNS query.
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

/// Provider login, taken from the environment.
#[derive(Clone)]
pub struct KasCredentials {
    /// KAS login name.
    pub username: String,
    /// KAS password.
    pub password: String,
}

impl KasCredentials {
    /// Name of the variable holding the login.
    pub const USERNAME_VAR: &'static str = "KAS_USERNAME";
    /// Name of the variable holding the password.
    pub const PASSWORD_VAR: &'static str = "KAS_PASSWORD";

    /// Reads `KAS_USERNAME` and `KAS_PASSWORD`.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads both credentials through `lookup`. Absent and empty values are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let get = |name: &str| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| Error::Validation(format!("Environment variable {name} not set.")))
        };
        Ok(Self {
            username: get(Self::USERNAME_VAR)?,
            password: get(Self::PASSWORD_VAR)?,
        })
    }
}

impl std::fmt::Debug for KasCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KasCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}
