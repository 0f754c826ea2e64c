// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::{CONFIG_KIND, CONFIG_VERSION, SecureSearchConfig};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Path of the YAML config file
pub const CONFIG_PATH_ENV_VAR: &str = "SECURE_SEARCH_CONFIG";

/// Prefix of variables overriding individual values, path segments are
/// separated by [`CONFIG_SEPARATOR_ENV_VAR`], e.g.
/// `SECURE_SEARCH_CONFIG__DECISION_CACHE__TTL=5000`
pub const CONFIG_PREFIX_ENV_VAR: &str = "SECURE_SEARCH_CONFIG";
pub const CONFIG_SEPARATOR_ENV_VAR: &str = "__";

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Assembles [`SecureSearchConfig`] from built-in defaults, an optional YAML
/// file and environment overrides, in increasing order of precedence.
#[derive(Debug, Default, Clone)]
pub struct ConfigLoader {
    path: Option<PathBuf>,
    env_path: Option<PathBuf>,
    overrides: config::Map<String, String>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Self::new().with_env_vars(std::env::vars())
    }

    /// Takes precedence over the path found in [`CONFIG_PATH_ENV_VAR`]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_env_vars(mut self, vars: impl IntoIterator<Item = (String, String)>) -> Self {
        let override_prefix = format!("{CONFIG_PREFIX_ENV_VAR}{CONFIG_SEPARATOR_ENV_VAR}");

        for (name, value) in vars {
            if name == CONFIG_PATH_ENV_VAR {
                self.env_path = Some(PathBuf::from(value));
            } else if name.starts_with(&override_prefix) {
                self.overrides.insert(name, value);
            }
        }

        self
    }

    pub fn load(&self) -> Result<SecureSearchConfig, ConfigError> {
        self.validate_overrides()?;

        let content = match self.path.as_ref().or(self.env_path.as_ref()) {
            Some(path) => read_manifest_content(path)?,
            None => None,
        };

        let mut builder = config::Config::builder();
        if let Some(content) = content {
            builder = builder.add_source(config::File::from_str(&content, config::FileFormat::Yaml));
        }

        builder
            .add_source(
                config::Environment::with_prefix(CONFIG_PREFIX_ENV_VAR)
                    .prefix_separator(CONFIG_SEPARATOR_ENV_VAR)
                    .separator(CONFIG_SEPARATOR_ENV_VAR)
                    .try_parsing(true)
                    .source(Some(self.overrides.clone())),
            )
            .build()
            .and_then(|config| config.try_deserialize::<SecureSearchConfig>())
            .map_err(ConfigError::Invalid)
    }

    fn validate_overrides(&self) -> Result<(), ConfigError> {
        let override_prefix = format!("{CONFIG_PREFIX_ENV_VAR}{CONFIG_SEPARATOR_ENV_VAR}");

        for name in self.overrides.keys() {
            let path = name.strip_prefix(&override_prefix).unwrap_or_default();
            if path.split(CONFIG_SEPARATOR_ENV_VAR).any(str::is_empty) {
                return Err(ConfigError::InvalidOverride { var: name.clone() });
            }
        }

        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Deserialize)]
struct Manifest {
    kind: String,
    version: u64,
    #[serde(default)]
    content: serde_yaml::Value,
}

/// Reads the manifest-wrapped file and returns its `content` section as YAML
fn read_manifest_content(path: &Path) -> Result<Option<String>, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let parse_error = |source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    };

    let manifest: Manifest = serde_yaml::from_str(&text).map_err(parse_error)?;

    if manifest.kind != CONFIG_KIND || manifest.version != CONFIG_VERSION {
        return Err(ConfigError::UnsupportedManifest {
            path: path.to_path_buf(),
            kind: manifest.kind,
            version: manifest.version,
        });
    }

    if manifest.content.is_null() {
        return Ok(None);
    }

    serde_yaml::to_string(&manifest.content)
        .map(Some)
        .map_err(parse_error)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unable to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config file {path} is not valid YAML")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Config file {path} has unsupported kind {kind} of version {version}")]
    UnsupportedManifest {
        path: PathBuf,
        kind: String,
        version: u64,
    },

    #[error("Malformed config override {var}")]
    InvalidOverride { var: String },

    #[error("Invalid configuration")]
    Invalid(#[source] config::ConfigError),
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
