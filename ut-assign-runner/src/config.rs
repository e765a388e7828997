// Copyright (c) The ut-assign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! ut-assign configuration.
//!
//! Configuration is layered: the embedded default config comes first, then either an explicitly
//! passed file or the optional `.config/ut-assign.toml` in the workspace root.

use crate::{
    case_filter::{CaseFilter, FilterValue},
    errors::{ConfigParseError, ConfigParseErrorKind},
};
use camino::Utf8Path;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, builder::DefaultState};
use indexmap::IndexMap;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeSet;

/// Resolved ut-assign configuration.
#[derive(Clone, Debug)]
pub struct AssignConfig {
    job_pattern: Regex,
    case_filter: CaseFilter,
}

impl AssignConfig {
    /// The path, relative to the workspace root, of the optional config file.
    pub const CONFIG_PATH: &'static str = ".config/ut-assign.toml";

    /// The default config, embedded at build time.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// Reads the config from the default config and either `config_file` or the file at
    /// [`Self::CONFIG_PATH`] under `workspace_root`, if it exists.
    pub fn from_sources(
        workspace_root: &Utf8Path,
        config_file: Option<&Utf8Path>,
    ) -> Result<Self, ConfigParseError> {
        let (config_file, source) = match config_file {
            Some(file) => (file.to_owned(), File::new(file.as_str(), FileFormat::Toml)),
            None => {
                let config_file = workspace_root.join(Self::CONFIG_PATH);
                let source = File::new(config_file.as_str(), FileFormat::Toml).required(false);
                (config_file, source)
            }
        };

        let builder = Self::make_default_config().add_source(source);
        let (raw, ignored) = Self::build_and_deserialize_config(builder)
            .map_err(|kind| ConfigParseError::new(&config_file, kind))?;

        if !ignored.is_empty() {
            let keys: Vec<&str> = ignored.iter().map(String::as_str).collect();
            tracing::warn!(
                "ignoring unknown configuration keys in {config_file}: {}",
                keys.join(", "),
            );
        }

        let job_pattern = Regex::new(&raw.job_pattern).map_err(|err| {
            ConfigParseError::new(
                &config_file,
                ConfigParseErrorKind::InvalidJobPattern {
                    pattern: raw.job_pattern.clone(),
                    err,
                },
            )
        })?;

        Ok(Self {
            job_pattern,
            case_filter: CaseFilter::from_map(raw.case_filter),
        })
    }

    /// The regular expression selecting unit test jobs in the CI configuration.
    pub fn job_pattern(&self) -> &Regex {
        &self.job_pattern
    }

    /// The case filter from the config file.
    pub fn case_filter(&self) -> &CaseFilter {
        &self.case_filter
    }

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    /// Returns the deserialized config and the paths of any keys that were ignored.
    fn build_and_deserialize_config(
        builder: ConfigBuilder<DefaultState>,
    ) -> Result<(AssignConfigDeserialize, BTreeSet<String>), ConfigParseErrorKind> {
        let config = builder
            .build()
            .map_err(|error| ConfigParseErrorKind::BuildError(Box::new(error)))?;

        let mut ignored = BTreeSet::new();
        let mut cb = |path: serde_ignored::Path| {
            ignored.insert(path.to_string());
        };
        let ignored_de = serde_ignored::Deserializer::new(config, &mut cb);
        let config: AssignConfigDeserialize = serde_path_to_error::deserialize(ignored_de)
            .map_err(|error| {
                // The config crate also reports the key, which serde_path_to_error already
                // tracks.
                let path = error.path().clone();
                let error = match error.into_inner() {
                    ConfigError::At { error, .. } => *error,
                    other => other,
                };
                ConfigParseErrorKind::DeserializeError(Box::new(serde_path_to_error::Error::new(
                    path, error,
                )))
            })?;

        Ok((config, ignored))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct AssignConfigDeserialize {
    job_pattern: String,
    #[serde(default)]
    case_filter: IndexMap<String, Vec<FilterValue>>,
}
