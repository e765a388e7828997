// Copyright (c) The ut-assign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by ut-assign.

use crate::{case::CaseField, group::MatchKey, job::DispatchKind};
use camino::Utf8PathBuf;
use config::ConfigError;
use itertools::Itertools;
use std::fmt;
use thiserror::Error;

/// An error that occurred while ingesting a single case from the inventory.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("case {index}{} {kind}", DisplayCaseName(.summary.as_deref()))]
pub struct CaseParseError {
    index: usize,
    summary: Option<String>,
    kind: CaseParseErrorKind,
}

impl CaseParseError {
    pub(crate) fn missing_field(index: usize, summary: Option<&str>, field: CaseField) -> Self {
        Self {
            index,
            summary: summary.map(ToOwned::to_owned),
            kind: CaseParseErrorKind::MissingField(field),
        }
    }

    pub(crate) fn invalid_field(
        index: usize,
        summary: Option<&str>,
        attr: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            index,
            summary: summary.map(ToOwned::to_owned),
            kind: CaseParseErrorKind::InvalidField {
                attr: attr.into(),
                message: message.into(),
            },
        }
    }

    /// The position of the case in the inventory.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The kind of error.
    pub fn kind(&self) -> &CaseParseErrorKind {
        &self.kind
    }
}

struct DisplayCaseName<'a>(Option<&'a str>);

impl fmt::Display for DisplayCaseName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(name) => write!(f, " (`{name}`)"),
            None => Ok(()),
        }
    }
}

/// The kind of error that occurred while ingesting a case.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[non_exhaustive]
pub enum CaseParseErrorKind {
    /// A required attribute was missing or null.
    #[error("is missing required attribute `{0}`")]
    MissingField(CaseField),

    /// An attribute had a value of the wrong shape.
    #[error("has invalid attribute `{attr}`: {message}")]
    InvalidField {
        /// The attribute name.
        attr: String,

        /// What was wrong with it.
        message: String,
    },
}

/// An error that occurred while parsing filter criteria.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CaseFilterParseError {
    /// The JSON filter could not be parsed.
    #[error("case filter is not a JSON object of attribute to list of values")]
    Json(#[source] serde_json::Error),

    /// A command-line filter argument was not of the form `ATTR=VALUE[,VALUE...]`.
    #[error("invalid filter `{0}`: expected ATTR=VALUE[,VALUE...]")]
    InvalidArg(String),
}

impl CaseFilterParseError {
    pub(crate) fn json(err: serde_json::Error) -> Self {
        Self::Json(err)
    }

    pub(crate) fn invalid_arg(arg: impl Into<String>) -> Self {
        Self::InvalidArg(arg.into())
    }
}

/// A fatal error produced while assigning cases to job descriptors.
///
/// Either error aborts the whole run: no descriptors are produced.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[non_exhaustive]
pub enum AssignError {
    /// The application identifier of a case doesn't start with `UT_`.
    #[error("case `{case_name}` has malformed application identifier `{test_app}` (expected prefix `UT_`)")]
    MalformedCase {
        /// The case name.
        case_name: String,

        /// The offending application identifier.
        test_app: String,
    },

    /// A case lacks an attribute required by its dispatch function.
    #[error(
        "case `{case_name}` is missing attribute `{attribute}` required by `{function}` \
         (multiple devices/stages cases must contain at least two test functions)"
    )]
    MissingAttribute {
        /// The case name.
        case_name: String,

        /// The missing attribute.
        attribute: CaseField,

        /// The dispatch function that requires it.
        function: &'static str,
    },
}

impl AssignError {
    pub(crate) fn malformed_case(case_name: impl Into<String>, test_app: impl Into<String>) -> Self {
        Self::MalformedCase {
            case_name: case_name.into(),
            test_app: test_app.into(),
        }
    }

    pub(crate) fn missing_attribute(
        case_name: impl Into<String>,
        attribute: CaseField,
        kind: DispatchKind,
    ) -> Self {
        Self::MissingAttribute {
            case_name: case_name.into(),
            attribute,
            function: kind.function_name(),
        }
    }
}

/// An error that occurred while reading the case inventory.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InventoryError {
    /// The inventory file could not be read.
    #[error("failed to read case inventory at `{path}`")]
    Read {
        /// The inventory path.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: std::io::Error,
    },

    /// The inventory was not a YAML document with a `test cases` list.
    #[error("failed to parse case inventory at `{path}`")]
    Parse {
        /// The inventory path.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: serde_path_to_error::Error<serde_yaml::Error>,
    },

    /// A case in the inventory was invalid.
    #[error("invalid case in inventory at `{path}`")]
    InvalidCase {
        /// The inventory path.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: CaseParseError,
    },
}

/// An error that occurred while reading the CI configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CiConfigError {
    /// The CI configuration file could not be read.
    #[error("failed to read CI config at `{path}`")]
    Read {
        /// The config path.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: std::io::Error,
    },

    /// The CI configuration was not a YAML mapping.
    #[error("failed to parse CI config at `{path}`")]
    Parse {
        /// The config path.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: serde_yaml::Error,
    },

    /// A unit test job had an invalid definition.
    #[error("invalid definition for job `{job}` in CI config at `{path}`")]
    InvalidJob {
        /// The config path.
        path: Utf8PathBuf,

        /// The job name.
        job: String,

        /// The underlying error.
        #[source]
        err: serde_path_to_error::Error<serde_yaml::Error>,
    },
}

/// A declared job that received more descriptors than it has parallel instances.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OversubscribedJob {
    /// The job name.
    pub name: String,

    /// The number of instances declared with `parallel`.
    pub parallel: usize,

    /// The number of instances needed.
    pub needed: usize,
}

/// An error that occurred while binding descriptors to declared CI jobs.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("{}", DisplayBindFailures(.unassigned, .oversubscribed))]
pub struct BindError {
    unassigned: Vec<MatchKey>,
    oversubscribed: Vec<OversubscribedJob>,
}

impl BindError {
    pub(crate) fn new(unassigned: Vec<MatchKey>, oversubscribed: Vec<OversubscribedJob>) -> Self {
        Self {
            unassigned,
            oversubscribed,
        }
    }

    /// Match keys for which no declared job exists.
    pub fn unassigned(&self) -> &[MatchKey] {
        &self.unassigned
    }

    /// Declared jobs that need more parallel instances.
    pub fn oversubscribed(&self) -> &[OversubscribedJob] {
        &self.oversubscribed
    }
}

/// Lists every binding failure, one per line, under a summary line.
struct DisplayBindFailures<'a>(&'a [MatchKey], &'a [OversubscribedJob]);

impl fmt::Display for DisplayBindFailures<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self(unassigned, oversubscribed) = *self;
        writeln!(f, "failed to assign test cases to CI jobs")?;
        if !unassigned.is_empty() {
            writeln!(f, "add jobs to the CI config with these tags:")?;
            for key in unassigned {
                writeln!(f, "  * {}", key.values().join(","))?;
            }
        }
        if !oversubscribed.is_empty() {
            writeln!(f, "too many test cases for these jobs, increase `parallel`:")?;
            for job in oversubscribed {
                writeln!(
                    f,
                    "  * {}: parallel is {}, needs {}",
                    job.name, job.parallel, job.needed
                )?;
            }
        }
        Ok(())
    }
}

/// An error that occurred while parsing the ut-assign config.
#[derive(Debug, Error)]
#[error("failed to parse ut-assign config at `{config_file}`")]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, kind: ConfigParseErrorKind) -> Self {
        Self {
            config_file: config_file.into(),
            kind,
        }
    }

    /// Returns the config file for this error.
    pub fn config_file(&self) -> &Utf8PathBuf {
        &self.config_file
    }

    /// Returns the kind of error.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

/// The kind of error that occurred while parsing the ut-assign config.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseErrorKind {
    /// An error occurred while building the config.
    #[error(transparent)]
    BuildError(Box<ConfigError>),

    /// An error occurred while deserializing the config.
    #[error(transparent)]
    DeserializeError(Box<serde_path_to_error::Error<ConfigError>>),

    /// The job pattern is not a valid regular expression.
    #[error("invalid job-pattern `{pattern}`")]
    InvalidJobPattern {
        /// The pattern.
        pattern: String,

        /// The underlying error.
        #[source]
        err: regex::Error,
    },
}

/// An error that occurred while writing job configuration files.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteConfigError {
    /// A job configuration could not be rendered as YAML.
    #[error("failed to render config for job `{job}`")]
    Render {
        /// The job instance name.
        job: String,

        /// The underlying error.
        #[source]
        err: serde_yaml::Error,
    },

    /// The output directory could not be created.
    #[error("failed to create output directory `{dir}`")]
    CreateDir {
        /// The output directory.
        dir: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: std::io::Error,
    },

    /// A job configuration file could not be written.
    #[error("failed to write job config `{path}`")]
    Write {
        /// The file path.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn bind_error_display() {
        let err = BindError::new(
            vec![MatchKey {
                test_app: "UT_002".to_owned(),
                sdk: "ESP32_IDF".to_owned(),
                test_environment: "UT_T2_1".to_owned(),
            }],
            vec![OversubscribedJob {
                name: "UT_001".to_owned(),
                parallel: 2,
                needed: 3,
            }],
        );

        assert_eq!(
            err.to_string(),
            indoc! {"
                failed to assign test cases to CI jobs
                add jobs to the CI config with these tags:
                  * UT_002,ESP32_IDF,UT_T2_1
                too many test cases for these jobs, increase `parallel`:
                  * UT_001: parallel is 2, needs 3
            "}
        );
        assert!(std::error::Error::source(&err).is_none());
    }
}
