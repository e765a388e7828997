// Copyright (c) The ut-assign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{NO_HEADING_TARGET, StderrStyles};
use owo_colors::OwoColorize;
use std::error::Error;
use thiserror::Error;
use ut_assign_metadata::AssignExitCode;
use ut_assign_runner::errors::*;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// The #[error()] strings are placeholders: errors are meant to be printed with display_to_stderr,
// which colorizes them.

/// An expected failure, with a documented exit code.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("could not determine current directory")]
    CurrentDirFailed {
        #[source]
        err: std::io::Error,
    },
    #[error("current directory is not valid UTF-8")]
    CurrentDirInvalidUtf8 {
        #[source]
        err: camino::FromPathBufError,
    },
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("case filter parse error")]
    CaseFilterParseError {
        source_name: &'static str,
        #[source]
        err: CaseFilterParseError,
    },
    #[error("inventory error")]
    InventoryError {
        #[from]
        err: InventoryError,
    },
    #[error("CI config error")]
    CiConfigError {
        #[from]
        err: CiConfigError,
    },
    #[error("assign error")]
    AssignError {
        #[from]
        err: AssignError,
    },
    #[error("bind error")]
    BindError {
        #[from]
        err: BindError,
    },
    #[error("write config error")]
    WriteConfigError {
        #[from]
        err: WriteConfigError,
    },
    #[error("error writing output")]
    WriteOutputError {
        #[source]
        err: std::io::Error,
    },
    #[error("error serializing plan")]
    SerializePlanError {
        #[source]
        err: serde_json::Error,
    },
}

impl ExpectedError {
    pub(crate) fn case_filter_parse_error(
        source_name: &'static str,
        err: CaseFilterParseError,
    ) -> Self {
        Self::CaseFilterParseError { source_name, err }
    }

    pub(crate) fn write_output_error(err: std::io::Error) -> Self {
        Self::WriteOutputError { err }
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::CurrentDirFailed { .. }
            | Self::CurrentDirInvalidUtf8 { .. }
            | Self::ConfigParseError { .. }
            | Self::CaseFilterParseError { .. } => AssignExitCode::SETUP_ERROR,
            Self::InventoryError { .. } => AssignExitCode::INVENTORY_INVALID,
            Self::CiConfigError { .. } => AssignExitCode::CI_CONFIG_INVALID,
            Self::AssignError { .. } => AssignExitCode::ASSIGN_FAILED,
            Self::BindError { .. } => AssignExitCode::BIND_FAILED,
            Self::WriteConfigError { .. } => AssignExitCode::WRITE_CONFIG_FAILED,
            Self::WriteOutputError { .. } | Self::SerializePlanError { .. } => {
                AssignExitCode::WRITE_OUTPUT_ERROR
            }
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match self {
            Self::CurrentDirFailed { err } => {
                tracing::error!("could not determine current directory");
                Some(err as &dyn Error)
            }
            Self::CurrentDirInvalidUtf8 { err } => {
                tracing::error!(
                    "current directory `{}` is not valid UTF-8",
                    err.as_path().display().style(styles.bold)
                );
                None
            }
            Self::ConfigParseError { err } => {
                match err.kind() {
                    ConfigParseErrorKind::DeserializeError(deserialize_err) => {
                        tracing::error!(
                            "failed to parse ut-assign config at `{}`: key `{}`",
                            err.config_file().style(styles.bold),
                            deserialize_err.path().style(styles.bold),
                        );
                        Some(deserialize_err.inner() as &dyn Error)
                    }
                    _ => {
                        tracing::error!(
                            "failed to parse ut-assign config at `{}`",
                            err.config_file().style(styles.bold),
                        );
                        err.source()
                    }
                }
            }
            Self::CaseFilterParseError { source_name, err } => {
                tracing::error!("failed to parse case filter from {source_name}");
                Some(err as &dyn Error)
            }
            Self::InventoryError { err } => {
                tracing::error!("{err}");
                err.source()
            }
            Self::CiConfigError { err } => {
                tracing::error!("{err}");
                err.source()
            }
            Self::AssignError { err } => {
                tracing::error!("{err}");
                None
            }
            Self::BindError { err } => {
                // The message spans several lines and already starts with its own summary.
                tracing::error!("{}", err.to_string().trim_end());
                None
            }
            Self::WriteConfigError { err } => {
                tracing::error!("{err}");
                err.source()
            }
            Self::WriteOutputError { err } => {
                tracing::error!("error writing output");
                Some(err as &dyn Error)
            }
            Self::SerializePlanError { err } => {
                tracing::error!("error serializing plan");
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            tracing::error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}
