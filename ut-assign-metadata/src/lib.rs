// Copyright (c) The ut-assign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Structured access to ut-assign machine-readable output.
//!
//! `ut-assign show --message-format json` prints a [`PlanSummary`]. Failed runs exit with one of
//! the codes documented in [`AssignExitCode`].

mod exit_codes;
mod plan;

pub use exit_codes::*;
pub use plan::*;
