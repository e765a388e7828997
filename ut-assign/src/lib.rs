// Copyright (c) The ut-assign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assigns embedded unit test cases to the unit test jobs declared in a GitLab CI configuration.
//!
//! Run `ut-assign assign TEST_CASES CI_CONFIG OUTPUT_PATH` to write one job configuration file per
//! CI job instance, or `ut-assign show TEST_CASES CI_CONFIG` to inspect the assignment first.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::OutputWriter;
