// Copyright (c) The ut-assign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for ut-assign, which turns an inventory of embedded unit test cases into
//! per-job configuration files for CI.
//!
//! The flow of operations is:
//!
//! 1. Read the [case inventory](inventory::CaseInventory).
//! 2. Narrow it down with a [`CaseFilter`](case_filter::CaseFilter).
//! 3. [Assign](assign::assign) the surviving cases to capped job descriptors.
//! 4. [Bind](plan::JobPlan::bind) the descriptors to the jobs declared in the
//!    [CI configuration](ci_config::CiTopology).
//! 5. [Write](output::ConfigWriter) one configuration file per job instance.

pub mod assign;
pub mod case;
pub mod case_filter;
pub mod ci_config;
pub mod config;
pub mod errors;
pub mod group;
pub mod inventory;
pub mod job;
pub mod output;
pub mod plan;
#[cfg(test)]
mod test_helpers;
