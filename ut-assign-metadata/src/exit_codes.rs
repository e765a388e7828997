// Copyright (c) The ut-assign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `ut-assign` failures.
///
/// `ut-assign` runs may fail for a variety of reasons. This structure documents the exit codes
/// that may occur in case of expected failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum AssignExitCode {}

impl AssignExitCode {
    /// No errors occurred and ut-assign exited normally.
    pub const OK: i32 = 0;

    /// A user issue happened while setting up a ut-assign invocation: a bad config file, an
    /// invalid `--filter` argument or an unparseable `BOT_CASE_FILTER`.
    pub const SETUP_ERROR: i32 = 96;

    /// The case inventory could not be read or a case was missing a required attribute.
    pub const INVENTORY_INVALID: i32 = 97;

    /// The CI configuration could not be read or declared an invalid job.
    pub const CI_CONFIG_INVALID: i32 = 98;

    /// A case was malformed or lacked an attribute required by its dispatch function.
    pub const ASSIGN_FAILED: i32 = 100;

    /// Some case groups could not be bound to declared CI jobs.
    pub const BIND_FAILED: i32 = 101;

    /// Writing job configuration files failed.
    pub const WRITE_CONFIG_FAILED: i32 = 102;

    /// Writing data to stdout or stderr produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;
}
