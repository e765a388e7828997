// Copyright (c) The ut-assign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Job descriptors: the unit of output of the group assigner.

use crate::group::{GroupKey, MatchKey};
use serde::Serialize;
use std::fmt;

/// How the cases in a job are executed.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum DispatchKind {
    /// Each case runs on a single device in a single stage.
    Single,

    /// Each case spans multiple devices.
    MultiDevice,

    /// Each case spans multiple execution stages.
    MultiStage,
}

impl DispatchKind {
    /// Picks the dispatch kind for a group's shared flags. Multi-device wins over multi-stage.
    pub fn from_flags(multi_device: bool, multi_stage: bool) -> Self {
        if multi_device {
            DispatchKind::MultiDevice
        } else if multi_stage {
            DispatchKind::MultiStage
        } else {
            DispatchKind::Single
        }
    }

    /// The name of the test function the CI job dispatches cases to.
    pub fn function_name(self) -> &'static str {
        match self {
            DispatchKind::Single => "run_unit_test_cases",
            DispatchKind::MultiDevice => "run_multiple_devices_cases",
            DispatchKind::MultiStage => "run_multiple_stage_cases",
        }
    }

    /// Whether every case dispatched this way must carry a child case count.
    pub fn requires_child_case_num(self) -> bool {
        match self {
            DispatchKind::Single => false,
            DispatchKind::MultiDevice | DispatchKind::MultiStage => true,
        }
    }
}

impl fmt::Display for DispatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchKind::Single => write!(f, "single"),
            DispatchKind::MultiDevice => write!(f, "multi-device"),
            DispatchKind::MultiStage => write!(f, "multi-stage"),
        }
    }
}

/// Identifies a descriptor: the index of the group it came from and its position among the
/// descriptors that group was split into.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct DescriptorId {
    group_index: usize,
    split_index: usize,
    split_count: usize,
}

impl DescriptorId {
    pub(crate) fn new(group_index: usize, split_index: usize, split_count: usize) -> Self {
        debug_assert!(split_index < split_count, "split index out of range");
        Self {
            group_index,
            split_index,
            split_count,
        }
    }

    /// The index of the source group, in group order.
    pub fn group_index(&self) -> usize {
        self.group_index
    }

    /// The position of this descriptor within its group's split, counting from 0.
    pub fn split_index(&self) -> usize {
        self.split_index
    }

    /// The number of descriptors the source group was split into.
    pub fn split_count(&self) -> usize {
        self.split_count
    }
}

impl fmt::Display for DescriptorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "group-{} ({}/{})",
            self.group_index,
            self.split_index + 1,
            self.split_count
        )
    }
}

/// The extra data passed to the test function for one case.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct CaseRecord {
    /// The unit test app config, i.e. the application identifier without its `UT_` prefix.
    pub config: String,

    /// The case name.
    pub name: String,

    /// The reset policy.
    pub reset: String,

    /// The number of child cases, only present for multi-device and multi-stage cases.
    #[serde(rename = "child case num", skip_serializing_if = "Option::is_none")]
    pub child_case_num: Option<u32>,
}

/// A job descriptor: a dispatch function and the ordered cases it runs.
///
/// A descriptor never holds more than [`MAX_CASES_PER_JOB`](crate::assign::MAX_CASES_PER_JOB)
/// records, and never fewer than one.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JobDescriptor {
    id: DescriptorId,
    group_key: GroupKey,
    records: Vec<CaseRecord>,
}

impl JobDescriptor {
    pub(crate) fn new(id: DescriptorId, group_key: GroupKey, records: Vec<CaseRecord>) -> Self {
        Self {
            id,
            group_key,
            records,
        }
    }

    /// The descriptor id.
    pub fn id(&self) -> DescriptorId {
        self.id
    }

    /// The key of the group this descriptor came from.
    pub fn group_key(&self) -> &GroupKey {
        &self.group_key
    }

    /// The match key of the group this descriptor came from.
    pub fn match_key(&self) -> &MatchKey {
        &self.group_key.match_key
    }

    /// The dispatch kind.
    pub fn dispatch_kind(&self) -> DispatchKind {
        self.group_key.dispatch_kind()
    }

    /// The test function name.
    pub fn function_name(&self) -> &'static str {
        self.dispatch_kind().function_name()
    }

    /// The per-case records, in run order.
    pub fn records(&self) -> &[CaseRecord] {
        &self.records
    }
}
