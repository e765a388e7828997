// Copyright (c) The ut-assign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Machine-readable summary of a job plan, as printed by `ut-assign show --message-format json`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub struct PlanSummary {
    /// The number of cases that survived filtering.
    pub case_count: usize,

    /// Job instances that received cases, in output order.
    pub jobs: Vec<JobSummary>,

    /// Declared job instances that received no cases.
    pub idle_jobs: Vec<String>,
}

impl PlanSummary {
    /// Creates a new summary.
    pub fn new(case_count: usize, jobs: Vec<JobSummary>, idle_jobs: Vec<String>) -> Self {
        Self {
            case_count,
            jobs,
            idle_jobs,
        }
    }

    /// Parses a summary from the JSON printed by `ut-assign show`.
    pub fn parse_json(json: impl AsRef<str>) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json.as_ref())
    }

    /// Returns the total number of cases per dispatch function across all jobs.
    pub fn cases_by_function(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for job in &self.jobs {
            for config in &job.case_configs {
                *counts.entry(config.function.as_str()).or_default() += config.cases.len();
            }
        }
        counts
    }
}

/// Summary of a single job instance.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub struct JobSummary {
    /// The job instance name, e.g. `UT_001_01` or `UT_001_01 2/3`.
    pub name: String,

    /// The file name the configuration is written to.
    pub file_name: String,

    /// The case configurations bound to this instance.
    pub case_configs: Vec<CaseConfigSummary>,
}

impl JobSummary {
    /// Creates a new job summary.
    pub fn new(
        name: impl Into<String>,
        file_name: impl Into<String>,
        case_configs: Vec<CaseConfigSummary>,
    ) -> Self {
        Self {
            name: name.into(),
            file_name: file_name.into(),
            case_configs,
        }
    }
}

/// Summary of one job descriptor bound to a job instance.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub struct CaseConfigSummary {
    /// The descriptor id, e.g. `group-1 (2/2)`.
    pub id: String,

    /// The dispatch function name.
    pub function: String,

    /// Case names in run order.
    pub cases: Vec<String>,
}

impl CaseConfigSummary {
    /// Creates a new case configuration summary.
    pub fn new(id: impl Into<String>, function: impl Into<String>, cases: Vec<String>) -> Self {
        Self {
            id: id.into(),
            function: function.into(),
            cases,
        }
    }
}
