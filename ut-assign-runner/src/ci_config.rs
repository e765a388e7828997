// Copyright (c) The ut-assign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The CI topology: unit test jobs declared in a GitLab CI configuration.
//!
//! Every top-level key that matches the job pattern and maps to a job definition is a declared
//! job. Its `tags` decide which case groups it accepts and its `parallel` count decides how many
//! instances it expands into.

use crate::{errors::CiConfigError, group::MatchKey};
use camino::Utf8Path;
use indexmap::IndexMap;
use regex::Regex;
use serde::Deserialize;
use std::{collections::BTreeSet, num::NonZeroUsize};

/// A unit test job declared in the CI configuration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeclaredJob {
    name: String,
    tags: BTreeSet<String>,
    parallel: NonZeroUsize,
}

impl DeclaredJob {
    /// Creates a new declared job.
    pub fn new(
        name: impl Into<String>,
        tags: impl IntoIterator<Item = impl Into<String>>,
        parallel: NonZeroUsize,
    ) -> Self {
        Self {
            name: name.into(),
            tags: tags.into_iter().map(Into::into).collect(),
            parallel,
        }
    }

    /// The job name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The runner tags of this job.
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// The number of instances this job expands into.
    pub fn parallel(&self) -> usize {
        self.parallel.get()
    }

    /// Returns true if every value of `key` is one of this job's tags.
    pub fn accepts(&self, key: &MatchKey) -> bool {
        key.values().all(|value| self.tags.contains(value))
    }
}

#[derive(Deserialize)]
struct JobDeserialize {
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default = "default_parallel")]
    parallel: NonZeroUsize,
}

fn default_parallel() -> NonZeroUsize {
    NonZeroUsize::MIN
}

/// The declared unit test jobs, in file order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CiTopology {
    jobs: Vec<DeclaredJob>,
}

impl CiTopology {
    /// The default pattern for unit test job names.
    pub const DEFAULT_JOB_PATTERN: &'static str = "^UT_.+";

    /// Creates a topology from already-declared jobs.
    pub fn new(jobs: impl IntoIterator<Item = DeclaredJob>) -> Self {
        Self {
            jobs: jobs.into_iter().collect(),
        }
    }

    /// Reads the CI configuration at `path`.
    pub fn from_path(path: &Utf8Path, job_pattern: &Regex) -> Result<Self, CiConfigError> {
        let contents = fs_err::read_to_string(path).map_err(|err| CiConfigError::Read {
            path: path.to_owned(),
            err,
        })?;
        Self::from_yaml_str(path, &contents, job_pattern)
    }

    /// Parses a CI configuration. `path` is only used for diagnostics.
    pub fn from_yaml_str(
        path: &Utf8Path,
        contents: &str,
        job_pattern: &Regex,
    ) -> Result<Self, CiConfigError> {
        let entries: IndexMap<String, serde_yaml::Value> =
            serde_yaml::from_str(contents).map_err(|err| CiConfigError::Parse {
                path: path.to_owned(),
                err,
            })?;

        let mut jobs = Vec::new();
        for (name, mut value) in entries {
            if !job_pattern.is_match(&name) {
                continue;
            }
            if !value.is_mapping() {
                tracing::debug!("{path}: skipping `{name}`, which is not a job definition");
                continue;
            }

            // GitLab job definitions commonly pull tags in from templates through `<<: *anchor`.
            value.apply_merge().map_err(|err| CiConfigError::Parse {
                path: path.to_owned(),
                err,
            })?;
            let job: JobDeserialize =
                serde_path_to_error::deserialize(value).map_err(|err| CiConfigError::InvalidJob {
                    path: path.to_owned(),
                    job: name.clone(),
                    err,
                })?;

            tracing::debug!(
                "{path}: declared job `{name}` with tags [{}] and parallel {}",
                job.tags.join(", "),
                job.parallel,
            );
            jobs.push(DeclaredJob::new(name, job.tags, job.parallel));
        }

        Ok(Self { jobs })
    }

    /// The declared jobs, in file order.
    pub fn jobs(&self) -> &[DeclaredJob] {
        &self.jobs
    }

    /// Returns the indexes of jobs that accept `key`, in file order.
    pub fn matching_jobs<'a>(&'a self, key: &'a MatchKey) -> impl Iterator<Item = usize> + 'a {
        self.jobs
            .iter()
            .enumerate()
            .filter(move |(_, job)| job.accepts(key))
            .map(|(index, _)| index)
    }
}
