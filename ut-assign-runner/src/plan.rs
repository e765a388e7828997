// Copyright (c) The ut-assign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Binding job descriptors to the instances of declared CI jobs.
//!
//! Descriptors arrive grouped: every descriptor split from the same case group shares a group
//! index. Groups are bound to declared jobs whose tags cover their match key, spilling over to
//! other such jobs when one is full. Each job then hands out its descriptors one per parallel
//! instance, counting up from 1.

use crate::{
    ci_config::CiTopology,
    errors::{BindError, OversubscribedJob},
    group::MatchKey,
    job::JobDescriptor,
};
use itertools::Itertools;
use std::collections::HashMap;
use ut_assign_metadata::{CaseConfigSummary, JobSummary, PlanSummary};

/// One instance of a declared job, with the descriptor it runs.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JobInstance {
    job_name: String,
    instance: usize,
    total: usize,
    descriptor: JobDescriptor,
}

impl JobInstance {
    /// The name of the declared job.
    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    /// The instance number, counting up from 1.
    pub fn instance(&self) -> usize {
        self.instance
    }

    /// The number of instances the declared job expands into.
    pub fn total(&self) -> usize {
        self.total
    }

    /// The descriptor bound to this instance.
    pub fn descriptor(&self) -> &JobDescriptor {
        &self.descriptor
    }

    /// The name CI shows for this instance, e.g. `UT_001` or `UT_001 2/3`.
    pub fn display_name(&self) -> String {
        instance_display_name(&self.job_name, self.instance, self.total)
    }

    /// The name of the configuration file for this instance.
    pub fn file_name(&self) -> String {
        if self.total == 1 {
            format!("{}.yml", self.job_name)
        } else {
            format!("{}_{}.yml", self.job_name, self.instance)
        }
    }
}

fn instance_display_name(job_name: &str, instance: usize, total: usize) -> String {
    if total == 1 {
        job_name.to_owned()
    } else {
        format!("{job_name} {instance}/{total}")
    }
}

/// The result of binding descriptors to a CI topology.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct JobPlan {
    instances: Vec<JobInstance>,
    idle_instances: Vec<String>,
}

impl JobPlan {
    /// Binds descriptors, in assigner order, to the jobs declared in `topology`.
    ///
    /// The i-th group with a given match key prefers the i-th declared job accepting that key, or
    /// the last of them once they run out. A descriptor that finds its preferred job full goes to
    /// the first accepting job with a free instance. Binding fails only when every accepting job
    /// is full.
    pub fn bind(
        topology: &CiTopology,
        descriptors: Vec<JobDescriptor>,
    ) -> Result<Self, BindError> {
        let jobs = topology.jobs();
        let mut per_job: Vec<Vec<JobDescriptor>> = vec![Vec::new(); jobs.len()];
        let mut ordinals: HashMap<MatchKey, usize> = HashMap::new();
        let mut unassigned: Vec<MatchKey> = Vec::new();

        let groups = descriptors
            .into_iter()
            .chunk_by(|descriptor| descriptor.id().group_index());
        for (group_index, group) in &groups {
            let group: Vec<JobDescriptor> = group.collect();
            let match_key = group[0].match_key().clone();

            let matching: Vec<usize> = topology.matching_jobs(&match_key).collect();
            let Some(&last) = matching.last() else {
                tracing::debug!("group {group_index} [{match_key}]: no matching job");
                if !unassigned.contains(&match_key) {
                    unassigned.push(match_key);
                }
                continue;
            };

            let ordinal = ordinals.entry(match_key).or_default();
            let preferred = matching.get(*ordinal).copied().unwrap_or(last);
            *ordinal += 1;

            for descriptor in group {
                let has_room =
                    |job_index: usize| per_job[job_index].len() < jobs[job_index].parallel();
                // With no room anywhere, the preferred job is oversubscribed and reported below.
                let job_index = if has_room(preferred) {
                    preferred
                } else {
                    matching
                        .iter()
                        .copied()
                        .find(|&job_index| has_room(job_index))
                        .unwrap_or(preferred)
                };

                tracing::debug!(
                    "{} bound to `{}`",
                    descriptor.id(),
                    jobs[job_index].name(),
                );
                per_job[job_index].push(descriptor);
            }
        }

        let oversubscribed: Vec<OversubscribedJob> = jobs
            .iter()
            .zip(&per_job)
            .filter(|(job, descriptors)| descriptors.len() > job.parallel())
            .map(|(job, descriptors)| OversubscribedJob {
                name: job.name().to_owned(),
                parallel: job.parallel(),
                needed: descriptors.len(),
            })
            .collect();

        if !unassigned.is_empty() || !oversubscribed.is_empty() {
            return Err(BindError::new(unassigned, oversubscribed));
        }

        let mut plan = JobPlan::default();
        for (job, descriptors) in jobs.iter().zip(per_job) {
            let total = job.parallel();
            let bound = descriptors.len();
            for (i, descriptor) in descriptors.into_iter().enumerate() {
                plan.instances.push(JobInstance {
                    job_name: job.name().to_owned(),
                    instance: i + 1,
                    total,
                    descriptor,
                });
            }
            for instance in bound + 1..=total {
                let name = instance_display_name(job.name(), instance, total);
                tracing::warn!("CI job `{name}` has no test cases assigned and will not run any");
                plan.idle_instances.push(name);
            }
        }

        Ok(plan)
    }

    /// The instances that received a descriptor, in job declaration order.
    pub fn instances(&self) -> &[JobInstance] {
        &self.instances
    }

    /// Display names of declared instances that received nothing.
    pub fn idle_instances(&self) -> &[String] {
        &self.idle_instances
    }

    /// Builds a machine-readable summary of this plan.
    pub fn to_summary(&self, case_count: usize) -> PlanSummary {
        let jobs = self
            .instances
            .iter()
            .map(|instance| {
                let descriptor = instance.descriptor();
                let config = CaseConfigSummary::new(
                    descriptor.id().to_string(),
                    descriptor.function_name(),
                    descriptor
                        .records()
                        .iter()
                        .map(|record| record.name.clone())
                        .collect(),
                );
                JobSummary::new(instance.display_name(), instance.file_name(), vec![config])
            })
            .collect();
        PlanSummary::new(case_count, jobs, self.idle_instances.clone())
    }
}
