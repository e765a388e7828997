// Copyright (c) The ut-assign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The group assigner: turns a filtered case list into capped, ordered job descriptors.
//!
//! Cases are grouped by [`GroupKey`], groups are visited in key order, and each group is split in
//! input order into descriptors of at most [`MAX_CASES_PER_JOB`] cases. Descriptor ids are the
//! group index followed by the split index, so identical input always produces identical output.

use crate::{
    case::{Case, CaseField},
    errors::AssignError,
    group::{GroupKey, group_cases},
    job::{CaseRecord, DescriptorId, DispatchKind, JobDescriptor},
};

/// The maximum number of cases in a single job descriptor.
pub const MAX_CASES_PER_JOB: usize = 30;

/// The prefix every unit test application identifier starts with.
pub const UT_APP_PREFIX: &str = "UT_";

/// Assigns cases to job descriptors.
///
/// Fails on the first case with a malformed application identifier or a missing child case count.
/// No descriptors are returned in that case.
pub fn assign<'a>(
    cases: impl IntoIterator<Item = &'a Case>,
) -> Result<Vec<JobDescriptor>, AssignError> {
    let groups = group_cases(cases);
    let mut descriptors = Vec::new();

    for (group_index, group) in groups.iter().enumerate() {
        let kind = group.key().dispatch_kind();
        let split_count = group.size().div_ceil(MAX_CASES_PER_JOB);
        tracing::debug!(
            "group {group_index} [{}]: {} cases in {split_count} descriptors",
            group.key(),
            group.size(),
        );

        for (split_index, chunk) in group.cases().chunks(MAX_CASES_PER_JOB).enumerate() {
            let records = chunk
                .iter()
                .map(|case| make_record(case, kind))
                .collect::<Result<Vec<_>, _>>()?;
            descriptors.push(JobDescriptor::new(
                DescriptorId::new(group_index, split_index, split_count),
                group.key().clone(),
                records,
            ));
        }
    }

    Ok(descriptors)
}

/// Returns the unit test config name for an application identifier.
pub fn ut_config(case: &Case) -> Result<&str, AssignError> {
    case.test_app()
        .strip_prefix(UT_APP_PREFIX)
        .ok_or_else(|| AssignError::malformed_case(case.summary(), case.test_app()))
}

fn make_record(case: &Case, kind: DispatchKind) -> Result<CaseRecord, AssignError> {
    debug_assert_eq!(
        GroupKey::for_case(case).dispatch_kind(),
        kind,
        "groups share flags"
    );

    let child_case_num = if kind.requires_child_case_num() {
        let num = case.child_case_num().ok_or_else(|| {
            AssignError::missing_attribute(case.summary(), CaseField::ChildCaseNum, kind)
        })?;
        Some(num)
    } else {
        None
    };

    Ok(CaseRecord {
        config: ut_config(case)?.to_owned(),
        name: case.summary().to_owned(),
        reset: case.reset().to_owned(),
        child_case_num,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::CaseBuilder;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use test_strategy::proptest;

    #[test]
    fn oversized_group_is_split() {
        let cases: Vec<Case> = (0..35)
            .map(|i| CaseBuilder::new(format!("case {i}")).app("UT_config1").build())
            .collect();

        let descriptors = assign(&cases).expect("assignment should succeed");
        assert_eq!(descriptors.len(), 2);

        let sizes: Vec<usize> = descriptors.iter().map(|d| d.records().len()).collect();
        assert_eq!(sizes, vec![30, 5]);

        for descriptor in &descriptors {
            assert_eq!(descriptor.function_name(), "run_unit_test_cases");
            for record in descriptor.records() {
                assert_eq!(record.config, "config1");
                assert_eq!(record.child_case_num, None);
            }
        }
        assert_eq!(descriptors[0].id().to_string(), "group-0 (1/2)");
        assert_eq!(descriptors[1].id().to_string(), "group-0 (2/2)");
        assert_eq!(descriptors[1].records()[0].name, "case 30");
    }

    #[test]
    fn exact_multiple_of_capacity() {
        let cases: Vec<Case> = (0..60)
            .map(|i| CaseBuilder::new(format!("case {i}")).build())
            .collect();
        let descriptors = assign(&cases).expect("assignment should succeed");
        let sizes: Vec<usize> = descriptors.iter().map(|d| d.records().len()).collect();
        assert_eq!(sizes, vec![30, 30]);
    }

    #[test]
    fn multi_device_without_child_case_num() {
        let cases = vec![
            CaseBuilder::new("fine").build(),
            CaseBuilder::new("gpio between two boards")
                .multi_device()
                .build(),
        ];

        let err = assign(&cases).expect_err("assignment should fail");
        assert_eq!(
            err,
            AssignError::MissingAttribute {
                case_name: "gpio between two boards".to_owned(),
                attribute: CaseField::ChildCaseNum,
                function: "run_multiple_devices_cases",
            }
        );
        assert!(
            err.to_string().contains("gpio between two boards"),
            "error names the case: {err}"
        );
    }

    #[test]
    fn multi_stage_records_carry_child_case_num() {
        let cases = vec![
            CaseBuilder::new("deep sleep")
                .multi_stage()
                .child_case_num(2)
                .reset("DEEPSLEEP_RESET")
                .build(),
        ];

        let descriptors = assign(&cases).expect("assignment should succeed");
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].function_name(), "run_multiple_stage_cases");
        assert_eq!(
            descriptors[0].records(),
            &[CaseRecord {
                config: "001".to_owned(),
                name: "deep sleep".to_owned(),
                reset: "DEEPSLEEP_RESET".to_owned(),
                child_case_num: Some(2),
            }]
        );
    }

    #[test]
    fn single_records_drop_child_case_num() {
        let cases = vec![CaseBuilder::new("plain").child_case_num(3).build()];
        let descriptors = assign(&cases).expect("assignment should succeed");
        assert_eq!(descriptors[0].records()[0].child_case_num, None);
    }

    #[test]
    fn malformed_app_id() {
        let cases = vec![CaseBuilder::new("no prefix").app("config1").build()];
        let err = assign(&cases).expect_err("assignment should fail");
        assert_eq!(
            err,
            AssignError::MalformedCase {
                case_name: "no prefix".to_owned(),
                test_app: "config1".to_owned(),
            }
        );
    }

    #[test]
    fn empty_input() {
        let cases: Vec<Case> = Vec::new();
        assert_eq!(assign(&cases), Ok(Vec::new()));
    }

    fn arbitrary_cases(shape: &[(u8, u8, bool, bool)]) -> Vec<Case> {
        shape
            .iter()
            .enumerate()
            .map(|(i, (app, env, multi_device, multi_stage))| {
                let mut builder = CaseBuilder::new(format!("case {i}"))
                    .index(i)
                    .app(&format!("UT_{:03}", app % 3))
                    .env(&format!("UT_T{}_1", env % 2 + 1))
                    .child_case_num(2);
                if *multi_device {
                    builder = builder.multi_device();
                }
                if *multi_stage {
                    builder = builder.multi_stage();
                }
                builder.build()
            })
            .collect()
    }

    #[proptest(cases = 64)]
    fn assignment_properties(
        #[strategy(proptest::collection::vec(proptest::arbitrary::any::<(u8, u8, bool, bool)>(), 0..200))]
        shape: Vec<(u8, u8, bool, bool)>,
    ) {
        let cases = arbitrary_cases(&shape);
        let descriptors = assign(&cases).expect("all generated cases are well-formed");

        // Determinism.
        assert_eq!(assign(&cases).as_ref(), Ok(&descriptors));

        let mut by_group: BTreeMap<usize, Vec<&JobDescriptor>> = BTreeMap::new();
        let mut previous_id = None;
        for descriptor in &descriptors {
            // Capacity bound.
            let len = descriptor.records().len();
            assert!((1..=MAX_CASES_PER_JOB).contains(&len), "len {len} out of bounds");

            // Ids are strictly increasing in output order.
            assert!(previous_id < Some(descriptor.id()));
            previous_id = Some(descriptor.id());

            by_group
                .entry(descriptor.id().group_index())
                .or_default()
                .push(descriptor);
        }

        let mut seen = 0;
        for group in by_group.values() {
            // Split reconstruction: concatenating the splits gives back the group in input order.
            let names: Vec<&str> = group
                .iter()
                .flat_map(|d| d.records().iter().map(|r| r.name.as_str()))
                .collect();
            let key = group[0].group_key();
            let expected: Vec<&str> = cases
                .iter()
                .filter(|case| GroupKey::for_case(case) == *key)
                .map(|case| case.summary())
                .collect();
            assert_eq!(names, expected);

            // All but the last split are full.
            for descriptor in &group[..group.len() - 1] {
                assert_eq!(descriptor.records().len(), MAX_CASES_PER_JOB);
            }

            // Dispatch exclusivity.
            for descriptor in group {
                assert_eq!(descriptor.group_key(), key);
                let multi = descriptor.dispatch_kind().requires_child_case_num();
                assert!(
                    descriptor
                        .records()
                        .iter()
                        .all(|r| r.child_case_num.is_some() == multi)
                );
            }
            seen += names.len();
        }

        // Partition: every case appears exactly once.
        assert_eq!(seen, cases.len());
    }
}
