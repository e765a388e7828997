// Copyright (c) The ut-assign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Grouping cases by the attributes that decide where and how they run.

use crate::{case::Case, job::DispatchKind};
use std::{collections::BTreeMap, fmt};

/// The attributes that decide which declared CI job a group is destined for.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct MatchKey {
    /// The application identifier.
    pub test_app: String,

    /// The SDK identifier.
    pub sdk: String,

    /// The test environment identifier.
    pub test_environment: String,
}

impl MatchKey {
    /// Returns the match key for a case.
    pub fn for_case(case: &Case) -> Self {
        Self {
            test_app: case.test_app().to_owned(),
            sdk: case.sdk().to_owned(),
            test_environment: case.test_environment().to_owned(),
        }
    }

    /// Iterates over the three values, in order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        [
            self.test_app.as_str(),
            self.sdk.as_str(),
            self.test_environment.as_str(),
        ]
        .into_iter()
    }
}

impl fmt::Display for MatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}",
            self.test_app, self.sdk, self.test_environment
        )
    }
}

/// The full grouping key.
///
/// The derived ordering is the group ordering: by match key, then by the multi-device flag, then
/// by the multi-stage flag.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct GroupKey {
    /// The match key.
    pub match_key: MatchKey,

    /// Whether cases in this group span multiple devices.
    pub multi_device: bool,

    /// Whether cases in this group span multiple stages.
    pub multi_stage: bool,
}

impl GroupKey {
    /// Returns the grouping key for a case. Values are compared exactly, without case folding.
    pub fn for_case(case: &Case) -> Self {
        Self {
            match_key: MatchKey::for_case(case),
            multi_device: case.multi_device(),
            multi_stage: case.multi_stage(),
        }
    }

    /// The dispatch kind shared by every case with this key.
    pub fn dispatch_kind(&self) -> DispatchKind {
        DispatchKind::from_flags(self.multi_device, self.multi_stage)
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.match_key, self.dispatch_kind())
    }
}

/// A non-empty list of cases sharing a [`GroupKey`], in input order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CaseGroup<'a> {
    key: GroupKey,
    cases: Vec<&'a Case>,
}

impl<'a> CaseGroup<'a> {
    /// The grouping key.
    pub fn key(&self) -> &GroupKey {
        &self.key
    }

    /// The cases in this group.
    pub fn cases(&self) -> &[&'a Case] {
        &self.cases
    }

    /// The number of cases in this group. Always at least 1.
    pub fn size(&self) -> usize {
        self.cases.len()
    }
}

/// Partitions cases into groups, ordered by [`GroupKey`].
///
/// Within a group, cases keep their relative input order.
pub fn group_cases<'a>(cases: impl IntoIterator<Item = &'a Case>) -> Vec<CaseGroup<'a>> {
    let groups = cases.into_iter().fold(
        BTreeMap::<GroupKey, Vec<&'a Case>>::new(),
        |mut groups, case| {
            groups.entry(GroupKey::for_case(case)).or_default().push(case);
            groups
        },
    );

    groups
        .into_iter()
        .map(|(key, cases)| CaseGroup { key, cases })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::CaseBuilder;
    use pretty_assertions::assert_eq;

    #[test]
    fn groups_are_ordered_by_key() {
        let cases = vec![
            CaseBuilder::new("b-multi").app("UT_002").multi_device().build(),
            CaseBuilder::new("a-1").app("UT_001").build(),
            CaseBuilder::new("b-single").app("UT_002").build(),
            CaseBuilder::new("a-stage").app("UT_001").multi_stage().build(),
            CaseBuilder::new("a-2").app("UT_001").build(),
            CaseBuilder::new("b-both").app("UT_002").multi_device().multi_stage().build(),
        ];

        let groups = group_cases(&cases);
        let actual: Vec<(String, DispatchKind, Vec<&str>)> = groups
            .iter()
            .map(|group| {
                (
                    group.key().match_key.test_app.clone(),
                    group.key().dispatch_kind(),
                    group.cases().iter().map(|case| case.summary()).collect(),
                )
            })
            .collect();

        assert_eq!(
            actual,
            vec![
                ("UT_001".to_owned(), DispatchKind::Single, vec!["a-1", "a-2"]),
                ("UT_001".to_owned(), DispatchKind::MultiStage, vec!["a-stage"]),
                ("UT_002".to_owned(), DispatchKind::Single, vec!["b-single"]),
                ("UT_002".to_owned(), DispatchKind::MultiDevice, vec!["b-multi"]),
                // Multi-device takes precedence over multi-stage.
                ("UT_002".to_owned(), DispatchKind::MultiDevice, vec!["b-both"]),
            ]
        );
    }

    #[test]
    fn grouping_is_exact() {
        let cases = vec![
            CaseBuilder::new("upper").sdk("ESP32").build(),
            CaseBuilder::new("lower").sdk("esp32").build(),
        ];

        let groups = group_cases(&cases);
        assert_eq!(groups.len(), 2, "SDK values differing by case are distinct groups");
        assert_eq!(groups[0].key().match_key.sdk, "ESP32");
        assert_eq!(groups[1].key().match_key.sdk, "esp32");
    }

    #[test]
    fn membership_ignores_arrival_order() {
        let cases = vec![
            CaseBuilder::new("x").env("UT_T2_1").build(),
            CaseBuilder::new("y").env("UT_T1_1").build(),
            CaseBuilder::new("z").env("UT_T2_1").build(),
        ];
        let reversed: Vec<&Case> = cases.iter().rev().collect();

        let forward = group_cases(&cases);
        let backward = group_cases(reversed);
        fn keys(groups: &[CaseGroup<'_>]) -> Vec<GroupKey> {
            groups.iter().map(|group| group.key().clone()).collect()
        }
        assert_eq!(keys(&forward), keys(&backward));
        assert_eq!(forward[1].size(), 2);
        assert_eq!(backward[1].size(), 2);
    }
}
