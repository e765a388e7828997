// Copyright (c) The ut-assign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::case::Case;
use indexmap::IndexMap;

/// Builds cases for tests. Defaults to a single-device, single-stage case in `UT_001`.
#[derive(Clone, Debug)]
pub(crate) struct CaseBuilder {
    index: usize,
    attrs: IndexMap<String, serde_yaml::Value>,
}

impl CaseBuilder {
    pub(crate) fn new(summary: impl Into<String>) -> Self {
        let mut attrs: IndexMap<String, serde_yaml::Value> = IndexMap::new();
        attrs.insert("Test App".to_owned(), "UT_001".into());
        attrs.insert("SDK".to_owned(), "ESP32_IDF".into());
        attrs.insert("test environment".to_owned(), "UT_T1_1".into());
        attrs.insert(
            "summary".to_owned(),
            serde_yaml::Value::String(summary.into()),
        );
        attrs.insert("reset".to_owned(), "".into());
        attrs.insert("multi_device".to_owned(), "No".into());
        attrs.insert("multi_stage".to_owned(), "No".into());
        Self { index: 0, attrs }
    }

    pub(crate) fn index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    pub(crate) fn app(self, app: &str) -> Self {
        self.attr("Test App", app)
    }

    pub(crate) fn sdk(self, sdk: &str) -> Self {
        self.attr("SDK", sdk)
    }

    pub(crate) fn env(self, env: &str) -> Self {
        self.attr("test environment", env)
    }

    pub(crate) fn reset(self, reset: &str) -> Self {
        self.attr("reset", reset)
    }

    pub(crate) fn multi_device(self) -> Self {
        self.attr("multi_device", "Yes")
    }

    pub(crate) fn multi_stage(self) -> Self {
        self.attr("multi_stage", "Yes")
    }

    pub(crate) fn child_case_num(self, num: i64) -> Self {
        self.attr("child case num", num)
    }

    pub(crate) fn attr(mut self, name: &str, value: impl Into<serde_yaml::Value>) -> Self {
        self.attrs.insert(name.to_owned(), value.into());
        self
    }

    pub(crate) fn build(self) -> Case {
        Case::from_attrs(self.index, self.attrs).expect("test case should be valid")
    }
}
