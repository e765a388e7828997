// Copyright (c) The ut-assign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filtering cases by per-attribute allow-lists.
//!
//! Filtering is permissive: a case that doesn't have a filtered attribute always passes, and no
//! combination of criteria is an error.

use crate::{
    case::{AttrValue, Case, canonical_attr_name},
    errors::CaseFilterParseError,
};
use indexmap::IndexMap;
use serde::Deserialize;
use std::{collections::BTreeSet, fmt};

/// A value in a filter allow-list.
///
/// Strings are always stored lower-cased. Other values are compared by equality, without coercion:
/// the filter value `true` does not match the string `"true"`.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Deserialize)]
#[serde(from = "RawFilterValue")]
pub enum FilterValue {
    /// A boolean.
    Bool(bool),

    /// An integer.
    Int(i64),

    /// A lower-cased string.
    Str(String),
}

impl FilterValue {
    /// Creates a string filter value, lower-casing it.
    pub fn string(s: impl AsRef<str>) -> Self {
        FilterValue::Str(s.as_ref().to_lowercase())
    }

    /// Normalizes a case attribute for comparison. Nulls never match anything.
    pub fn from_attr(value: &AttrValue) -> Option<Self> {
        match value {
            AttrValue::Null => None,
            AttrValue::Bool(b) => Some(FilterValue::Bool(*b)),
            AttrValue::Int(n) => Some(FilterValue::Int(*n)),
            AttrValue::Str(s) => Some(FilterValue::string(s)),
        }
    }

    /// Parses a value given on the command line.
    ///
    /// `true` and `false` become booleans and anything that parses as an integer becomes an
    /// integer. Everything else is a string.
    pub fn parse_arg(s: &str) -> Self {
        match s {
            "true" => FilterValue::Bool(true),
            "false" => FilterValue::Bool(false),
            _ => match s.parse::<i64>() {
                Ok(n) => FilterValue::Int(n),
                Err(_) => FilterValue::string(s),
            },
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Bool(b) => write!(f, "{b}"),
            FilterValue::Int(n) => write!(f, "{n}"),
            FilterValue::Str(s) => write!(f, "{s:?}"),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFilterValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl From<RawFilterValue> for FilterValue {
    fn from(raw: RawFilterValue) -> Self {
        match raw {
            RawFilterValue::Bool(b) => FilterValue::Bool(b),
            RawFilterValue::Int(n) => FilterValue::Int(n),
            RawFilterValue::Str(s) => FilterValue::string(s),
        }
    }
}

/// One allow-list: a case passes if it lacks `attr` or its value is in `allowed`.
#[derive(Clone, Debug, Eq, PartialEq)]
struct FilterStage {
    attr: String,
    allowed: BTreeSet<FilterValue>,
}

impl FilterStage {
    fn admits(&self, case: &Case) -> bool {
        match case.attr(&self.attr) {
            None => true,
            Some(value) => FilterValue::from_attr(value)
                .is_some_and(|value| self.allowed.contains(&value)),
        }
    }
}

/// Filters cases by attribute allow-lists.
///
/// Stages are applied in the order they were added, each narrowing the cases that survived the
/// previous one. Adding two stages for the same attribute therefore intersects their allow-lists.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CaseFilter {
    stages: Vec<FilterStage>,
}

impl CaseFilter {
    /// Creates a filter that lets every case through.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an allow-list for `attr`.
    pub fn allow(
        &mut self,
        attr: impl AsRef<str>,
        values: impl IntoIterator<Item = FilterValue>,
    ) -> &mut Self {
        self.stages.push(FilterStage {
            attr: canonical_attr_name(attr.as_ref()).to_owned(),
            allowed: values.into_iter().collect(),
        });
        self
    }

    /// Appends all stages of `other` after the stages of `self`.
    pub fn extend(&mut self, other: CaseFilter) -> &mut Self {
        self.stages.extend(other.stages);
        self
    }

    /// Builds a filter from a map of attribute to allowed values, e.g. the `[case-filter]` table in
    /// the config.
    pub fn from_map(map: IndexMap<String, Vec<FilterValue>>) -> Self {
        let mut filter = Self::new();
        for (attr, values) in map {
            filter.allow(attr, values);
        }
        filter
    }

    /// Parses a JSON object of attribute to allowed values, as found in the `BOT_CASE_FILTER`
    /// environment variable.
    pub fn parse_json(json: &str) -> Result<Self, CaseFilterParseError> {
        let map: IndexMap<String, Vec<FilterValue>> =
            serde_json::from_str(json).map_err(CaseFilterParseError::json)?;
        Ok(Self::from_map(map))
    }

    /// Parses `ATTR=VALUE[,VALUE...]` arguments, one stage per argument.
    pub fn parse_args(
        args: impl IntoIterator<Item = impl AsRef<str>>,
    ) -> Result<Self, CaseFilterParseError> {
        let mut filter = Self::new();
        for arg in args {
            let arg = arg.as_ref();
            let (attr, values) = arg
                .split_once('=')
                .filter(|(attr, _)| !attr.trim().is_empty())
                .ok_or_else(|| CaseFilterParseError::invalid_arg(arg))?;
            filter.allow(
                attr.trim(),
                values.split(',').map(|value| FilterValue::parse_arg(value.trim())),
            );
        }
        Ok(filter)
    }

    /// Returns true if no stages were added.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Returns true if `case` passes every stage.
    pub fn matches(&self, case: &Case) -> bool {
        self.stages.iter().all(|stage| stage.admits(case))
    }

    /// Returns the cases that pass every stage, in input order.
    pub fn filter<'a>(&self, cases: impl IntoIterator<Item = &'a Case>) -> Vec<&'a Case> {
        let cases: Vec<&'a Case> = cases.into_iter().collect();
        self.stages.iter().fold(cases, |surviving, stage| {
            let before = surviving.len();
            let surviving: Vec<_> = surviving
                .into_iter()
                .filter(|case| stage.admits(case))
                .collect();
            tracing::debug!(
                "filter on `{}`: {} of {before} cases pass",
                stage.attr,
                surviving.len(),
            );
            surviving
        })
    }
}
