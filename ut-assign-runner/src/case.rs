// Copyright (c) The ut-assign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Unit test cases read from the case inventory.
//!
//! Inventory attributes are stringly-keyed. They're translated once, at ingestion, into a [`Case`]
//! whose required fields are strongly named. The full attribute map is kept alongside so that
//! [`CaseFilter`](crate::case_filter::CaseFilter) can match on any attribute.

use crate::errors::CaseParseError;
use indexmap::IndexMap;
use std::fmt;

/// Attribute names that are renamed when a case is ingested.
///
/// The key is the name as it may appear in the inventory or in a filter, the value is the
/// canonical name.
pub const ATTR_ALIASES: &[(&str, &str)] = &[("execution_time", "execution time")];

/// Returns the canonical name for an attribute.
///
/// Aliases from [`ATTR_ALIASES`] are translated, and names of known [`CaseField`]s are matched
/// case-insensitively. Any other name is returned unchanged.
pub fn canonical_attr_name(name: &str) -> &str {
    if let Some((_, canonical)) = ATTR_ALIASES.iter().find(|(alias, _)| *alias == name) {
        return canonical;
    }
    match CaseField::ALL
        .iter()
        .find(|field| field.key().eq_ignore_ascii_case(name))
    {
        Some(field) => field.key(),
        None => name,
    }
}

/// The attributes of a case that ut-assign reads.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum CaseField {
    /// The application identifier, e.g. `UT_001_01`.
    TestApp,

    /// The SDK or target identifier.
    Sdk,

    /// The test environment the case needs.
    TestEnvironment,

    /// The human-readable case name.
    Summary,

    /// The reset policy.
    Reset,

    /// Whether the case spans multiple devices.
    MultiDevice,

    /// Whether the case spans multiple execution stages.
    MultiStage,

    /// The number of child cases of a multi-device or multi-stage case.
    ChildCaseNum,
}

impl CaseField {
    /// All known fields.
    pub const ALL: &'static [CaseField] = &[
        CaseField::TestApp,
        CaseField::Sdk,
        CaseField::TestEnvironment,
        CaseField::Summary,
        CaseField::Reset,
        CaseField::MultiDevice,
        CaseField::MultiStage,
        CaseField::ChildCaseNum,
    ];

    /// The inventory key for this field.
    pub fn key(self) -> &'static str {
        match self {
            CaseField::TestApp => "Test App",
            CaseField::Sdk => "SDK",
            CaseField::TestEnvironment => "test environment",
            CaseField::Summary => "summary",
            CaseField::Reset => "reset",
            CaseField::MultiDevice => "multi_device",
            CaseField::MultiStage => "multi_stage",
            CaseField::ChildCaseNum => "child case num",
        }
    }
}

impl fmt::Display for CaseField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A scalar attribute value, as it appears in the inventory.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum AttrValue {
    /// An explicit null.
    Null,

    /// A boolean.
    Bool(bool),

    /// An integer.
    Int(i64),

    /// A string.
    Str(String),
}

impl AttrValue {
    /// Converts a YAML value, returning `None` for floats, sequences, mappings and tagged values.
    pub fn from_yaml(value: &serde_yaml::Value) -> Option<Self> {
        match value {
            serde_yaml::Value::Null => Some(AttrValue::Null),
            serde_yaml::Value::Bool(b) => Some(AttrValue::Bool(*b)),
            serde_yaml::Value::Number(n) => n.as_i64().map(AttrValue::Int),
            serde_yaml::Value::String(s) => Some(AttrValue::Str(s.clone())),
            serde_yaml::Value::Sequence(_)
            | serde_yaml::Value::Mapping(_)
            | serde_yaml::Value::Tagged(_) => None,
        }
    }

    fn to_text(&self) -> Option<String> {
        match self {
            AttrValue::Null => None,
            AttrValue::Bool(b) => Some(b.to_string()),
            AttrValue::Int(n) => Some(n.to_string()),
            AttrValue::Str(s) => Some(s.clone()),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Null => f.write_str("null"),
            AttrValue::Bool(b) => write!(f, "{b}"),
            AttrValue::Int(n) => write!(f, "{n}"),
            AttrValue::Str(s) => write!(f, "{s:?}"),
        }
    }
}

/// A single unit test case.
///
/// Cases are immutable once ingested.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Case {
    index: usize,
    test_app: String,
    sdk: String,
    test_environment: String,
    summary: String,
    reset: String,
    multi_device: bool,
    multi_stage: bool,
    child_case_num: Option<u32>,
    attrs: IndexMap<String, AttrValue>,
}

impl Case {
    /// Ingests a case from its raw inventory attributes.
    ///
    /// `index` is the position of the case in the inventory, used for diagnostics.
    pub fn from_attrs(
        index: usize,
        raw: IndexMap<String, serde_yaml::Value>,
    ) -> Result<Self, CaseParseError> {
        let mut attrs = IndexMap::with_capacity(raw.len());
        for (raw_name, value) in raw {
            let name = canonical_attr_name(&raw_name).to_owned();
            if attrs.contains_key(&name) {
                return Err(CaseParseError::invalid_field(
                    index,
                    None,
                    name,
                    format!("given more than once, last as `{raw_name}`"),
                ));
            }
            match AttrValue::from_yaml(&value) {
                Some(value) => {
                    attrs.insert(name, value);
                }
                None if CaseField::ALL.iter().any(|field| field.key() == name) => {
                    return Err(CaseParseError::invalid_field(
                        index,
                        None,
                        name,
                        "expected a scalar value",
                    ));
                }
                None => {
                    tracing::debug!(
                        "case {index}: ignoring non-scalar attribute `{name}` for filtering"
                    );
                }
            }
        }

        Self::from_canonical_attrs(index, attrs)
    }

    fn from_canonical_attrs(
        index: usize,
        attrs: IndexMap<String, AttrValue>,
    ) -> Result<Self, CaseParseError> {
        // The summary is read first so that later errors can name the case.
        let summary = required_text(index, None, &attrs, CaseField::Summary)?;
        let name = Some(summary.as_str());

        let test_app = required_text(index, name, &attrs, CaseField::TestApp)?;
        let sdk = required_text(index, name, &attrs, CaseField::Sdk)?;
        let test_environment = required_text(index, name, &attrs, CaseField::TestEnvironment)?;
        let reset = match attrs.get(CaseField::Reset.key()) {
            Some(value) => value.to_text().unwrap_or_default(),
            None => return Err(CaseParseError::missing_field(index, name, CaseField::Reset)),
        };
        let multi_device = required_flag(index, name, &attrs, CaseField::MultiDevice)?;
        let multi_stage = required_flag(index, name, &attrs, CaseField::MultiStage)?;

        let child_case_num = match attrs.get(CaseField::ChildCaseNum.key()) {
            None | Some(AttrValue::Null) => None,
            Some(AttrValue::Int(n)) => Some(u32::try_from(*n).map_err(|_| {
                CaseParseError::invalid_field(
                    index,
                    name,
                    CaseField::ChildCaseNum.key(),
                    format!("expected a non-negative integer, found {n}"),
                )
            })?),
            Some(other) => {
                return Err(CaseParseError::invalid_field(
                    index,
                    name,
                    CaseField::ChildCaseNum.key(),
                    format!("expected a non-negative integer, found {other}"),
                ));
            }
        };

        Ok(Self {
            index,
            test_app,
            sdk,
            test_environment,
            summary,
            reset,
            multi_device,
            multi_stage,
            child_case_num,
            attrs,
        })
    }

    /// The position of this case in the inventory.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The application identifier.
    pub fn test_app(&self) -> &str {
        &self.test_app
    }

    /// The SDK identifier.
    pub fn sdk(&self) -> &str {
        &self.sdk
    }

    /// The test environment identifier.
    pub fn test_environment(&self) -> &str {
        &self.test_environment
    }

    /// The case name.
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// The reset policy.
    pub fn reset(&self) -> &str {
        &self.reset
    }

    /// Whether the case spans multiple devices.
    pub fn multi_device(&self) -> bool {
        self.multi_device
    }

    /// Whether the case spans multiple execution stages.
    pub fn multi_stage(&self) -> bool {
        self.multi_stage
    }

    /// The number of child cases, if present.
    pub fn child_case_num(&self) -> Option<u32> {
        self.child_case_num
    }

    /// Looks up an attribute by name. Aliases are resolved.
    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(canonical_attr_name(name))
    }
}

fn required_text(
    index: usize,
    name: Option<&str>,
    attrs: &IndexMap<String, AttrValue>,
    field: CaseField,
) -> Result<String, CaseParseError> {
    attrs
        .get(field.key())
        .and_then(AttrValue::to_text)
        .ok_or_else(|| CaseParseError::missing_field(index, name, field))
}

fn required_flag(
    index: usize,
    name: Option<&str>,
    attrs: &IndexMap<String, AttrValue>,
    field: CaseField,
) -> Result<bool, CaseParseError> {
    let value = match attrs.get(field.key()) {
        None | Some(AttrValue::Null) => {
            return Err(CaseParseError::missing_field(index, name, field));
        }
        Some(value) => value,
    };

    let flag = match value {
        AttrValue::Bool(b) => Some(*b),
        AttrValue::Int(0) => Some(false),
        AttrValue::Int(1) => Some(true),
        AttrValue::Str(s) if s.eq_ignore_ascii_case("yes") || s.eq_ignore_ascii_case("true") => {
            Some(true)
        }
        AttrValue::Str(s) if s.eq_ignore_ascii_case("no") || s.eq_ignore_ascii_case("false") => {
            Some(false)
        }
        _ => None,
    };

    flag.ok_or_else(|| {
        CaseParseError::invalid_field(
            index,
            name,
            field.key(),
            format!("expected Yes/No or a boolean, found {value}"),
        )
    })
}
