// Copyright (c) The ut-assign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reading the case inventory produced by the unit test build.

use crate::{case::Case, errors::InventoryError};
use camino::Utf8Path;
use indexmap::IndexMap;
use serde::Deserialize;

/// A snapshot of every case in the inventory, in file order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CaseInventory {
    cases: Vec<Case>,
}

#[derive(Deserialize)]
struct InventoryDeserialize {
    #[serde(rename = "test cases")]
    test_cases: Vec<IndexMap<String, serde_yaml::Value>>,
}

impl CaseInventory {
    /// Reads the inventory from a YAML file.
    pub fn from_path(path: &Utf8Path) -> Result<Self, InventoryError> {
        let contents = fs_err::read_to_string(path).map_err(|err| InventoryError::Read {
            path: path.to_owned(),
            err,
        })?;
        Self::from_yaml_str(path, &contents)
    }

    /// Parses the inventory from YAML. `path` is only used for diagnostics.
    pub fn from_yaml_str(path: &Utf8Path, contents: &str) -> Result<Self, InventoryError> {
        let deserializer = serde_yaml::Deserializer::from_str(contents);
        let raw: InventoryDeserialize =
            serde_path_to_error::deserialize(deserializer).map_err(|err| InventoryError::Parse {
                path: path.to_owned(),
                err,
            })?;

        let cases = raw
            .test_cases
            .into_iter()
            .enumerate()
            .map(|(index, attrs)| Case::from_attrs(index, attrs))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| InventoryError::InvalidCase {
                path: path.to_owned(),
                err,
            })?;

        tracing::debug!("read {} cases from {path}", cases.len());
        Ok(Self { cases })
    }

    /// The cases, in file order.
    pub fn cases(&self) -> &[Case] {
        &self.cases
    }
}
