// Copyright (c) The ut-assign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Writing one YAML configuration file per bound job instance.

use crate::{
    errors::WriteConfigError,
    job::{CaseRecord, JobDescriptor},
    plan::JobPlan,
};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;

#[derive(Serialize)]
struct Payload<'a> {
    #[serde(rename = "CaseConfig")]
    case_config: Vec<CaseConfigEntry<'a>>,
}

#[derive(Serialize)]
struct CaseConfigEntry<'a> {
    name: &'static str,
    extra_data: &'a [CaseRecord],
}

/// Renders the configuration payload CI consumes for a descriptor.
pub fn render_payload(descriptor: &JobDescriptor) -> Result<String, serde_yaml::Error> {
    let payload = Payload {
        case_config: vec![CaseConfigEntry {
            name: descriptor.function_name(),
            extra_data: descriptor.records(),
        }],
    };
    serde_yaml::to_string(&payload)
}

/// Writes job configuration files into an output directory.
#[derive(Clone, Debug)]
pub struct ConfigWriter {
    output_dir: Utf8PathBuf,
}

impl ConfigWriter {
    /// Creates a writer for `output_dir`. The directory is created on write if missing.
    pub fn new(output_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// The output directory.
    pub fn output_dir(&self) -> &Utf8Path {
        &self.output_dir
    }

    /// Writes one file per instance in `plan` and returns the written paths, in plan order.
    ///
    /// Every payload is rendered before the first file is written, so a rendering failure leaves
    /// the output directory untouched.
    pub fn write_plan(&self, plan: &JobPlan) -> Result<Vec<Utf8PathBuf>, WriteConfigError> {
        let rendered = plan
            .instances()
            .iter()
            .map(|instance| {
                let contents = render_payload(instance.descriptor()).map_err(|err| {
                    WriteConfigError::Render {
                        job: instance.display_name(),
                        err,
                    }
                })?;
                Ok((self.output_dir.join(instance.file_name()), contents))
            })
            .collect::<Result<Vec<_>, WriteConfigError>>()?;

        fs_err::create_dir_all(&self.output_dir).map_err(|err| WriteConfigError::CreateDir {
            dir: self.output_dir.clone(),
            err,
        })?;

        let mut written = Vec::with_capacity(rendered.len());
        for (path, contents) in rendered {
            fs_err::write(&path, contents).map_err(|err| WriteConfigError::Write {
                path: path.clone(),
                err,
            })?;
            tracing::debug!("wrote {path}");
            written.push(path);
        }

        Ok(written)
    }
}
