// Copyright (c) The ut-assign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    ExpectedError,
    errors::Result,
    output::{OutputContext, OutputOpts, OutputWriter, PlanStyles},
};
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand, ValueEnum};
use owo_colors::OwoColorize;
use std::io::Write;
use swrite::{SWrite, swriteln};
use ut_assign_metadata::AssignExitCode;
use ut_assign_runner::{
    assign::assign,
    case_filter::CaseFilter,
    ci_config::CiTopology,
    config::AssignConfig,
    inventory::CaseInventory,
    output::ConfigWriter,
    plan::JobPlan,
};

/// Assigns embedded unit test cases to CI jobs.
///
/// Cases from the inventory are filtered, grouped by the application, SDK and test environment
/// they need, split into jobs of at most 30 cases, and bound to the unit test jobs declared in
/// the CI configuration.
#[derive(Debug, Parser)]
#[command(version, name = "ut-assign")]
pub struct UtAssignApp {
    #[command(flatten)]
    output: OutputOpts,

    #[command(flatten)]
    config_opts: ConfigOpts,

    #[command(flatten)]
    filter_opts: FilterOpts,

    #[command(subcommand)]
    command: Command,
}

impl UtAssignApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app, returning the exit code on success.
    pub fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        let workspace_root = match self.config_opts.workspace_root {
            Some(root) => root,
            None => current_dir()?,
        };
        let config = AssignConfig::from_sources(
            &workspace_root,
            self.config_opts.config_file.as_deref(),
        )?;
        let filter = self.filter_opts.make_filter(&config)?;

        match self.command {
            Command::Assign {
                inputs,
                output_path,
            } => {
                let (plan, _) = inputs.make_plan(&config, &filter)?;
                let writer = ConfigWriter::new(output_path);
                let written = writer.write_plan(&plan)?;
                tracing::info!(
                    "wrote {} job configs to {}",
                    written.len(),
                    writer.output_dir(),
                );
                if output.verbose {
                    let mut writer = output_writer.stdout_writer();
                    for path in &written {
                        writeln!(writer, "{path}").map_err(ExpectedError::write_output_error)?;
                    }
                    writer.flush().map_err(ExpectedError::write_output_error)?;
                }
            }
            Command::Show {
                inputs,
                message_format,
            } => {
                let (plan, case_count) = inputs.make_plan(&config, &filter)?;
                let rendered = match message_format {
                    MessageFormat::Human => {
                        format_plan(&plan, case_count, &output.stdout_styles(), output.verbose)
                    }
                    MessageFormat::Json => {
                        let mut json = serde_json::to_string_pretty(&plan.to_summary(case_count))
                            .map_err(|err| ExpectedError::SerializePlanError { err })?;
                        json.push('\n');
                        json
                    }
                };

                let mut writer = output_writer.stdout_writer();
                writer
                    .write_all(rendered.as_bytes())
                    .map_err(ExpectedError::write_output_error)?;
                writer.flush().map_err(ExpectedError::write_output_error)?;
            }
        }

        Ok(AssignExitCode::OK)
    }
}

fn current_dir() -> Result<Utf8PathBuf> {
    let dir = std::env::current_dir().map_err(|err| ExpectedError::CurrentDirFailed { err })?;
    Utf8PathBuf::try_from(dir).map_err(|err| ExpectedError::CurrentDirInvalidUtf8 { err })
}

#[derive(Debug, Args)]
struct ConfigOpts {
    /// Config file [default: workspace-root/.config/ut-assign.toml]
    #[arg(long, global = true, value_name = "PATH")]
    config_file: Option<Utf8PathBuf>,

    /// Workspace root [default: current directory]
    #[arg(long, global = true, value_name = "PATH")]
    workspace_root: Option<Utf8PathBuf>,
}

#[derive(Debug, Args)]
#[command(next_help_heading = "Filter options")]
struct FilterOpts {
    /// Only assign cases whose ATTR is one of the listed values (may be repeated)
    ///
    /// Cases without ATTR are always kept. String values are compared case-insensitively;
    /// `true`, `false` and integers are compared as such.
    #[arg(long = "filter", short = 'F', global = true, value_name = "ATTR=VALUE[,VALUE...]")]
    filters: Vec<String>,

    /// Case filter as a JSON object mapping attributes to lists of allowed values
    #[arg(
        long,
        global = true,
        value_name = "JSON",
        env = "BOT_CASE_FILTER",
        hide_env_values = true
    )]
    bot_filter: Option<String>,
}

impl FilterOpts {
    /// Combines the config file filter, `--filter` arguments and the bot filter, in that order.
    fn make_filter(&self, config: &AssignConfig) -> Result<CaseFilter> {
        let mut filter = config.case_filter().clone();

        let args = CaseFilter::parse_args(&self.filters)
            .map_err(|err| ExpectedError::case_filter_parse_error("--filter", err))?;
        filter.extend(args);

        if let Some(json) = self.bot_filter.as_deref().filter(|json| !json.trim().is_empty()) {
            let bot = CaseFilter::parse_json(json).map_err(|err| {
                ExpectedError::case_filter_parse_error("--bot-filter or BOT_CASE_FILTER", err)
            })?;
            filter.extend(bot);
        }

        Ok(filter)
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Assign cases to CI jobs and write one config file per job instance
    ///
    /// Files are named after the CI job, with the instance number appended for jobs with
    /// `parallel` greater than 1.
    Assign {
        #[command(flatten)]
        inputs: InputOpts,

        /// Directory to write job configs to
        #[arg(value_name = "OUTPUT_PATH")]
        output_path: Utf8PathBuf,
    },

    /// Show how cases would be assigned without writing any files
    ///
    /// Use --message-format json to get machine-readable output.
    Show {
        #[command(flatten)]
        inputs: InputOpts,

        /// Output format
        #[arg(short = 'T', long, value_enum, default_value_t, value_name = "FMT")]
        message_format: MessageFormat,
    },
}

#[derive(Debug, Args)]
struct InputOpts {
    /// Case inventory produced by the unit test build
    #[arg(value_name = "TEST_CASES")]
    test_cases: Utf8PathBuf,

    /// GitLab CI configuration declaring the unit test jobs
    #[arg(value_name = "CI_CONFIG")]
    ci_config: Utf8PathBuf,
}

impl InputOpts {
    /// Runs the pipeline up to binding. Returns the plan and the number of cases that survived
    /// filtering.
    fn make_plan(&self, config: &AssignConfig, filter: &CaseFilter) -> Result<(JobPlan, usize)> {
        let inventory = CaseInventory::from_path(&self.test_cases)?;
        let topology = CiTopology::from_path(&self.ci_config, config.job_pattern())?;

        let cases = filter.filter(inventory.cases());
        tracing::debug!(
            "{} of {} cases selected",
            cases.len(),
            inventory.cases().len(),
        );

        let descriptors = assign(cases.iter().copied())?;
        let plan = JobPlan::bind(&topology, descriptors)?;
        Ok((plan, cases.len()))
    }
}

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
enum MessageFormat {
    #[default]
    Human,
    Json,
}

fn format_plan(plan: &JobPlan, case_count: usize, styles: &PlanStyles, verbose: bool) -> String {
    let mut out = String::new();
    swriteln!(
        out,
        "{} cases assigned to {} job instances",
        case_count.style(styles.count),
        plan.instances().len().style(styles.count),
    );

    for instance in plan.instances() {
        let descriptor = instance.descriptor();
        swriteln!(
            out,
            "  {} -> {}",
            instance.display_name().style(styles.job),
            instance.file_name(),
        );
        swriteln!(
            out,
            "      {}: {} cases [{}]",
            descriptor.function_name().style(styles.function),
            descriptor.records().len().style(styles.count),
            descriptor.id(),
        );
        if verbose {
            for record in descriptor.records() {
                swriteln!(out, "          {}", record.name);
            }
        }
    }

    for idle in plan.idle_instances() {
        swriteln!(out, "  {} (no cases)", idle.style(styles.idle));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Color;
    use camino_tempfile::Utf8TempDir;
    use clap::{CommandFactory, FromArgMatches, builder::Resettable};
    use camino_tempfile_ext::prelude::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use ut_assign_metadata::PlanSummary;

    static TEST_CASES: &str = indoc! {r#"
        test cases:
        - Test App: UT_default
          SDK: ESP32_IDF
          test environment: UT_T1_1
          summary: "heap allocate and free"
          reset: ""
          multi_device: "No"
          multi_stage: "No"
          module: heap
        - Test App: UT_default
          SDK: ESP32_IDF
          test environment: UT_T1_1
          summary: "gpio master slave"
          reset: ""
          multi_device: "Yes"
          multi_stage: "No"
          child case num: 2
          module: gpio
    "#};

    static CI_CONFIG: &str = indoc! {r#"
        UT_001:
          parallel: 2
          tags: [ESP32_IDF, UT_T1_1, UT_default]
        UT_002:
          tags: [ESP32_IDF, UT_T2_1, UT_default]
    "#};

    fn setup() -> Utf8TempDir {
        let temp_dir = camino_tempfile::tempdir().expect("temp dir created");
        temp_dir
            .child("TestCaseAll.yml")
            .write_str(TEST_CASES)
            .expect("inventory written");
        temp_dir
            .child(".gitlab-ci.yml")
            .write_str(CI_CONFIG)
            .expect("CI config written");
        temp_dir
    }

    /// The app's command with every environment variable binding removed.
    fn command_without_env() -> clap::Command {
        ["verbose", "color", "bot_filter"]
            .into_iter()
            .fold(UtAssignApp::command(), |command, id| {
                command.mut_arg(id, |arg| arg.env(Resettable::Reset))
            })
    }

    fn run(args: &[&str]) -> (Result<i32>, String) {
        let matches = command_without_env()
            .try_get_matches_from(args)
            .expect("arguments should parse");
        let app = UtAssignApp::from_arg_matches(&matches).expect("matches should convert");
        let output = OutputContext {
            verbose: app.output.verbose,
            color: Color::Never,
        };
        let mut writer = OutputWriter::Test { stdout: Vec::new() };
        let result = app.exec(output, &mut writer);
        let OutputWriter::Test { stdout } = writer else {
            unreachable!("writer is always a test writer");
        };
        (result, String::from_utf8(stdout).expect("stdout is UTF-8"))
    }

    #[test]
    fn show_human() {
        let temp_dir = setup();
        let root = temp_dir.path();
        let (result, stdout) = run(&[
            "ut-assign",
            "--workspace-root",
            root.as_str(),
            "show",
            root.join("TestCaseAll.yml").as_str(),
            root.join(".gitlab-ci.yml").as_str(),
        ]);

        assert_eq!(result.expect("show succeeds"), AssignExitCode::OK);
        assert_eq!(
            stdout,
            indoc! {"
                2 cases assigned to 2 job instances
                  UT_001 1/2 -> UT_001_1.yml
                      run_unit_test_cases: 1 cases [group-0 (1/1)]
                  UT_001 2/2 -> UT_001_2.yml
                      run_multiple_devices_cases: 1 cases [group-1 (1/1)]
                  UT_002 (no cases)
            "}
        );
    }

    #[test]
    fn show_json_with_filter() {
        let temp_dir = setup();
        let root = temp_dir.path();
        let (result, stdout) = run(&[
            "ut-assign",
            "--workspace-root",
            root.as_str(),
            "show",
            "--message-format",
            "json",
            "--filter",
            "module=gpio",
            root.join("TestCaseAll.yml").as_str(),
            root.join(".gitlab-ci.yml").as_str(),
        ]);

        assert_eq!(result.expect("show succeeds"), AssignExitCode::OK);
        let summary = PlanSummary::parse_json(&stdout).expect("output is a plan summary");
        assert_eq!(summary.case_count, 1);
        assert_eq!(summary.jobs.len(), 1);
        assert_eq!(summary.jobs[0].name, "UT_001 1/2");
        assert_eq!(summary.jobs[0].case_configs[0].function, "run_multiple_devices_cases");
        assert_eq!(summary.idle_jobs, vec!["UT_001 2/2", "UT_002"]);
    }

    #[test]
    fn assign_writes_files() {
        let temp_dir = setup();
        let root = temp_dir.path();
        let output_dir = root.join("out");
        let (result, stdout) = run(&[
            "ut-assign",
            "--workspace-root",
            root.as_str(),
            "assign",
            "--verbose",
            root.join("TestCaseAll.yml").as_str(),
            root.join(".gitlab-ci.yml").as_str(),
            output_dir.as_str(),
        ]);

        assert_eq!(result.expect("assign succeeds"), AssignExitCode::OK);
        assert_eq!(
            stdout,
            format!(
                "{}\n{}\n",
                output_dir.join("UT_001_1.yml"),
                output_dir.join("UT_001_2.yml"),
            )
        );
        assert!(output_dir.join("UT_001_2.yml").is_file());
        assert!(!output_dir.join("UT_002.yml").exists());
    }

    #[test]
    fn bind_failure_exit_code() {
        let temp_dir = setup();
        let root = temp_dir.path();
        temp_dir
            .child("one-job.yml")
            .write_str("UT_002:\n  tags: [ESP32_IDF, UT_T2_1, UT_default]\n")
            .expect("CI config written");

        let (result, _) = run(&[
            "ut-assign",
            "--workspace-root",
            root.as_str(),
            "show",
            root.join("TestCaseAll.yml").as_str(),
            root.join("one-job.yml").as_str(),
        ]);
        let err = result.expect_err("no job accepts the cases");
        assert_eq!(err.process_exit_code(), AssignExitCode::BIND_FAILED);
    }

    #[test]
    fn invalid_bot_filter() {
        let temp_dir = setup();
        let root = temp_dir.path();
        let (result, _) = run(&[
            "ut-assign",
            "--workspace-root",
            root.as_str(),
            "--bot-filter",
            "[1, 2]",
            "show",
            root.join("TestCaseAll.yml").as_str(),
            root.join(".gitlab-ci.yml").as_str(),
        ]);
        let err = result.expect_err("bot filter must be an object");
        assert_eq!(err.process_exit_code(), AssignExitCode::SETUP_ERROR);
    }

    #[test]
    fn env_bindings() {
        let command = UtAssignApp::command();
        let envs: Vec<(&str, &str)> = command
            .get_arguments()
            .filter_map(|arg| Some((arg.get_id().as_str(), arg.get_env()?.to_str()?)))
            .collect();
        assert_eq!(
            envs,
            vec![
                ("verbose", "UT_ASSIGN_VERBOSE"),
                ("color", "UT_ASSIGN_COLOR"),
                ("bot_filter", "BOT_CASE_FILTER"),
            ]
        );

        assert!(
            command_without_env()
                .get_arguments()
                .all(|arg| arg.get_env().is_none())
        );
    }
}
