// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    ExpectedError, Result,
    exit_codes::DigestExitCode,
    output::{OutputContext, OutputOpts, OutputWriter},
};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand, ValueEnum};
use itertools::Itertools;
use serde::Serialize;
use std::io::{BufWriter, Write};
use testdigest_core::{
    aggregate::{aggregate, are_runs_from_same_execution, missing_shards},
    config::DigestConfig,
    junit::write_junit,
    model::{NormalizedTestRun, TestStatus},
    normalize::Normalizer,
    parse::ReportParser,
    query::{TestOrder, TestPredicate, filter_tests, sort_tests, summarize},
    stats::compute_statistics,
};
use tracing::{debug, info, warn};

/// Normalize, merge and summarize JSON test-run reports.
#[derive(Debug, Parser)]
#[command(
    version,
    styles = crate::output::clap_styles::style(),
    max_term_width = 100
)]
pub struct TestdigestApp {
    #[clap(flatten)]
    output: OutputOpts,

    #[clap(flatten)]
    config_opts: ConfigOpts,

    #[clap(subcommand)]
    command: Command,
}

impl TestdigestApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app.
    ///
    /// Returns the exit code.
    pub fn exec(self, output_writer: &mut OutputWriter) -> Result<i32> {
        let config = self.config_opts.make_config()?;
        debug!(
            "status policy: {:?}, slowest count: {}",
            config.normalize.status_policy, config.stats.slowest_count
        );
        let parser = ReportParser::new(Normalizer::new(config.normalize.clone()));

        match self.command {
            Command::Normalize { reports } => {
                let run = aggregate(reports.parse_all(&parser)?)?;
                let run = reports.filter.apply(&run)?;
                write_json(&run, output_writer)?;
                reports.finish(&run)
            }
            Command::Merge { reports, strict } => {
                let runs = reports.parse_all(&parser)?;
                if !are_runs_from_same_execution(&runs) {
                    if strict {
                        return Err(ExpectedError::InconsistentShards {
                            paths: reports.reports.clone(),
                        });
                    }
                    warn!("reports do not look like the shards of a single execution");
                }
                let missing = missing_shards(&runs);
                if !missing.is_empty() {
                    warn!("missing shards: {}", missing.iter().join(", "));
                }

                let run = aggregate(runs)?;
                let run = reports.filter.apply(&run)?;
                write_json(&run, output_writer)?;
                reports.finish(&run)
            }
            Command::Stats { reports } => {
                let run = aggregate(reports.parse_all(&parser)?)?;
                let run = reports.filter.apply(&run)?;
                write_json(&compute_statistics(&run), output_writer)?;
                reports.finish(&run)
            }
            Command::Summary { reports, slowest } => {
                let run = aggregate(reports.parse_all(&parser)?)?;
                let run = reports.filter.apply(&run)?;
                let slowest = slowest.unwrap_or(config.stats.slowest_count);
                write_json(&summarize(&run, slowest), output_writer)?;
                reports.finish(&run)
            }
            Command::Junit {
                reports,
                output: junit_output,
                name,
            } => {
                let run = aggregate(reports.parse_all(&parser)?)?;
                let run = reports.filter.apply(&run)?;
                write_junit_file(&run, &name, &junit_output)?;
                info!(
                    "wrote JUnit report for {} tests to `{junit_output}`",
                    run.totals.total
                );
                reports.finish(&run)
            }
        }
    }
}

#[derive(Debug, Args)]
struct ConfigOpts {
    /// Config file layered over the defaults
    #[arg(long, global = true, value_name = "PATH", env = "TESTDIGEST_CONFIG")]
    config: Option<Utf8PathBuf>,
}

impl ConfigOpts {
    fn make_config(&self) -> Result<DigestConfig> {
        Ok(DigestConfig::from_sources(self.config.as_deref())?)
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Normalize reports and print the run as JSON
    ///
    /// Several reports are aggregated into a single run.
    Normalize {
        #[clap(flatten)]
        reports: ReportOpts,
    },
    /// Merge the reports of a sharded run and print the merged run as JSON
    ///
    /// Reports that do not look like the shards of a single execution produce a warning, or an
    /// error with --strict.
    Merge {
        #[clap(flatten)]
        reports: ReportOpts,

        /// Fail if the reports are not the shards of a single execution
        #[arg(long)]
        strict: bool,
    },
    /// Print statistics about the selected tests as JSON
    Stats {
        #[clap(flatten)]
        reports: ReportOpts,
    },
    /// Print a summary of the selected tests as JSON
    Summary {
        #[clap(flatten)]
        reports: ReportOpts,

        /// Number of slowest tests to list [default: from config]
        #[arg(long, value_name = "N")]
        slowest: Option<usize>,
    },
    /// Write the selected tests as a JUnit XML report
    Junit {
        #[clap(flatten)]
        reports: ReportOpts,

        /// Path to write the JUnit report to
        #[arg(long, short, value_name = "PATH")]
        output: Utf8PathBuf,

        /// Name of the JUnit report
        #[arg(long, default_value = "testdigest")]
        name: String,
    },
}

#[derive(Debug, Args)]
struct ReportOpts {
    /// Reports to read
    #[arg(required = true, value_name = "REPORTS")]
    reports: Vec<Utf8PathBuf>,

    /// Exit with a non-zero status if any selected test failed
    #[arg(long)]
    fail_on_failures: bool,

    #[clap(flatten)]
    filter: FilterOpts,
}

impl ReportOpts {
    fn parse_all(&self, parser: &ReportParser) -> Result<Vec<NormalizedTestRun>> {
        self.reports
            .iter()
            .map(|path| {
                debug!("parsing report `{path}`");
                parser
                    .parse(path.as_path())
                    .map_err(|err| ExpectedError::report_parse_error(path, err))
            })
            .collect()
    }

    fn finish(&self, run: &NormalizedTestRun) -> Result<i32> {
        if self.fail_on_failures && run.totals.failed > 0 {
            return Err(ExpectedError::TestsFailed {
                failed: run.totals.failed,
            });
        }
        Ok(DigestExitCode::OK)
    }
}

#[derive(Debug, Default, Args)]
#[command(next_help_heading = "FILTER OPTIONS")]
struct FilterOpts {
    /// Only include tests with this status (can be repeated)
    #[arg(long, value_name = "STATUS")]
    status: Vec<TestStatus>,

    /// Only include tests from this project (can be repeated)
    #[arg(long, value_name = "PROJECT")]
    project: Vec<String>,

    /// Only include tests whose title matches this regex
    #[arg(long, value_name = "REGEX")]
    grep: Option<String>,

    /// Sort tests by this key
    #[arg(long, value_enum, value_name = "KEY")]
    sort: Option<SortKey>,

    /// Reverse the sort order
    #[arg(long, requires = "sort")]
    reverse: bool,
}

impl FilterOpts {
    fn predicate(&self) -> Result<Option<TestPredicate>> {
        let mut predicates = Vec::new();
        if !self.status.is_empty() {
            predicates.push(TestPredicate::any_of(
                self.status.iter().copied().map(TestPredicate::status),
            ));
        }
        if !self.project.is_empty() {
            predicates.push(TestPredicate::any_of(
                self.project.iter().map(TestPredicate::project),
            ));
        }
        if let Some(pattern) = &self.grep {
            predicates.push(
                TestPredicate::title_matches(pattern)
                    .map_err(|err| ExpectedError::invalid_grep_pattern(pattern, err))?,
            );
        }

        Ok((!predicates.is_empty()).then(|| TestPredicate::all_of(predicates)))
    }

    fn order(&self) -> Option<TestOrder> {
        let order = self.sort?.to_order();
        Some(if self.reverse { order.reverse() } else { order })
    }

    fn apply(&self, run: &NormalizedTestRun) -> Result<NormalizedTestRun> {
        let mut run = match self.predicate()? {
            Some(predicate) => filter_tests(run, &predicate),
            None => run.clone(),
        };
        if let Some(order) = self.order() {
            run = sort_tests(&run, &order);
        }
        Ok(run)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum SortKey {
    Duration,
    Title,
    File,
    Status,
}

impl SortKey {
    fn to_order(self) -> TestOrder {
        match self {
            Self::Duration => TestOrder::Duration,
            Self::Title => TestOrder::FullTitle,
            Self::File => TestOrder::File,
            Self::Status => TestOrder::Status,
        }
    }
}

fn write_json(value: &impl Serialize, output_writer: &mut OutputWriter) -> Result<()> {
    let mut writer = output_writer.stdout_writer();
    serde_json::to_writer_pretty(&mut writer, value).map_err(ExpectedError::write_output_error)?;
    writeln!(writer).map_err(ExpectedError::write_output_error)?;
    writer.flush().map_err(ExpectedError::write_output_error)
}

fn write_junit_file(run: &NormalizedTestRun, name: &str, path: &Utf8Path) -> Result<()> {
    let io_error = |err| ExpectedError::JunitCreateError {
        path: path.to_owned(),
        err,
    };
    if let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) {
        fs_err::create_dir_all(parent).map_err(io_error)?;
    }
    let file = fs_err::File::create(path).map_err(io_error)?;

    let mut writer = BufWriter::new(file);
    write_junit(run, name, &mut writer).map_err(|err| ExpectedError::JunitWriteError {
        path: path.to_owned(),
        err,
    })?;
    writer.flush().map_err(io_error)
}
