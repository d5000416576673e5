//! Aggregation of the coverage tool's per-file summary table.
//!
//! The tool prints one table row per file, for example
//!
//! ```text
//! | src/Airdrop.sol | 95.00% (19/20) | 90.00% (18/20) | 50.00% (1/2) | 100.00% (3/3) |
//! ```
//!
//! Only rows for files under the configured source prefix are considered and
//! the first `percent% (covered/total)` group of a row (the line coverage
//! column) is used. Rows that do not match are ignored.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use regex::Regex;
use tracing::{debug, info, instrument, warn};

use crate::airdrop::tools::error::{Result, ToolError};
use crate::airdrop::tools::model::CoverageLine;

/// Prefix of the source files whose coverage is aggregated.
pub const DEFAULT_PREFIX: &str = "src/";

/// Arguments passed to `forge` to obtain the summary table.
pub const FORGE_ARGS: [&str; 5] = [
    "coverage",
    "--ir-minimum",
    "--exclude-tests",
    "--report",
    "summary",
];

const COVERAGE_PATTERN: &str = r"(\d+\.\d+)% \((\d+)/(\d+)\)";

/// Extracts [`CoverageLine`]s from the tool's textual output.
#[derive(Debug, Clone)]
pub struct CoverageParser {
    prefix: String,
    marker: String,
    coverage: Regex,
    path: Regex,
}

impl CoverageParser {
    pub fn new(prefix: &str) -> Result<Self> {
        Ok(Self {
            prefix: prefix.to_string(),
            marker: format!("| {prefix}"),
            coverage: Regex::new(COVERAGE_PATTERN)?,
            path: Regex::new(&format!("{}[^|]+", regex::escape(prefix)))?,
        })
    }

    /// Parses one table row, returning `None` for rows outside the prefix or
    /// without a coverage figure.
    pub fn parse_line(&self, line: &str) -> Option<CoverageLine> {
        if !line.contains(&self.marker) {
            return None;
        }
        let captures = self.coverage.captures(line)?;
        let covered = captures.get(2)?.as_str().parse().ok()?;
        let total = captures.get(3)?.as_str().parse().ok()?;
        let file_path = self
            .path
            .find(line)
            .map(|found| found.as_str().trim().to_string())
            .unwrap_or_default();

        Some(CoverageLine {
            covered,
            total,
            file_path,
        })
    }

    pub fn parse(&self, output: &str) -> CoverageReport {
        let lines: Vec<CoverageLine> = output
            .lines()
            .filter_map(|line| self.parse_line(line))
            .collect();
        debug!(matched = lines.len(), "parsed coverage rows");
        CoverageReport {
            prefix: self.prefix.clone(),
            lines,
        }
    }
}

/// Outcome of a coverage run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverageVerdict {
    /// Every instrumented line under the prefix is covered.
    Complete,
    /// Some lines are not covered.
    Incomplete { missing: i128 },
    /// No row matched, so nothing was verified.
    NoData,
}

impl CoverageVerdict {
    pub fn exit_code(self) -> i32 {
        match self {
            CoverageVerdict::Complete => 0,
            CoverageVerdict::Incomplete { .. } | CoverageVerdict::NoData => 1,
        }
    }
}

/// Aggregated coverage of every matched row.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageReport {
    pub prefix: String,
    pub lines: Vec<CoverageLine>,
}

impl CoverageReport {
    pub fn covered(&self) -> u64 {
        self.lines.iter().map(|line| line.covered).sum()
    }

    pub fn total(&self) -> u64 {
        self.lines.iter().map(|line| line.total).sum()
    }

    /// `total - covered`; negative only for inconsistent tool output.
    pub fn missing_lines(&self) -> i128 {
        i128::from(self.total()) - i128::from(self.covered())
    }

    /// Rows with uncovered lines, in output order.
    pub fn missing_entries(&self) -> impl Iterator<Item = &CoverageLine> {
        self.lines.iter().filter(|line| line.total > line.covered)
    }

    /// Overall percentage, `None` when nothing was instrumented.
    pub fn percent(&self) -> Option<f64> {
        let total = self.total();
        (total > 0).then(|| self.covered() as f64 / total as f64 * 100.0)
    }

    pub fn verdict(&self) -> CoverageVerdict {
        if self.total() == 0 {
            return CoverageVerdict::NoData;
        }
        match self.missing_lines() {
            0 => CoverageVerdict::Complete,
            missing => CoverageVerdict::Incomplete { missing },
        }
    }
}

impl fmt::Display for CoverageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Files with missing coverage:")?;
        for line in self.missing_entries() {
            writeln!(
                f,
                "  Missing {} lines: {}/{} = {:.2}%",
                line.deficit(),
                line.covered,
                line.total,
                line.percent()
            )?;
            writeln!(f, "    {}", line.file_path)?;
        }

        let Some(percent) = self.percent() else {
            return write!(
                f,
                "\nNo {} coverage data found, nothing was verified",
                self.prefix
            );
        };
        writeln!(f)?;
        writeln!(
            f,
            "Total {} coverage: {percent:.2}% ({}/{} lines)",
            self.prefix,
            self.covered(),
            self.total()
        )?;
        write!(
            f,
            "Missing: {} lines to reach 100%",
            self.missing_lines()
        )?;
        if self.verdict() == CoverageVerdict::Complete {
            write!(f, "\n✓ 100% coverage achieved!")?;
        }
        Ok(())
    }
}

/// External process producing the summary table.
#[derive(Debug, Clone)]
pub struct CoverageCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory of the process, normally the project root.
    pub root: PathBuf,
}

impl CoverageCommand {
    /// `forge coverage --ir-minimum --exclude-tests --report summary`.
    pub fn forge(root: impl Into<PathBuf>) -> Self {
        Self::new("forge", FORGE_ARGS, root)
    }

    pub fn new<I, S>(program: impl Into<String>, args: I, root: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            root: root.into(),
        }
    }

    /// Runs the tool to completion and returns its standard output. The exit
    /// status is not interpreted: the table is parsed either way.
    #[instrument(level = "info", skip_all, fields(program = %self.program, root = %self.root.display()))]
    pub fn run(&self) -> Result<String> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.root)
            .output()
            .map_err(|source| ToolError::CoverageTool {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            warn!(status = %output.status, "coverage tool exited unsuccessfully");
        }
        info!(bytes = output.stdout.len(), "captured coverage output");
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Reads a previously saved summary table.
pub fn read_saved_output(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(ToolError::MissingInput(path.to_path_buf()));
    }
    Ok(std::fs::read_to_string(path)?)
}
