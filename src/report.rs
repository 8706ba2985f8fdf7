//! Per-case outcomes and run-level statistics.
//!
//! The aggregator counts failure *events*, not partitioned cases: a
//! completeness violation bumps the fail counter even when the case goes on
//! to pass the renaming check, so `total == ok + fail` does not hold on that
//! one path. That asymmetry is observed upstream behavior and is kept.

use std::fmt;

use crate::render::{GREEN, RED, RESET};

/// The protocol stage a case failed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailStage {
    SourceCheck,
    SmapCheck,
    RenameCheck,
}

impl fmt::Display for FailStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailStage::SourceCheck => write!(f, "source check"),
            FailStage::SmapCheck => write!(f, "semantic map check"),
            FailStage::RenameCheck => write!(f, "renaming check"),
        }
    }
}

/// Terminal outcome of one case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseOutcome {
    Pass,
    Fail(FailStage),
}

/// What the case runner hands to the aggregator.
///
/// `completeness_violation` is carried separately from the terminal outcome
/// because a violated semantic map does not stop the case (see module docs).
/// `Fail(SmapCheck)` as the terminal outcome means a *hard* phase-2 error:
/// a collaborator that could not be invoked or whose output did not parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaseReport {
    pub outcome: CaseOutcome,
    pub completeness_violation: bool,
}

impl CaseReport {
    pub fn pass() -> Self {
        CaseReport {
            outcome: CaseOutcome::Pass,
            completeness_violation: false,
        }
    }

    pub fn fail(stage: FailStage) -> Self {
        CaseReport {
            outcome: CaseOutcome::Fail(stage),
            completeness_violation: false,
        }
    }

    pub fn with_violation(mut self, violation: bool) -> Self {
        self.completeness_violation = violation;
        self
    }
}

/// Run-wide counters, owned by the driver loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub total: u32,
    pub ok: u32,
    pub fail: u32,
}

impl RunStats {
    pub fn new() -> Self {
        RunStats::default()
    }

    /// Record one completed case. Called exactly once per case.
    pub fn record(&mut self, report: &CaseReport) {
        self.total += 1;
        if report.completeness_violation {
            self.fail += 1;
        }
        match report.outcome {
            CaseOutcome::Pass => self.ok += 1,
            CaseOutcome::Fail(_) => self.fail += 1,
        }
    }

    /// True when no failure event was recorded.
    pub fn all_passed(&self) -> bool {
        self.fail == 0
    }

    /// Render the final summary. Called exactly once at the end of a run.
    pub fn render(&self) -> String {
        let bar_color = if self.all_passed() { GREEN } else { RED };
        let bar = "\u{2588}".repeat(72);
        format!(
            "\nSummary (total: {})\n{GREEN}  PASS{RESET}: {}\n{RED}  FAIL{RESET}: {}\n{bar_color}{bar}{RESET}",
            self.total, self.ok, self.fail
        )
    }
}
