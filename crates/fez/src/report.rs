//! Per-item outcomes of batch commands.

use std::fmt::{self, Display};

use itertools::Itertools;
use miette::miette;
use owo_colors::{OwoColorize, Stream::Stdout};
use tracing::{error, info, warn};

/// What happened to one file of a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Transformed by a converter
    Converted { format: String },
    /// Copied without conversion
    Passthrough { reason: String },
    /// Skipped after an error
    Failed { error: String },
}

impl Outcome {
    pub fn converted(format: impl Into<String>) -> Outcome {
        Outcome::Converted {
            format: format.into(),
        }
    }

    pub fn passthrough(reason: impl Into<String>) -> Outcome {
        Outcome::Passthrough {
            reason: reason.into(),
        }
    }

    pub fn failed(error: impl Display) -> Outcome {
        Outcome::Failed {
            error: error.to_string(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed { .. })
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Converted { format } => write!(
                f,
                "{} {format}",
                "converted".if_supports_color(Stdout, |t| t.green())
            ),
            Outcome::Passthrough { reason } => write!(
                f,
                "{} {reason}",
                "kept".if_supports_color(Stdout, |t| t.yellow())
            ),
            Outcome::Failed { error } => write!(
                f,
                "{} {error}",
                "failed".if_supports_color(Stdout, |t| t.red())
            ),
        }
    }
}

/// Outcomes of a batch, in processing order
#[derive(Debug, Default)]
pub struct BatchReport {
    items: Vec<(String, Outcome)>,
}

impl BatchReport {
    pub fn new() -> BatchReport {
        BatchReport::default()
    }

    /// Record and log the outcome for `name`
    pub fn record(&mut self, name: impl Into<String>, outcome: Outcome) {
        let name = name.into();
        match &outcome {
            Outcome::Converted { format } => info!(%name, %format, "converted"),
            Outcome::Passthrough { reason } => info!(%name, %reason, "kept as is"),
            Outcome::Failed { error } => error!(%name, %error, "failed"),
        }
        self.items.push((name, outcome));
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn converted(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Converted { .. }))
    }

    pub fn passthrough(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Passthrough { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(Outcome::is_failed)
    }

    fn count(&self, predicate: impl Fn(&Outcome) -> bool) -> usize {
        self.items.iter().filter(|(_, o)| predicate(o)).count()
    }

    /// Names and errors of the failed items
    pub fn failures(&self) -> impl Iterator<Item = (&str, &Outcome)> {
        self.items
            .iter()
            .filter(|(_, o)| o.is_failed())
            .map(|(n, o)| (n.as_str(), o))
    }

    /// One line summary without colors
    pub fn summary(&self) -> String {
        let formats = self
            .items
            .iter()
            .filter_map(|(_, o)| match o {
                Outcome::Converted { format } => Some(format.as_str()),
                _ => None,
            })
            .counts()
            .into_iter()
            .sorted()
            .map(|(format, n)| format!("{n} {format}"))
            .join(", ");

        let mut summary = format!(
            "{} files: {} converted, {} kept, {} failed",
            self.len(),
            self.converted(),
            self.passthrough(),
            self.failed()
        );
        if !formats.is_empty() {
            summary.push_str(&format!(" ({formats})"));
        }
        summary
    }

    /// Log the summary and every failure
    pub fn finish(&self) {
        for (name, outcome) in self.failures() {
            warn!("{name}: {outcome}");
        }
        info!("{}", self.summary());
    }

    /// An error when any item failed
    pub fn check(&self) -> miette::Result<()> {
        match self.failed() {
            0 => Ok(()),
            n => Err(miette!("{n} of {} files failed", self.len())),
        }
    }
}
