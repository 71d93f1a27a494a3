//! Batch progress reporting
//!
//! The driver reports what it is doing through a [`BatchObserver`] instead of
//! logging directly, so a caller can capture events. [`LogObserver`] turns
//! them into log lines.

use std::fmt;
use std::time::Duration;

/// Stage of one source's processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Extract,
    Transform,
    Load,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fetch => "fetch",
            Self::Extract => "extract",
            Self::Transform => "transform",
            Self::Load => "load",
        };
        f.write_str(name)
    }
}

/// How one source ended
#[derive(Debug, Clone, PartialEq)]
pub enum SourceOutcome {
    /// Artifact written
    Succeeded { rows: usize },
    /// Table had no rows, nothing written
    SkippedEmpty,
    /// Fetch failed
    SkippedDownload,
    /// File suffix doesn't map to a container kind
    Unsupported,
    /// Extract, transform or load failed
    Failed { reason: String },
}

impl SourceOutcome {
    /// True for outcomes that don't fail the batch
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::SkippedEmpty)
    }
}

impl fmt::Display for SourceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded { rows } => write!(f, "succeeded ({rows} rows)"),
            Self::SkippedEmpty => write!(f, "skipped (empty)"),
            Self::SkippedDownload => write!(f, "skipped (download failed)"),
            Self::Unsupported => write!(f, "unsupported file type"),
            Self::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

/// Per-source outcomes of one run, in manifest order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub outcomes: Vec<(String, SourceOutcome)>,
    pub elapsed: Duration,
}

impl BatchSummary {
    pub fn push(&mut self, source: impl Into<String>, outcome: SourceOutcome) {
        self.outcomes.push((source.into(), outcome));
    }

    pub fn outcome(&self, source: &str) -> Option<&SourceOutcome> {
        self.outcomes
            .iter()
            .find(|(name, _)| name == source)
            .map(|(_, outcome)| outcome)
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| matches!(outcome, SourceOutcome::Succeeded { .. }))
            .count()
    }

    /// Sources that ended in anything other than success or an empty skip
    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| !outcome.is_success())
            .count()
    }

    pub fn total_rows(&self) -> usize {
        self.outcomes
            .iter()
            .map(|(_, outcome)| match outcome {
                SourceOutcome::Succeeded { rows } => *rows,
                _ => 0,
            })
            .sum()
    }

    /// True when every source succeeded or was skipped as empty
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|(_, outcome)| outcome.is_success())
    }
}

/// Receiver of batch progress events
pub trait BatchObserver: Send + Sync {
    fn batch_started(&self, sources: usize);

    fn stage_started(&self, source: &str, stage: Stage);

    fn source_finished(&self, source: &str, outcome: &SourceOutcome);

    fn batch_finished(&self, summary: &BatchSummary);
}

/// Observer that writes every event to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl BatchObserver for LogObserver {
    fn batch_started(&self, sources: usize) {
        log::info!(
            "Starting batch of {} source(s) at {}",
            sources,
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
    }

    fn stage_started(&self, source: &str, stage: Stage) {
        log::info!("[{}] {}", source, stage);
    }

    fn source_finished(&self, source: &str, outcome: &SourceOutcome) {
        match outcome {
            SourceOutcome::Succeeded { .. } => log::info!("[{}] {}", source, outcome),
            SourceOutcome::SkippedEmpty | SourceOutcome::Unsupported => {
                log::warn!("[{}] {}", source, outcome)
            }
            SourceOutcome::SkippedDownload | SourceOutcome::Failed { .. } => {
                log::error!("[{}] {}", source, outcome)
            }
        }
    }

    fn batch_finished(&self, summary: &BatchSummary) {
        log::info!(
            "Batch finished at {} in {:.2?}: {} of {} source(s) succeeded, {} row(s) written",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            summary.elapsed,
            summary.succeeded(),
            summary.outcomes.len(),
            summary.total_rows()
        );
        if !summary.all_succeeded() {
            log::warn!("{} source(s) did not complete", summary.failed());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(outcomes: Vec<SourceOutcome>) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for (i, outcome) in outcomes.into_iter().enumerate() {
            summary.push(format!("source{i}"), outcome);
        }
        summary
    }

    #[test]
    fn test_all_succeeded() {
        assert!(summary(vec![]).all_succeeded());
        assert!(
            summary(vec![
                SourceOutcome::Succeeded { rows: 3 },
                SourceOutcome::SkippedEmpty
            ])
            .all_succeeded()
        );

        for bad in [
            SourceOutcome::SkippedDownload,
            SourceOutcome::Unsupported,
            SourceOutcome::Failed {
                reason: "boom".to_string(),
            },
        ] {
            let summary = summary(vec![SourceOutcome::Succeeded { rows: 1 }, bad]);
            assert!(!summary.all_succeeded());
            assert_eq!(summary.failed(), 1);
        }
    }

    #[test]
    fn test_counts() {
        let summary = summary(vec![
            SourceOutcome::Succeeded { rows: 3 },
            SourceOutcome::Succeeded { rows: 4 },
            SourceOutcome::SkippedEmpty,
        ]);
        assert_eq!(summary.succeeded(), 2);
        assert_eq!(summary.total_rows(), 7);
        assert_eq!(summary.outcome("source2"), Some(&SourceOutcome::SkippedEmpty));
        assert_eq!(summary.outcome("source9"), None);
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(
            SourceOutcome::Succeeded { rows: 2 }.to_string(),
            "succeeded (2 rows)"
        );
        assert_eq!(
            SourceOutcome::Failed {
                reason: "bad gzip".to_string()
            }
            .to_string(),
            "failed: bad gzip"
        );
        assert_eq!(Stage::Transform.to_string(), "transform");
    }
}
