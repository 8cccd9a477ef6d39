//! The scan result collector.
//!
//! This module provides [`ScanResultCollector`], which triggers scans, polls
//! their status, paginates findings, and evaluates the severity histogram
//! against the fixed High/Critical threshold.

use crate::error::{Result, ScanError};
use scangate_core::{ScanStatus, ScanTarget, SeverityHistogram};
use scangate_registry::{FindingsPage, ScanApi};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Default sleep between status polls.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Collects image scan results and gates on them.
///
/// Operations run strictly sequentially; the only suspension point is the
/// fixed-interval sleep inside the status poll loop.
pub struct ScanResultCollector {
    /// Remote scan service
    api: Arc<dyn ScanApi>,
    /// Sleep between status polls
    poll_interval: Duration,
    /// Optional cap on total polling time; `None` polls indefinitely
    deadline: Option<Duration>,
}

impl ScanResultCollector {
    /// Create a collector over the given scan service.
    #[must_use]
    pub fn new(api: Arc<dyn ScanApi>) -> Self {
        Self {
            api,
            poll_interval: DEFAULT_POLL_INTERVAL,
            deadline: None,
        }
    }

    /// Set the sleep between status polls.
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Cap the total time spent polling for completion.
    ///
    /// Without a deadline the poll loop runs until the scan leaves the
    /// in-progress state, which can be forever on a stuck scan.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Ask the remote service to begin scanning `target`.
    ///
    /// Idempotent from the caller's perspective; the image may already have
    /// been scanned.
    pub async fn trigger_scan(&self, target: &ScanTarget) -> Result<()> {
        self.api.start_image_scan(target).await?;
        tracing::info!("scan requested for {}", target);
        Ok(())
    }

    /// Poll scan status until it leaves the in-progress state.
    ///
    /// `Failed` and unrecognized statuses are fatal immediately, with no
    /// further polling. `InProgress` sleeps the poll interval and retries,
    /// bounded only by the optional deadline.
    pub async fn await_completion(&self, target: &ScanTarget) -> Result<()> {
        let started = Instant::now();

        loop {
            if let Some(deadline) = self.deadline {
                let waited = started.elapsed();
                if waited >= deadline {
                    return Err(ScanError::DeadlineExceeded { waited });
                }
            }

            let page = self.api.describe_scan_findings(target, None).await?;
            let status = page
                .status
                .unwrap_or_else(|| ScanStatus::Unknown("<missing>".to_string()));

            match status {
                ScanStatus::Complete => {
                    tracing::info!("scan complete for {}", target);
                    return Ok(());
                }
                ScanStatus::Failed => {
                    return Err(ScanError::ScanFailed {
                        target: target.to_string(),
                    });
                }
                ScanStatus::Unknown(label) => {
                    return Err(ScanError::UnexpectedStatus { status: label });
                }
                ScanStatus::InProgress => {
                    tracing::debug!(
                        "scan in progress for {}, polling again in {:?}",
                        target,
                        self.poll_interval
                    );
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }

    /// Paginate through the findings result set and return the severity
    /// histogram.
    ///
    /// The service attaches the full severity summary to every page; the
    /// last page's summary is the authoritative total, so intermediate
    /// summaries are discarded rather than summed.
    pub async fn collect_findings(&self, target: &ScanTarget) -> Result<SeverityHistogram> {
        let mut page = self.api.describe_scan_findings(target, None).await?;
        let mut page_count: u32 = 1;

        while let Some(token) = page.next_token.take() {
            page = self.api.describe_scan_findings(target, Some(&token)).await?;
            page_count += 1;
        }

        let histogram = Self::report(target, &page, page_count);
        Ok(histogram)
    }

    /// Log the per-severity report and extract the final histogram.
    fn report(target: &ScanTarget, last_page: &FindingsPage, page_count: u32) -> SeverityHistogram {
        tracing::debug!(
            "collected {} findings page(s) for {} ({} listed findings on last page)",
            page_count,
            target,
            last_page.findings.len()
        );

        let histogram = last_page.severity_counts.clone();
        for (severity, count) in histogram.iter() {
            tracing::info!("{}: {}", severity, count);
        }
        tracing::info!("{} reason(s) to panic", histogram.panic_count());

        histogram
    }

    /// Whether a histogram is acceptable: no High and no Critical findings.
    ///
    /// All other severities never affect the verdict. The threshold is
    /// fixed, not configurable.
    #[must_use]
    pub fn evaluate(histogram: &SeverityHistogram) -> bool {
        histogram.panic_count() == 0
    }

    /// Collect findings for an already-completed scan and evaluate them.
    ///
    /// Does not trigger a new scan.
    pub async fn run_report(&self, target: &ScanTarget) -> Result<bool> {
        let histogram = self.collect_findings(target).await?;
        Ok(Self::evaluate(&histogram))
    }

    /// Trigger a fresh scan, wait for it to finish, then collect and
    /// evaluate its findings.
    pub async fn run_rescan(&self, target: &ScanTarget) -> Result<bool> {
        self.trigger_scan(target).await?;
        self.await_completion(target).await?;
        self.run_report(target).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scangate_core::Severity;

    fn histogram(pairs: &[(Severity, u64)]) -> SeverityHistogram {
        let mut h = SeverityHistogram::new();
        for (severity, count) in pairs {
            h.add(*severity, *count);
        }
        h
    }

    #[test]
    fn test_evaluate_clean_histogram() {
        assert!(ScanResultCollector::evaluate(&SeverityHistogram::new()));
    }

    #[test]
    fn test_evaluate_ignores_lower_severities() {
        let h = histogram(&[
            (Severity::Informational, 10),
            (Severity::Low, 1),
            (Severity::Medium, 3),
            (Severity::Undefined, 2),
        ]);
        assert!(ScanResultCollector::evaluate(&h));
    }

    #[test]
    fn test_evaluate_rejects_high() {
        let h = histogram(&[(Severity::Medium, 3), (Severity::High, 1)]);
        assert!(!ScanResultCollector::evaluate(&h));
    }

    #[test]
    fn test_evaluate_rejects_critical() {
        let h = histogram(&[(Severity::Critical, 1)]);
        assert!(!ScanResultCollector::evaluate(&h));
    }
}
