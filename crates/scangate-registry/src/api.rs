//! Abstract contract of the remote image-scanning service.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scangate_core::{Finding, PageToken, ScanStatus, ScanTarget, SeverityHistogram};

/// One page of a `DescribeImageScanFindings` response.
#[derive(Debug, Clone, Default)]
pub struct FindingsPage {
    /// Scan status; the service guarantees it only on the initial
    /// (token-free) request
    pub status: Option<ScanStatus>,
    /// Severity summary attached to this page. The service reports the
    /// full summary on each page; only the last page's value is the
    /// authoritative total
    pub severity_counts: SeverityHistogram,
    /// Individual findings listed on this page
    pub findings: Vec<Finding>,
    /// Continuation cursor; absent on the last page
    pub next_token: Option<PageToken>,
    /// When the scan finished, if the service reports it
    pub completed_at: Option<DateTime<Utc>>,
}

/// Operations the image-scanning service exposes.
///
/// Implementations must be thread-safe (`Send + Sync`); the collector holds
/// one behind an `Arc`.
#[async_trait]
pub trait ScanApi: Send + Sync {
    /// Ask the service to begin scanning the identified image.
    ///
    /// Idempotent from the caller's perspective; the service may coalesce
    /// the request with an already-running scan.
    ///
    /// # Errors
    /// Returns error if the repository or tag is unknown to the service, or
    /// the request fails.
    async fn start_image_scan(&self, target: &ScanTarget) -> Result<()>;

    /// Fetch scan status and one page of findings.
    ///
    /// Pass `None` for the first page; subsequent pages use the token from
    /// the previous response.
    ///
    /// # Errors
    /// Returns error if the request fails or the response cannot be decoded.
    async fn describe_scan_findings(
        &self,
        target: &ScanTarget,
        token: Option<&PageToken>,
    ) -> Result<FindingsPage>;
}
