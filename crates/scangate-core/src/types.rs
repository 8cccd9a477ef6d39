//! Shared domain types for scangate.
//!
//! These model the image being scanned, the remote scan lifecycle, and the
//! severity accounting that drives the pass/fail verdict.

use crate::error::CoreError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Identity of the container image a scan applies to.
///
/// Immutable once constructed; one target is created per invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanTarget {
    repository: String,
    tag: String,
    registry_id: Option<String>,
}

impl ScanTarget {
    /// Create a new target for `repository:tag` in the default registry.
    ///
    /// # Errors
    /// Returns error if the repository name or tag is malformed.
    pub fn new(repository: impl Into<String>, tag: impl Into<String>) -> Result<Self, CoreError> {
        let repository = repository.into();
        let tag = tag.into();
        Self::validate_repository(&repository)?;
        Self::validate_tag(&tag)?;
        Ok(Self {
            repository,
            tag,
            registry_id: None,
        })
    }

    /// Scope the target to an explicit registry account.
    #[must_use]
    pub fn with_registry_id(mut self, registry_id: impl Into<String>) -> Self {
        self.registry_id = Some(registry_id.into());
        self
    }

    /// Repository name, e.g. `team/service`.
    #[must_use]
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Image tag, e.g. `v1.4.2` or `latest`.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Registry account id, when scoped to one.
    #[must_use]
    pub fn registry_id(&self) -> Option<&str> {
        self.registry_id.as_deref()
    }

    /// Validate repository name: lowercase path segments, 2-256 characters.
    fn validate_repository(repository: &str) -> Result<(), CoreError> {
        static REPO_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = REPO_REGEX.get_or_init(|| {
            Regex::new(r"^[a-z0-9]+(?:[._-][a-z0-9]+)*(?:/[a-z0-9]+(?:[._-][a-z0-9]+)*)*$")
                .expect("valid regex")
        });

        if repository.len() < 2 || repository.len() > 256 {
            return Err(CoreError::Validation(format!(
                "invalid repository name: must be 2-256 characters, got {} characters",
                repository.len()
            )));
        }

        if regex.is_match(repository) {
            Ok(())
        } else {
            Err(CoreError::Validation(format!(
                "invalid repository name: must be lowercase path segments, got '{repository}'"
            )))
        }
    }

    /// Validate image tag: word characters, dots and hyphens, up to 128 characters.
    fn validate_tag(tag: &str) -> Result<(), CoreError> {
        static TAG_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = TAG_REGEX
            .get_or_init(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9._-]{0,127}$").expect("valid regex"));

        if regex.is_match(tag) {
            Ok(())
        } else {
            Err(CoreError::Validation(format!(
                "invalid image tag: must be word characters, dots or hyphens (max 128), got '{tag}'"
            )))
        }
    }
}

impl fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.registry_id {
            Some(registry_id) => write!(f, "{registry_id}/{}:{}", self.repository, self.tag),
            None => write!(f, "{}:{}", self.repository, self.tag),
        }
    }
}

/// Lifecycle state of a remote image scan.
///
/// Re-fetched on every poll; `InProgress` is the only non-terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanStatus {
    /// Scan is queued or actively running
    InProgress,
    /// Scan finished and findings are available
    Complete,
    /// Scan terminated without producing findings
    Failed,
    /// Status label the service returned that we do not recognize
    Unknown(String),
}

impl ScanStatus {
    /// Parse a status from the service's wire label.
    ///
    /// `PENDING` counts as in-progress; unrecognized labels are preserved
    /// verbatim inside [`ScanStatus::Unknown`] so they can be reported.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label {
            "IN_PROGRESS" | "PENDING" => Self::InProgress,
            "COMPLETE" => Self::Complete,
            "FAILED" => Self::Failed,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Whether the scan has reached a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InProgress => write!(f, "IN_PROGRESS"),
            Self::Complete => write!(f, "COMPLETE"),
            Self::Failed => write!(f, "FAILED"),
            Self::Unknown(label) => write!(f, "{label}"),
        }
    }
}

/// Severity bucket for a finding.
///
/// The set is fixed and ordered from least to most severe, with `Undefined`
/// last for findings the upstream source did not classify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Informational note, not a vulnerability
    Informational,
    /// Low impact
    Low,
    /// Medium impact
    Medium,
    /// High impact
    High,
    /// Critical impact
    Critical,
    /// No severity assigned by the vulnerability source
    Undefined,
}

impl Severity {
    /// All severities in reporting order.
    pub const ALL: [Severity; 6] = [
        Severity::Informational,
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
        Severity::Undefined,
    ];

    /// Parse a severity from its upper-case wire label.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "INFORMATIONAL" => Some(Self::Informational),
            "LOW" => Some(Self::Low),
            "MEDIUM" => Some(Self::Medium),
            "HIGH" => Some(Self::High),
            "CRITICAL" => Some(Self::Critical),
            "UNDEFINED" => Some(Self::Undefined),
            _ => None,
        }
    }

    /// The wire label for this severity.
    #[must_use]
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Informational => "INFORMATIONAL",
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
            Self::Undefined => "UNDEFINED",
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Informational => 0,
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Critical => 4,
            Self::Undefined => 5,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_label())
    }
}

/// Counts of findings bucketed by severity.
///
/// Built from the service's per-page summary; counts are only authoritative
/// once the pagination loop has terminated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityHistogram {
    counts: [u64; 6],
}

impl SeverityHistogram {
    /// Create an empty histogram.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a histogram from wire `(label, count)` pairs.
    ///
    /// Labels outside the fixed severity set are skipped, matching the
    /// service contract where only known buckets are reported.
    pub fn from_label_counts<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, u64)>,
    {
        let mut histogram = Self::new();
        for (label, count) in pairs {
            match Severity::from_label(label) {
                Some(severity) => histogram.add(severity, count),
                None => {
                    tracing::debug!("skipping unrecognized severity label '{}'", label);
                }
            }
        }
        histogram
    }

    /// Count of findings at `severity`.
    #[must_use]
    pub fn count(&self, severity: Severity) -> u64 {
        self.counts[severity.index()]
    }

    /// Add `count` findings at `severity`.
    pub fn add(&mut self, severity: Severity, count: u64) {
        self.counts[severity.index()] += count;
    }

    /// Total findings across all severities.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// The sum of High and Critical findings, the sole pass/fail determinant.
    #[must_use]
    pub fn panic_count(&self) -> u64 {
        self.count(Severity::High) + self.count(Severity::Critical)
    }

    /// Iterate over `(severity, count)` pairs in reporting order.
    pub fn iter(&self) -> impl Iterator<Item = (Severity, u64)> + '_ {
        Severity::ALL
            .iter()
            .map(move |severity| (*severity, self.count(*severity)))
    }
}

/// An opaque continuation cursor for paginated findings.
///
/// Absence of a token signals the last page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageToken(String);

impl PageToken {
    /// Wrap a cursor value, treating an empty string as absence.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    /// The raw cursor value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A single reported vulnerability with its severity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Advisory identifier, e.g. a CVE id
    pub name: Option<String>,
    /// Severity bucket assigned by the vulnerability source
    pub severity: Severity,
    /// Link to the advisory, when the source provides one
    pub uri: Option<String>,
}
