//! HTTP implementation of the scan API contract.

use crate::api::{FindingsPage, ScanApi};
use crate::error::{RegistryError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use scangate_core::{Finding, PageToken, ScanStatus, ScanTarget, Severity, SeverityHistogram};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-request timeout for scan API calls.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Reqwest-based client for an ECR-compatible scan API.
///
/// Operations are JSON POSTs to `{endpoint}/v1/{Operation}` with optional
/// bearer-token authentication.
pub struct HttpScanClient {
    client: Client,
    endpoint: String,
    auth_token: Option<String>,
}

impl HttpScanClient {
    /// Create a new client for `endpoint`.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(endpoint: impl Into<String>, auth_token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| RegistryError::ClientInit(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            auth_token,
        })
    }

    /// POST a JSON operation and return the raw response on success.
    async fn post_operation<B: Serialize>(
        &self,
        operation: &str,
        body: &B,
    ) -> Result<reqwest::Response> {
        let mut request = self
            .client
            .post(format!("{}/v1/{operation}", self.endpoint))
            .header("content-type", "application/json")
            .json(body);

        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(RegistryError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    fn to_scan_request(target: &ScanTarget, token: Option<&PageToken>) -> ScanRequestBody {
        ScanRequestBody {
            repository_name: target.repository().to_string(),
            image_id: ImageId {
                image_tag: target.tag().to_string(),
            },
            registry_id: target.registry_id().map(str::to_string),
            next_token: token.map(|t| t.as_str().to_string()),
        }
    }

    fn convert_findings_response(response: DescribeFindingsResponse) -> FindingsPage {
        let status = response
            .image_scan_status
            .map(|s| ScanStatus::from_label(&s.status));

        let (severity_counts, findings, completed_at) = match response.image_scan_findings {
            Some(body) => {
                let histogram = SeverityHistogram::from_label_counts(
                    body.finding_severity_counts
                        .iter()
                        .map(|(label, count)| (label.as_str(), *count)),
                );

                let findings = body
                    .findings
                    .into_iter()
                    .map(|f| Finding {
                        name: f.name,
                        severity: Severity::from_label(&f.severity)
                            .unwrap_or(Severity::Undefined),
                        uri: f.uri,
                    })
                    .collect();

                (histogram, findings, body.image_scan_completed_at)
            }
            None => (SeverityHistogram::new(), Vec::new(), None),
        };

        FindingsPage {
            status,
            severity_counts,
            findings,
            next_token: response.next_token.and_then(PageToken::new),
            completed_at,
        }
    }
}

#[async_trait]
impl ScanApi for HttpScanClient {
    async fn start_image_scan(&self, target: &ScanTarget) -> Result<()> {
        tracing::debug!("requesting scan start for {}", target);
        let body = Self::to_scan_request(target, None);
        self.post_operation("StartImageScan", &body).await?;
        Ok(())
    }

    async fn describe_scan_findings(
        &self,
        target: &ScanTarget,
        token: Option<&PageToken>,
    ) -> Result<FindingsPage> {
        let body = Self::to_scan_request(target, token);
        let response = self.post_operation("DescribeImageScanFindings", &body).await?;

        let decoded: DescribeFindingsResponse = response
            .json()
            .await
            .map_err(|e| RegistryError::Parse(format!("DescribeImageScanFindings: {e}")))?;

        Ok(Self::convert_findings_response(decoded))
    }
}

// Wire types for the ECR-style JSON operations

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScanRequestBody {
    repository_name: String,
    image_id: ImageId,
    #[serde(skip_serializing_if = "Option::is_none")]
    registry_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageId {
    image_tag: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DescribeFindingsResponse {
    image_scan_status: Option<WireScanStatus>,
    image_scan_findings: Option<WireScanFindings>,
    next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireScanStatus {
    status: String,
    #[serde(default)]
    #[allow(dead_code)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireScanFindings {
    #[serde(default)]
    finding_severity_counts: BTreeMap<String, u64>,
    #[serde(default)]
    findings: Vec<WireFinding>,
    #[serde(default)]
    image_scan_completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireFinding {
    #[serde(default)]
    name: Option<String>,
    severity: String,
    #[serde(default)]
    uri: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client =
            HttpScanClient::new("https://scan.example.com/", None).expect("create client");
        assert_eq!(client.endpoint, "https://scan.example.com");
    }

    #[test]
    fn test_request_body_shape() {
        let target = ScanTarget::new("team/service", "v1")
            .expect("valid target")
            .with_registry_id("123456789012");
        let token = PageToken::new("cursor-1");

        let body = HttpScanClient::to_scan_request(&target, token.as_ref());
        let json = serde_json::to_value(&body).expect("serialize request");

        assert_eq!(json["repositoryName"], "team/service");
        assert_eq!(json["imageId"]["imageTag"], "v1");
        assert_eq!(json["registryId"], "123456789012");
        assert_eq!(json["nextToken"], "cursor-1");
    }

    #[test]
    fn test_request_body_omits_absent_fields() {
        let target = ScanTarget::new("web", "latest").expect("valid target");
        let body = HttpScanClient::to_scan_request(&target, None);
        let json = serde_json::to_value(&body).expect("serialize request");

        assert!(json.get("registryId").is_none());
        assert!(json.get("nextToken").is_none());
    }

    #[test]
    fn test_convert_full_response() {
        let decoded: DescribeFindingsResponse = serde_json::from_str(
            r#"{
                "imageScanStatus": {"status": "COMPLETE", "description": "done"},
                "imageScanFindings": {
                    "findingSeverityCounts": {"CRITICAL": 1, "MEDIUM": 3, "LOW": 2},
                    "findings": [
                        {"name": "CVE-2024-0001", "severity": "CRITICAL",
                         "uri": "https://nvd.example/CVE-2024-0001"},
                        {"severity": "WEIRD"}
                    ],
                    "imageScanCompletedAt": "2024-01-05T12:30:00Z"
                },
                "nextToken": "cursor-2"
            }"#,
        )
        .expect("decode response");

        let page = HttpScanClient::convert_findings_response(decoded);

        assert_eq!(page.status, Some(ScanStatus::Complete));
        assert_eq!(page.severity_counts.count(Severity::Critical), 1);
        assert_eq!(page.severity_counts.count(Severity::Medium), 3);
        assert_eq!(page.severity_counts.total(), 6);
        assert_eq!(page.findings.len(), 2);
        assert_eq!(page.findings[0].name.as_deref(), Some("CVE-2024-0001"));
        // Unmapped severity labels fall back to Undefined
        assert_eq!(page.findings[1].severity, Severity::Undefined);
        assert_eq!(page.next_token.as_ref().map(PageToken::as_str), Some("cursor-2"));
        assert!(page.completed_at.is_some());
    }

    #[test]
    fn test_convert_minimal_response() {
        let decoded: DescribeFindingsResponse =
            serde_json::from_str("{}").expect("decode empty response");

        let page = HttpScanClient::convert_findings_response(decoded);

        assert!(page.status.is_none());
        assert_eq!(page.severity_counts.total(), 0);
        assert!(page.findings.is_empty());
        assert!(page.next_token.is_none());
    }

    #[test]
    fn test_convert_empty_next_token_is_last_page() {
        let decoded: DescribeFindingsResponse = serde_json::from_str(
            r#"{
                "imageScanStatus": {"status": "COMPLETE"},
                "imageScanFindings": {"findingSeverityCounts": {}},
                "nextToken": ""
            }"#,
        )
        .expect("decode response");

        let page = HttpScanClient::convert_findings_response(decoded);
        assert!(page.next_token.is_none());
    }

    #[test]
    fn test_convert_unknown_status_preserved() {
        let decoded: DescribeFindingsResponse = serde_json::from_str(
            r#"{"imageScanStatus": {"status": "SCAN_ELIGIBILITY_EXPIRED"}}"#,
        )
        .expect("decode response");

        let page = HttpScanClient::convert_findings_response(decoded);
        assert_eq!(
            page.status,
            Some(ScanStatus::Unknown("SCAN_ELIGIBILITY_EXPIRED".to_string()))
        );
    }
}
