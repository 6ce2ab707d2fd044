//! `ClinicalRecordsClient`: authentication, report retrieval and export over one
//! caller-owned `SessionContext`.

use std::path::{Path, PathBuf};

use secrecy::SecretString;
use tracing::{debug, info, instrument, warn};
use url::Url;

use oncohub_common::{AuthToken, OncohubError, Result, SessionContext};
use oncohub_config::{Config, FhirConfig};

use crate::auth;
use crate::cancel::CancelToken;
use crate::export;
use crate::reports::{self, DiagnosticReportRecord};
use crate::retry::RetryPolicy;
use crate::transport::{ClinicalTransport, ReqwestTransport};

const FHIR_JSON: &str = "application/fhir+json";

/// Outcome of a fetch-and-save run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub patient_id: String,
    pub rows: usize,
    pub path: PathBuf,
}

impl ExportSummary {
    pub fn message(&self) -> String {
        if self.rows == 0 {
            format!(
                "No diagnostic reports found for patient {}; wrote header only to {}",
                self.patient_id,
                self.path.display()
            )
        } else {
            format!("Data saved to {} ({} reports)", self.path.display(), self.rows)
        }
    }
}

pub struct ClinicalRecordsClient<T: ClinicalTransport = ReqwestTransport> {
    transport: T,
    fhir: FhirConfig,
    retry: RetryPolicy,
}

impl ClinicalRecordsClient<ReqwestTransport> {
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = ReqwestTransport::new(&config.fhir)?;
        Ok(Self::with_transport(
            transport,
            config.fhir.clone(),
            RetryPolicy::from_config(&config.retry),
        ))
    }
}

impl<T: ClinicalTransport> ClinicalRecordsClient<T> {
    pub fn with_transport(transport: T, fhir: FhirConfig, retry: RetryPolicy) -> Self {
        Self { transport, fhir, retry }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Password-grant login. On success the token is stored in `session`;
    /// on any failure the session ends up `Unauthenticated` with no token.
    #[instrument(skip(self, session, password))]
    pub async fn authenticate<'s>(
        &self,
        session: &'s mut SessionContext,
        username: &str,
        password: &SecretString,
    ) -> Result<&'s AuthToken> {
        session.begin_authentication();
        match auth::password_grant(&self.transport, &self.fhir, username, password).await {
            Ok(token) => {
                info!(principal = %username, "Login successful");
                session.complete_authentication(token);
                session.require_token()
            }
            Err(e) => {
                warn!(error = %e, "Authentication failed");
                session.fail_authentication();
                Err(e)
            }
        }
    }

    /// Fetch `DiagnosticReport` resources for one patient.
    ///
    /// Without an authenticated session this fails with "not authenticated"
    /// before any request is made. A 401/403 drops the session token.
    #[instrument(skip(self, session, cancel))]
    pub async fn fetch_diagnostic_reports(
        &self,
        session: &mut SessionContext,
        patient_id: &str,
        cancel: &CancelToken,
    ) -> Result<Vec<DiagnosticReportRecord>> {
        let bearer = session.require_token()?.bearer();
        let patient_id = patient_id.trim();
        if patient_id.is_empty() {
            return Err(OncohubError::InvalidInput("patient id is empty".to_string()));
        }
        let url = self.report_url(patient_id)?;
        let headers = [("Authorization", bearer), ("Accept", FHIR_JSON.to_string())];

        let result = self
            .retry
            .run("fetch_diagnostic_reports", cancel, |attempt| {
                let url = &url;
                let headers = &headers;
                async move {
                    debug!(attempt, url = %url, "Requesting diagnostic reports");
                    let resp = self.transport.get(url, headers).await?;
                    match resp.status {
                        200 => reports::parse_bundle(&resp.body),
                        401 | 403 => Err(OncohubError::Authentication(format!(
                            "token rejected by clinical system (HTTP {})",
                            resp.status
                        ))),
                        status => Err(OncohubError::Fetch { status, message: truncate(&resp.body, 200) }),
                    }
                }
            })
            .await;

        match result {
            Ok(records) => {
                info!(patient_id, n = records.len(), "Diagnostic reports retrieved");
                Ok(records)
            }
            Err(e @ OncohubError::Authentication(_)) => {
                session.invalidate_token();
                Err(e)
            }
            Err(e) => {
                warn!(patient_id, error = %e, "Failed to fetch diagnostic reports");
                Err(e)
            }
        }
    }

    pub fn persist(&self, records: &[DiagnosticReportRecord], destination: &Path) -> Result<()> {
        export::persist(records, destination)
    }

    /// Fetch, overwrite `destination`, and record `patient_id` as the session's patient.
    pub async fn fetch_and_save_patient_data(
        &self,
        session: &mut SessionContext,
        patient_id: &str,
        destination: &Path,
        cancel: &CancelToken,
    ) -> Result<ExportSummary> {
        let records = self.fetch_diagnostic_reports(session, patient_id, cancel).await?;
        self.persist(&records, destination)?;
        session.set_patient(patient_id.trim());
        Ok(ExportSummary {
            patient_id: patient_id.trim().to_string(),
            rows: records.len(),
            path: destination.to_path_buf(),
        })
    }

    /// `<base>DiagnosticReport?patient=<id>`, with the id query-encoded.
    pub fn report_url(&self, patient_id: &str) -> Result<Url> {
        let mut base = self.fhir.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let mut url = Url::parse(&base)
            .and_then(|b| b.join("DiagnosticReport"))
            .map_err(|e| OncohubError::Config(format!("invalid FHIR base_url: {}", e)))?;
        url.query_pairs_mut().append_pair("patient", patient_id);
        Ok(url)
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &s[..end])
}
