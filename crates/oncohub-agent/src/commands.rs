//! Subcommand handlers.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context;
use secrecy::SecretString;
use tracing::info;

use oncohub_clinical::{CancelToken, ClinicalRecordsClient};
use oncohub_common::SessionContext;
use oncohub_config::Config;
use oncohub_evidence::{EvidenceSet, MutationEvidenceNormalizer, ResistanceState, TherapyState};

pub const PASSWORD_ENV: &str = "ONCOHUB_PASSWORD";

pub async fn login_and_fetch(
    config: &Config,
    username: &str,
    patient_id: &str,
    out: Option<PathBuf>,
) -> anyhow::Result<()> {
    let destination = out.unwrap_or_else(|| PathBuf::from(&config.export.default_path));
    let password = read_password()?;
    let client = ClinicalRecordsClient::from_config(config)?;
    let mut session = SessionContext::new();

    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, cancelling");
            on_interrupt.cancel();
        }
    });

    client.authenticate(&mut session, username, &password).await?;
    let result = client
        .fetch_and_save_patient_data(&mut session, patient_id, &destination, &cancel)
        .await;
    session.logout();

    let summary = result?;
    println!("{}", summary.message());
    Ok(())
}

fn read_password() -> anyhow::Result<SecretString> {
    match std::env::var(PASSWORD_ENV) {
        Ok(pw) if !pw.is_empty() => Ok(SecretString::from(pw)),
        _ => {
            let pw = rpassword::prompt_password("Password: ").context("Failed to read password")?;
            Ok(SecretString::from(pw))
        }
    }
}

pub fn normalize(config: &Config, analysis: &Path, json: bool) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(analysis)
        .with_context(|| format!("Failed to read {}", analysis.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", analysis.display()))?;

    let normalizer = MutationEvidenceNormalizer::new(config.evidence.clone());
    let evidence = normalizer.normalize_evidence(&value);
    if json {
        println!("{}", serde_json::to_string_pretty(&evidence)?);
    } else {
        print!("{}", render_evidence(&evidence));
    }
    Ok(())
}

/// Plain-text view of an `EvidenceSet`, in canonical order.
pub fn render_evidence(evidence: &EvidenceSet) -> String {
    let mut out = String::new();

    if let Some(stats) = evidence.statistics {
        let _ = writeln!(out, "{}", stats.summary());
    }

    let _ = writeln!(out, "Driver mutations:");
    if evidence.drivers.is_empty() {
        let _ = writeln!(out, "  none");
    }
    for d in &evidence.drivers {
        let _ = writeln!(
            out,
            "  {} {}  VAF {:.2}  {}  score {:.2}{}",
            d.gene(),
            d.mutation(),
            d.variant_allele_fraction(),
            d.impact().as_str(),
            d.pathogenicity_score(),
            if d.actionable() { "  actionable" } else { "" }
        );
    }

    let _ = writeln!(out, "Resistance markers:");
    match evidence.resistance_state() {
        ResistanceState::NoMarkers => {
            let _ = writeln!(out, "  No resistance markers identified");
        }
        ResistanceState::Markers(markers) => {
            for r in markers {
                let _ = writeln!(out, "  {} {}  score {:.2}  {}", r.gene, r.mutation, r.score, r.therapy);
            }
        }
    }

    let _ = writeln!(out, "Therapy recommendations:");
    match evidence.therapy_state() {
        TherapyState::NoRecommendations => {
            let _ = writeln!(out, "  No therapy recommendations available");
        }
        TherapyState::Recommendations(therapies) => {
            for t in therapies {
                let _ = writeln!(out, "  {} {}  efficacy {:.2}", t.name, t.mechanism, t.efficacy);
            }
        }
    }
    out
}

/// Effective configuration as TOML. The client secret is never serialised;
/// only its presence is reported.
pub fn show_config(config: &Config) -> anyhow::Result<String> {
    let mut rendered = toml::to_string_pretty(config).context("Failed to render configuration")?;
    let secret = if config.fhir.client_secret.is_some() { "<redacted>" } else { "<unset>" };
    let _ = writeln!(rendered, "\n# fhir.client_secret = {}", secret);
    Ok(rendered)
}
