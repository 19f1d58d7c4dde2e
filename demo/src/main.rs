//! EXAMLINK — Link Lifecycle Demo CLI
//!
//! Runs one or all of the four lifecycle scenarios against real EXAMLINK
//! components (in-memory stores, token codec, lifecycle service, exam
//! handler) wired together with a fixture catalog.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- walkthrough
//!   cargo run -p demo -- expiry
//!   cargo run -p demo -- reissue
//!   cargo run -p demo -- race

use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use examlink_contracts::{
    consent::{ConsentKind, ConsentRequest},
    error::{ExamLinkError, ExamLinkResult},
    resource::{ResourceId, ResourceView},
    submission::{ArtifactKind, ArtifactRef, Submission},
};
use examlink_core::{
    traits::{ArtifactGenerator, CatalogResolver, ManualClock},
    LinkService, ServiceConfig,
};
use examlink_exam::ExamService;
use examlink_store::{InMemoryConsentStore, InMemoryLinkStore, InMemorySubmissionStore};

// ── Service configuration ─────────────────────────────────────────────────────

const SERVICE_CONFIG: &str = include_str!("../config/service.toml");

// ── CLI definition ────────────────────────────────────────────────────────────

/// EXAMLINK — single-use exam link lifecycle demo.
///
/// Each subcommand exercises one part of the token state machine:
/// issuance, verification, strict single-use consumption, expiry, and the
/// one-active-link-per-posting rule.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "EXAMLINK lifecycle demo",
    long_about = "Walks the EXAMLINK link lifecycle: token issuance, verification,\n\
                  prefill, consent, single-use consumption, lazy expiry, and reissue\n\
                  revocation — all against in-memory stores."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all four scenarios in sequence.
    RunAll,
    /// Scenario 1: issue → verify → prefill → consent → submit → rejected replay.
    Walkthrough,
    /// Scenario 2: a 1-hour link dies 61 minutes later (lazy expiry write).
    Expiry,
    /// Scenario 3: reissuing for a posting revokes the prior live link.
    Reissue,
    /// Scenario 4: eight threads race one token; exactly one submission wins.
    Race,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Structured logging. Set RUST_LOG=debug to watch every transition.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    print_banner();

    let result = match cli.command {
        Command::RunAll => run_all(),
        Command::Walkthrough => run_walkthrough(),
        Command::Expiry => run_expiry(),
        Command::Reissue => run_reissue(),
        Command::Race => run_race(),
    };

    match result {
        Ok(()) => {
            println!("All selected scenarios completed successfully.");
        }
        Err(e) => {
            eprintln!("Demo error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_all() -> ExamLinkResult<()> {
    run_walkthrough()?;
    run_expiry()?;
    run_reissue()?;
    run_race()?;
    Ok(())
}

// ── Fixtures ──────────────────────────────────────────────────────────────────

/// A two-posting catalog standing in for the external catalog collaborator.
struct DemoCatalog;

impl CatalogResolver for DemoCatalog {
    fn resolve(&self, id: &ResourceId) -> ExamLinkResult<Option<ResourceView>> {
        let view = match id.0.as_str() {
            "posting-001" => ResourceView {
                id: id.clone(),
                announcement_code: "ANN-2026-04".to_string(),
                contest_name: "Statistics Analyst Selection".to_string(),
                posting_code: "CFEC2A09C-19482".to_string(),
                role_title: "Senior Statistics Analyst".to_string(),
                administrative_unit: "Regional Directorate North".to_string(),
                file_number: "F-0042".to_string(),
                application_date: "2026-09-01".to_string(),
                application_time: "10:00".to_string(),
                specialist_name: "Laura Mendez".to_string(),
                specialist_email: "laura.mendez@example.org".to_string(),
            },
            "posting-002" => ResourceView {
                id: id.clone(),
                announcement_code: "ANN-2026-04".to_string(),
                contest_name: "Field Operations Coordinator Selection".to_string(),
                posting_code: "CFEC2B11D-20553".to_string(),
                role_title: "Field Operations Coordinator".to_string(),
                administrative_unit: "Central Office".to_string(),
                file_number: "F-0051".to_string(),
                application_date: "2026-09-03".to_string(),
                application_time: "12:30".to_string(),
                specialist_name: "Carlos Rivas".to_string(),
                specialist_email: "carlos.rivas@example.org".to_string(),
            },
            _ => return Ok(None),
        };
        Ok(Some(view))
    }
}

/// Stand-in for the PDF/XLSX renderer: emits object keys without bytes.
struct DemoGenerator;

impl ArtifactGenerator for DemoGenerator {
    fn generate(&self, submission: &Submission) -> ExamLinkResult<Vec<ArtifactRef>> {
        Ok(vec![
            ArtifactRef {
                kind: ArtifactKind::Pdf,
                key: format!("exams/{}/exam.pdf", submission.id.0),
                url: Some(format!("https://objects.example.org/exams/{}/exam.pdf", submission.id.0)),
            },
            ArtifactRef {
                kind: ArtifactKind::Xlsx,
                key: format!("exams/{}/exam.xlsx", submission.id.0),
                url: None,
            },
        ])
    }
}

/// Wire a full exam service over fresh in-memory stores.
fn build_service(clock: ManualClock) -> ExamLinkResult<ExamService> {
    let config = ServiceConfig::from_toml_str(SERVICE_CONFIG)?;
    let link_store = InMemoryLinkStore::new();
    let submission_store = InMemorySubmissionStore::new();

    let links = LinkService::new(
        Box::new(link_store),
        Box::new(submission_store.clone()),
        Box::new(DemoCatalog),
        Box::new(clock.clone()),
        config,
    );

    Ok(ExamService::new(
        links,
        Box::new(submission_store),
        Box::new(InMemoryConsentStore::new()),
        Box::new(DemoGenerator),
        Box::new(clock),
    ))
}

fn demo_answers() -> serde_json::Value {
    json!({
        "modality": "presential",
        "duration_min": 90,
        "guide_topics": ["sampling", "census methodology"],
        "declared_case_count": 1,
        "cases": [
            {
                "name": "Census design",
                "aspects": [
                    { "name": "Methodology", "weight": 60 },
                    { "name": "Presentation", "weight": 40 }
                ]
            }
        ]
    })
}

fn reason_of(err: &ExamLinkError) -> String {
    err.rejection()
        .map(|r| r.as_str().to_string())
        .unwrap_or_else(|| err.to_string())
}

// ── Scenario 1: walkthrough ───────────────────────────────────────────────────

fn run_walkthrough() -> ExamLinkResult<()> {
    println!("Scenario 1: full walkthrough");
    println!("----------------------------");

    let clock = ManualClock::new(Utc::now());
    let service = build_service(clock)?;

    let issued = service.links().issue(&ResourceId::new("posting-001"), None)?;
    println!("  issued link {} for posting-001", issued.link_id.0);
    println!("  form URL: {}", issued.url);
    println!("  expires:  {}", issued.expires_at);

    let report = service.links().verify_report(issued.token.as_str())?;
    println!("  verify → valid: {}", report.valid);

    let prefill = service.links().prefill(issued.token.as_str())?;
    println!(
        "  prefill → {} / {} ({})",
        prefill.posting_code, prefill.role_title, prefill.specialist_name
    );

    let consent_id = service.record_consent(
        issued.token.as_str(),
        ConsentRequest {
            kind: ConsentKind::AppUse,
            declarant_name: "Laura Mendez".to_string(),
            accepted: true,
        },
    )?;
    println!("  consent recorded: {}", consent_id.0);

    let receipt = service.submit(
        issued.token.as_str(),
        &demo_answers(),
        Some("Laura Mendez".to_string()),
    )?;
    println!(
        "  submitted: {} with {} artifacts",
        receipt.submission_id.0,
        receipt.artifacts.len()
    );
    for artifact in &receipt.artifacts {
        println!("    artifact {:?} at {}", artifact.kind, artifact.key);
    }

    // Strict single-use: the replay is rejected with "used".
    match service.submit(issued.token.as_str(), &demo_answers(), None) {
        Err(e) => println!("  replay rejected → {}", reason_of(&e)),
        Ok(_) => unreachable!("second submission must never succeed"),
    }

    println!();
    Ok(())
}

// ── Scenario 2: expiry ────────────────────────────────────────────────────────

fn run_expiry() -> ExamLinkResult<()> {
    println!("Scenario 2: lazy expiry");
    println!("-----------------------");

    let clock = ManualClock::new(Utc::now());
    let service = build_service(clock.clone())?;

    let issued = service
        .links()
        .issue(&ResourceId::new("posting-002"), Some(1))?;
    println!("  issued 1-hour link {}", issued.link_id.0);

    let report = service.links().verify_report(issued.token.as_str())?;
    println!("  verify at t+0     → valid: {}", report.valid);

    clock.advance(Duration::minutes(61));
    let report = service.links().verify_report(issued.token.as_str())?;
    println!(
        "  verify at t+61min → valid: {}, reason: {}",
        report.valid,
        report.reason.map(|r| r.as_str()).unwrap_or("-")
    );

    println!();
    Ok(())
}

// ── Scenario 3: reissue revokes ───────────────────────────────────────────────

fn run_reissue() -> ExamLinkResult<()> {
    println!("Scenario 3: one active link per posting");
    println!("---------------------------------------");

    let clock = ManualClock::new(Utc::now());
    let service = build_service(clock)?;

    let first = service.links().issue(&ResourceId::new("posting-001"), None)?;
    println!("  first link:  {}", first.link_id.0);

    let second = service.links().issue(&ResourceId::new("posting-001"), None)?;
    println!("  second link: {}", second.link_id.0);

    let old = service.links().verify_report(first.token.as_str())?;
    println!(
        "  first token now → valid: {}, reason: {}",
        old.valid,
        old.reason.map(|r| r.as_str()).unwrap_or("-")
    );
    let fresh = service.links().verify_report(second.token.as_str())?;
    println!("  second token    → valid: {}", fresh.valid);

    println!();
    Ok(())
}

// ── Scenario 4: consumption race ──────────────────────────────────────────────

fn run_race() -> ExamLinkResult<()> {
    println!("Scenario 4: concurrent consumption");
    println!("----------------------------------");

    let clock = ManualClock::new(Utc::now());
    let service = Arc::new(build_service(clock)?);

    let issued = service.links().issue(&ResourceId::new("posting-001"), None)?;
    println!("  issued link {}", issued.link_id.0);

    let outcomes: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

    std::thread::scope(|scope| {
        for worker in 0..8 {
            let service = service.clone();
            let token = issued.token.clone();
            let outcomes = outcomes.clone();
            scope.spawn(move || {
                let outcome = match service.submit(token.as_str(), &demo_answers(), None) {
                    Ok(receipt) => format!("worker {} WON ({})", worker, receipt.submission_id.0),
                    Err(e) => format!("worker {} lost ({})", worker, reason_of(&e)),
                };
                outcomes.lock().unwrap().push(outcome);
            });
        }
    });

    let outcomes = outcomes.lock().unwrap();
    for line in outcomes.iter() {
        println!("  {}", line);
    }
    let winners = outcomes.iter().filter(|o| o.contains("WON")).count();
    println!("  winners: {} of {}", winners, outcomes.len());

    println!();
    Ok(())
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("EXAMLINK — Single-use Exam Link Service");
    println!("Lifecycle Demo");
    println!("=======================================");
    println!();
    println!("Link state machine:");
    println!("  ISSUED → USED      one successful submission, atomic CAS");
    println!("  ISSUED → EXPIRED   clock passes expires_at (lazy write)");
    println!("  ISSUED → REVOKED   a newer link supersedes it");
    println!();
}
