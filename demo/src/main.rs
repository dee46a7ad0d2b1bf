//! CADRISK command line.
//!
//! Usage:
//!   cadrisk serve --config assets/cadrisk.toml
//!   cadrisk assess --age 68 --weight 96 --height 170 --sex male \
//!                  --diabetic diabetic --sbp 150 --dbp 95 --csm smoker --out plot.png
//!   cadrisk run-reference

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cadrisk_config::ServiceConfig;
use cadrisk_contracts::{
    assessment::AssessmentId,
    error::{CadError, CadResult},
    patient::RawPatientForm,
};
use cadrisk_core::{assessor::plot_key, Assessor};
use cadrisk_store::InMemoryPlotStore;

// ── CLI definition ────────────────────────────────────────────────────────────

/// CADRISK: coronary artery disease risk assessment with per-feature
/// explanations.
#[derive(Parser)]
#[command(name = "cadrisk", about = "Coronary artery disease risk assessment service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP endpoint.
    Serve {
        /// Service configuration (TOML). Defaults apply when absent.
        #[arg(long, default_value = "assets/cadrisk.toml")]
        config: PathBuf,
        /// Override `[server] bind`.
        #[arg(long)]
        bind: Option<String>,
    },
    /// Assess one patient and print the report as JSON.
    Assess(AssessArgs),
    /// Run the canned reference patients through the built-in artifacts.
    RunReference,
}

#[derive(Args)]
struct AssessArgs {
    #[arg(long)]
    age: String,
    /// Weight in kg.
    #[arg(long)]
    weight: String,
    /// Height in cm.
    #[arg(long)]
    height: String,
    #[arg(long)]
    sex: String,
    #[arg(long)]
    diabetic: String,
    /// Systolic blood pressure.
    #[arg(long)]
    sbp: String,
    /// Diastolic blood pressure.
    #[arg(long)]
    dbp: String,
    /// Smoking status.
    #[arg(long)]
    csm: String,
    /// Use these artifacts instead of the built-in reference set.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Write the attribution plot here.
    #[arg(long)]
    out: Option<PathBuf>,
}

impl AssessArgs {
    fn form(&self) -> RawPatientForm {
        RawPatientForm {
            age: Some(self.age.clone()),
            weight: Some(self.weight.clone()),
            height: Some(self.height.clone()),
            sex: Some(self.sex.clone()),
            diabetic: Some(self.diabetic.clone()),
            sbp: Some(self.sbp.clone()),
            dbp: Some(self.dbp.clone()),
            csm: Some(self.csm.clone()),
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    // RUST_LOG overrides; otherwise the server logs requests and one-shot
    // commands stay quiet.
    let default_level = match cli.command {
        Command::Serve { .. } => "info",
        _ => "warn",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .compact()
        .init();

    let result = match cli.command {
        Command::Serve { config, bind } => run_serve(&config, bind),
        Command::Assess(args) => run_assess(&args),
        Command::RunReference => run_reference(),
    };

    if let Err(e) = result {
        eprintln!("cadrisk error: {}", e);
        std::process::exit(1);
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn run_serve(config_path: &Path, bind: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(config_path)?;
    if let Some(bind) = bind {
        config.server.bind = bind;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(cadrisk_server::serve(config))?;
    Ok(())
}

fn run_assess(args: &AssessArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store = InMemoryPlotStore::default();
    let assessor = match &args.config {
        Some(path) => {
            let config = ServiceConfig::from_file(path)?;
            cadrisk_server::build_assessor(&config, Box::new(store.clone()))?.0
        }
        None => cadrisk_ref::build_reference_assessor(Box::new(store.clone()))?,
    };

    let id = AssessmentId::new();
    let assessment = assessor.assess_with_id(id, &args.form())?;
    println!("{}", serde_json::to_string_pretty(&assessment.report)?);

    if let Some(out) = &args.out {
        let plot = store.get(&plot_key(&id)).ok_or_else(|| CadError::Storage {
            reason: "no plot was produced for this assessment".to_string(),
        })?;
        std::fs::write(out, &plot)?;
        eprintln!("plot written to {}", out.display());
    }
    Ok(())
}

fn run_reference() -> Result<(), Box<dyn std::error::Error>> {
    let assessor = cadrisk_ref::build_reference_assessor(Box::new(InMemoryPlotStore::default()))?;
    print_banner(&assessor);

    let outcomes = cadrisk_ref::run_all(&assessor)?;
    let mut mismatches = 0;
    for outcome in &outcomes {
        let ok = outcome.matches_expectation();
        if !ok {
            mismatches += 1;
        }
        println!(
            "[{}] {:<20} score {:.3}  {}",
            if ok { "ok" } else { "!!" },
            outcome.patient.name,
            outcome.assessment.prediction.score,
            outcome.assessment.report.result
        );
        println!("     {}", outcome.patient.description);
        if let Some(attribution) = &outcome.assessment.attribution {
            for c in &attribution.contributions {
                println!("       {:<18} {:+.4}", c.feature, c.contribution);
            }
        }
        for rec in &outcome.assessment.report.recommendations {
            println!("     - {}", rec);
        }
        println!();
    }

    if mismatches > 0 {
        return Err(format!("{} reference patient(s) did not match expectations", mismatches).into());
    }
    println!("All {} reference patients matched.", outcomes.len());
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Load `path`, or fall back to defaults when the file does not exist.
fn load_config(path: &Path) -> CadResult<ServiceConfig> {
    if path.exists() {
        ServiceConfig::from_file(path)
    } else {
        tracing::warn!(path = %path.display(), "config file not found, using defaults");
        Ok(ServiceConfig::default())
    }
}

fn print_banner(assessor: &Assessor) {
    println!();
    println!("CADRISK reference run");
    println!("=====================");
    println!(
        "model inputs: {}  threshold: {}",
        assessor.model().input_width(),
        assessor.model().threshold()
    );
    println!();
}
