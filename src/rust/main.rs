use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use aspire::form::{respond, FormReader};
use aspire::profile::parse_answer;
use aspire::{ArtifactStore, Gender, Predictor, Profile, RuntimeConfig, Subject};
use clap::Parser;
use log::info;

#[derive(Parser)]
#[command(author, version, about = "Rank likely career aspirations for a student profile", long_about = None)]
struct Args {
    /// Directory holding the scaler and classifier (defaults to $ASPIRE_ARTIFACTS_DIR or ".")
    #[arg(long)]
    artifacts_dir: Option<PathBuf>,

    /// Scaler artifact (native or .onnx); overrides the artifacts directory
    #[arg(long)]
    scaler: Option<PathBuf>,

    /// Classifier artifact (native or .onnx); overrides the artifacts directory
    #[arg(long)]
    model: Option<PathBuf>,

    /// Expected SHA-256 of the scaler file
    #[arg(long)]
    scaler_sha256: Option<String>,

    /// Expected SHA-256 of the classifier file
    #[arg(long)]
    model_sha256: Option<String>,

    /// Number of careers to show (1-5)
    #[arg(short = 'k', long, default_value_t = 5)]
    top_k: usize,

    /// ONNX Runtime intra-op threads (0 lets the runtime decide)
    #[arg(long, default_value_t = 1)]
    threads: usize,

    /// Print predictions as JSON (one-shot mode only)
    #[arg(long)]
    json: bool,

    #[arg(long)]
    gender: Option<Gender>,

    #[arg(long, value_parser = parse_answer)]
    part_time_job: Option<bool>,

    #[arg(long)]
    absence_days: Option<u16>,

    #[arg(long, value_parser = parse_answer)]
    extracurricular: Option<bool>,

    #[arg(long)]
    study_hours: Option<u8>,

    #[arg(long)]
    math: Option<u8>,
    #[arg(long)]
    history: Option<u8>,
    #[arg(long)]
    physics: Option<u8>,
    #[arg(long)]
    chemistry: Option<u8>,
    #[arg(long)]
    biology: Option<u8>,
    #[arg(long)]
    english: Option<u8>,
    #[arg(long)]
    geography: Option<u8>,
}

impl Args {
    /// Builds a profile from the flags when any profile field was given.
    /// Unset fields take the form defaults.
    fn profile(&self) -> Option<Profile> {
        let scores = [
            (Subject::Math, self.math),
            (Subject::History, self.history),
            (Subject::Physics, self.physics),
            (Subject::Chemistry, self.chemistry),
            (Subject::Biology, self.biology),
            (Subject::English, self.english),
            (Subject::Geography, self.geography),
        ];
        let any_given = self.gender.is_some()
            || self.part_time_job.is_some()
            || self.absence_days.is_some()
            || self.extracurricular.is_some()
            || self.study_hours.is_some()
            || scores.iter().any(|(_, s)| s.is_some());
        if !any_given {
            return None;
        }

        let defaults = Profile::default();
        let mut profile = Profile {
            gender: self.gender.unwrap_or(defaults.gender),
            part_time_job: self.part_time_job.unwrap_or(defaults.part_time_job),
            absence_days: self.absence_days.unwrap_or(defaults.absence_days),
            extracurricular_activities: self
                .extracurricular
                .unwrap_or(defaults.extracurricular_activities),
            weekly_self_study_hours: self.study_hours.unwrap_or(defaults.weekly_self_study_hours),
            scores: defaults.scores,
        };
        for (subject, score) in scores {
            if let Some(score) = score {
                profile.set_score(subject, score);
            }
        }
        Some(profile)
    }
}

fn load_predictor(args: &Args) -> anyhow::Result<Predictor> {
    let store = match &args.artifacts_dir {
        Some(dir) => ArtifactStore::new(dir),
        None => ArtifactStore::new_default(),
    };
    info!("Artifacts directory: {:?}", store.artifacts_dir());
    let scaler_path = args.scaler.clone().unwrap_or_else(|| store.scaler_path());
    let model_path = args.model.clone().unwrap_or_else(|| store.model_path());

    let mut builder = Predictor::builder()
        .with_runtime_config(RuntimeConfig {
            intra_threads: args.threads,
            ..RuntimeConfig::default()
        })
        .with_scaler_path(&scaler_path)
        .with_model_path(&model_path)
        .with_top_k(args.top_k);
    if let Some(digest) = &args.scaler_sha256 {
        builder = builder.with_expected_scaler_sha256(digest.clone());
    }
    if let Some(digest) = &args.model_sha256 {
        builder = builder.with_expected_model_sha256(digest.clone());
    }

    builder.build().with_context(|| {
        format!(
            "Failed to load model {} or scaler {}",
            model_path.display(),
            scaler_path.display()
        )
    })
}

fn main() -> anyhow::Result<ExitCode> {
    aspire::init_logger();
    let args = Args::parse();

    info!("=== Starting Career Aspiration Predictor ===");
    let predictor = load_predictor(&args)?;
    let predictor_info = predictor.info();
    info!(
        "Loaded classifier {} and scaler {}",
        predictor_info.model_source, predictor_info.scaler_source
    );

    // Warnings go to stderr; stdout carries only results
    if predictor_info.placeholder {
        eprintln!(
            "WARNING: the classifier is a placeholder trained on random data; rankings are meaningless."
        );
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if let Some(profile) = args.profile() {
        if args.json {
            return match predictor.predict_profile(&profile) {
                Ok(predictions) => {
                    writeln!(out, "{}", serde_json::to_string_pretty(&predictions)?)?;
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    eprintln!("{}", e);
                    Ok(ExitCode::FAILURE)
                }
            };
        }
        let ok = respond(&predictor, &profile, &mut out)?;
        return Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE });
    }

    writeln!(out, "Career Aspiration Predictor")?;
    writeln!(
        out,
        "Enter your academic and personal details to see top career matches. Press Enter to keep a default."
    )?;
    drop(out);

    let stdin = io::stdin();
    let mut form = FormReader::new(stdin.lock(), io::stdout());
    let mut defaults = Profile::default();
    loop {
        let Some(profile) = form.read_profile(&defaults)? else {
            break;
        };
        respond(&predictor, &profile, &mut io::stdout())?;
        defaults = profile;
        if !form.confirm_another()? {
            break;
        }
    }

    info!("=== Session Complete ===");
    Ok(ExitCode::SUCCESS)
}
