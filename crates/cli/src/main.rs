use std::path::PathBuf;

use anyhow::Context;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use clap::{Parser, Subcommand};

use kc_client::CompanionClient;
use kc_core::extraction::parse_extracted_labs;
use kc_core::narration::build_narration_script;
use kc_core::prompt::{build_analysis_prompt, build_extraction_prompt, DEFAULT_QUESTION};
use kc_core::ranges::TRANSPLANT_RANGES;
use kc_core::{AnalyzeRequest, HistoricalPoint, LabEntry, PatientContext, StatusSummary};

#[derive(Parser)]
#[command(name = "kc")]
#[command(about = "KidneyCompanion lab-results explainer CLI")]
struct Cli {
    /// Server base URL
    #[arg(long, global = true, default_value = "http://localhost:3000")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse a panel of lab values
    Analyze {
        /// Lab value as NAME=VALUE, repeatable (e.g. "Creatinine=1.4 mg/dL")
        #[arg(long = "lab")]
        labs: Vec<String>,
        /// The question to ask about the results
        #[arg(long, default_value = DEFAULT_QUESTION)]
        question: String,
        /// Patient age in years
        #[arg(long)]
        age: Option<u32>,
        /// Patient sex
        #[arg(long)]
        sex: Option<String>,
        /// Months since the transplant
        #[arg(long)]
        months_post_transplant: Option<u32>,
        /// Donor type (living or deceased)
        #[arg(long)]
        donor_type: Option<String>,
        /// Current medications, free text
        #[arg(long)]
        medications: Option<String>,
        /// Past panel as DATE:NAME=VALUE,NAME=VALUE, repeatable
        #[arg(long = "history")]
        history: Vec<String>,
        /// Lab report photo (JPEG) to send alongside the values
        #[arg(long)]
        image: Option<PathBuf>,
        /// Write narration audio of the explanation to this file
        #[arg(long)]
        narrate: Option<PathBuf>,
        /// Save the analysis as JSON to this file
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Extract lab values from a photo of a lab report
    Extract {
        /// Lab report photo (JPEG)
        #[arg(long)]
        image: PathBuf,
    },
    /// Print the transplant reference ranges
    Ranges,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = CompanionClient::new(cli.server);

    match cli.command {
        Commands::Analyze {
            labs,
            question,
            age,
            sex,
            months_post_transplant,
            donor_type,
            medications,
            history,
            image,
            narrate,
            save,
        } => {
            let labs = parse_lab_args(&labs)?;
            if labs.is_empty() && image.is_none() {
                anyhow::bail!("provide at least one --lab or an --image");
            }
            let history = parse_history_args(&history)?;
            let ctx = PatientContext {
                age,
                sex,
                months_post_transplant,
                donor_type,
                medications,
            };

            let prompt = build_analysis_prompt(&labs, &question, &ctx, &history);
            let request = match &image {
                Some(path) => AnalyzeRequest::with_image(prompt, read_image_base64(path)?),
                None => AnalyzeRequest::text(prompt),
            };

            let analysis = client
                .analyze(&request, |status| eprintln!("{}", status.message))
                .await?;
            println!("{analysis}");

            if let Some(path) = &save {
                let report = build_report(&labs, &ctx, &history, &question, &analysis);
                std::fs::write(path, serde_json::to_string_pretty(&report)?)
                    .with_context(|| format!("writing {}", path.display()))?;
                eprintln!("Saved analysis to {}", path.display());
            }

            if let Some(path) = &narrate {
                let summary = StatusSummary::from_labs(&labs);
                let script = build_narration_script(&analysis, summary);
                let audio = client.tts(&script).await?;
                std::fs::write(path, audio)
                    .with_context(|| format!("writing {}", path.display()))?;
                eprintln!("Saved narration to {}", path.display());
            }
        }
        Commands::Extract { image } => {
            let request =
                AnalyzeRequest::with_image(build_extraction_prompt(), read_image_base64(&image)?);
            let reply = client
                .analyze(&request, |status| eprintln!("{}", status.message))
                .await?;
            match parse_extracted_labs(&reply) {
                Ok(labs) => {
                    for lab in labs {
                        println!("{}={}", lab.name, lab.value);
                    }
                }
                Err(e) => eprintln!("{e}"),
            }
        }
        Commands::Ranges => {
            for range in TRANSPLANT_RANGES {
                println!(
                    "{} ({}): healthy {}, transplant target {}",
                    range.name, range.unit, range.healthy, range.transplant
                );
                println!("    {}", range.context);
            }
        }
    }

    Ok(())
}

/// The JSON document written by `--save`: everything that went into the
/// analysis plus its result.
fn build_report(
    labs: &[LabEntry],
    ctx: &PatientContext,
    history: &[HistoricalPoint],
    question: &str,
    analysis: &str,
) -> serde_json::Value {
    serde_json::json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "model": "MedGemma 4B-IT",
        "question": question,
        "labs": labs,
        "patientContext": ctx,
        "history": history,
        "analysis": analysis,
    })
}

/// Parse repeated `NAME=VALUE` lab arguments.
fn parse_lab_args(args: &[String]) -> anyhow::Result<Vec<LabEntry>> {
    args.iter()
        .map(|arg| {
            let (name, value) = arg
                .split_once('=')
                .with_context(|| format!("expected NAME=VALUE, got '{arg}'"))?;
            if name.trim().is_empty() || value.trim().is_empty() {
                anyhow::bail!("expected NAME=VALUE, got '{arg}'");
            }
            Ok(LabEntry {
                name: name.trim().to_string(),
                value: value.trim().to_string(),
            })
        })
        .collect()
}

/// Parse repeated `DATE:NAME=VALUE,NAME=VALUE` history arguments.
fn parse_history_args(args: &[String]) -> anyhow::Result<Vec<HistoricalPoint>> {
    args.iter()
        .map(|arg| {
            let (date, rest) = arg
                .split_once(':')
                .with_context(|| format!("expected DATE:NAME=VALUE,..., got '{arg}'"))?;
            let labs: Vec<String> = rest.split(',').map(str::to_string).collect();
            Ok(HistoricalPoint {
                date: date.trim().to_string(),
                labs: parse_lab_args(&labs)?,
            })
        })
        .collect()
}

fn read_image_base64(path: &PathBuf) -> anyhow::Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("reading image {}", path.display()))?;
    Ok(BASE64.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lab_args() {
        let labs = parse_lab_args(&[
            "Creatinine=1.4 mg/dL".to_string(),
            "eGFR=58".to_string(),
        ])
        .unwrap();
        assert_eq!(labs.len(), 2);
        assert_eq!(labs[0].name, "Creatinine");
        assert_eq!(labs[0].value, "1.4 mg/dL");
    }

    #[test]
    fn test_parse_lab_args_rejects_missing_value() {
        assert!(parse_lab_args(&["Creatinine".to_string()]).is_err());
        assert!(parse_lab_args(&["Creatinine=".to_string()]).is_err());
    }

    #[test]
    fn test_parse_history_args() {
        let history =
            parse_history_args(&["2025-06-01:Creatinine=1.2,eGFR=60".to_string()]).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].date, "2025-06-01");
        assert_eq!(history[0].labs.len(), 2);
        assert_eq!(history[0].labs[1].name, "eGFR");
    }

    #[test]
    fn test_parse_history_args_rejects_missing_date() {
        assert!(parse_history_args(&["Creatinine=1.2".to_string()]).is_err());
    }

    #[test]
    fn test_saved_report_includes_patient_context() {
        let labs = vec![LabEntry {
            name: "Creatinine".into(),
            value: "1.4 mg/dL".into(),
        }];
        let ctx = PatientContext {
            age: Some(52),
            medications: Some("tacrolimus".into()),
            ..PatientContext::default()
        };
        let report = build_report(&labs, &ctx, &[], "Is this okay?", "Looks steady.");

        assert_eq!(report["patientContext"]["age"], 52);
        assert_eq!(report["patientContext"]["medications"], "tacrolimus");
        assert_eq!(report["labs"][0]["name"], "Creatinine");
        assert_eq!(report["question"], "Is this okay?");
        assert_eq!(report["analysis"], "Looks steady.");
        assert_eq!(report["model"], "MedGemma 4B-IT");
        assert!(report["timestamp"].is_string());
    }
}
