use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use causa_core::serde::{to_canonical_value, to_json_string};
use causa_pipe::{run as run_pipeline, PipelineOpts};
use clap::Args;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::frame::CsvFrame;

const CLEANING_MESSAGE: &str =
    "Cleaning required before causal analysis. Rerun with --auto-clean or clean the file upstream.";

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Header-first CSV file with numeric columns.
    #[arg(long)]
    pub csv: PathBuf,
    /// Treatment column.
    #[arg(long)]
    pub treatment: String,
    /// Outcome column.
    #[arg(long)]
    pub outcome: String,
    /// Significance level for the independence tests.
    #[arg(long)]
    pub alpha: Option<f64>,
    /// Preferred estimator (linear_regression, psw, psm, auto).
    #[arg(long)]
    pub estimator: Option<String>,
    /// Seed for the refuter.
    #[arg(long)]
    pub seed: Option<u64>,
    /// YAML or JSON file with pipeline options; flags take precedence.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Drop rows with missing cells and duplicate rows instead of refusing to run.
    #[arg(long)]
    pub auto_clean: bool,
    /// Pretty-print the JSON output.
    #[arg(long)]
    pub pretty: bool,
}

/// JSON document printed by `analyze` and whether it reports a successful run.
pub struct AnalyzeOutput {
    pub document: Value,
    pub success: bool,
}

fn load_opts(path: &Path) -> Result<PipelineOpts, Box<dyn Error>> {
    let bytes = fs::read(path)?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let opts = if is_json {
        PipelineOpts::from_json(&bytes)?
    } else {
        PipelineOpts::from_yaml(&bytes)?
    };
    Ok(opts)
}

/// Config file values with command line flags applied on top.
pub fn resolve_opts(args: &AnalyzeArgs) -> Result<PipelineOpts, Box<dyn Error>> {
    let mut opts = match &args.config {
        Some(path) => load_opts(path)?,
        None => PipelineOpts::default(),
    };
    if let Some(alpha) = args.alpha {
        opts.alpha = alpha;
    }
    if let Some(estimator) = &args.estimator {
        opts.estimator = Some(estimator.clone());
    }
    if let Some(seed) = args.seed {
        opts.seed = Some(seed);
    }
    Ok(opts)
}

pub fn analyze(args: &AnalyzeArgs) -> Result<AnalyzeOutput, Box<dyn Error>> {
    let opts = resolve_opts(args)?;
    let frame = CsvFrame::read(&args.csv)?;

    let (frame, cleaning) = if args.auto_clean {
        let (cleaned, report) = frame.clean();
        info!(summary = %report.cleaning_summary, "cleaned input");
        (cleaned, Some(report))
    } else {
        (frame, None)
    };

    let null_rows_count = frame.null_rows();
    let duplicate_rows_count = frame.duplicate_rows();
    if frame.needs_cleaning() {
        warn!(null_rows_count, duplicate_rows_count, "input needs cleaning");
        return Ok(AnalyzeOutput {
            document: json!({
                "cleaning_needed": true,
                "null_rows_count": null_rows_count,
                "duplicate_rows_count": duplicate_rows_count,
                "message": CLEANING_MESSAGE,
                "columns": frame.headers,
            }),
            success: false,
        });
    }

    let table = frame.to_table()?;
    let bundle = run_pipeline(&table, &args.treatment, &args.outcome, &opts)?;
    let mut document = to_canonical_value(&bundle)?;
    if let Value::Object(map) = &mut document {
        map.insert("cleaning_needed".into(), Value::Bool(false));
        map.insert("null_rows_count".into(), json!(null_rows_count));
        map.insert("duplicate_rows_count".into(), json!(duplicate_rows_count));
        if let Some(report) = cleaning {
            map.insert("cleaning".into(), to_canonical_value(&report)?);
        }
    }
    Ok(AnalyzeOutput {
        document,
        success: true,
    })
}

pub fn run(args: &AnalyzeArgs) -> Result<ExitCode, Box<dyn Error>> {
    let output = analyze(args)?;
    let rendered = to_json_string(&output.document, args.pretty)?;
    println!("{rendered}");
    Ok(if output.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    fn args(csv: PathBuf) -> AnalyzeArgs {
        AnalyzeArgs {
            csv,
            treatment: "T".into(),
            outcome: "Y".into(),
            alpha: None,
            estimator: None,
            seed: Some(3),
            config: None,
            auto_clean: false,
            pretty: false,
        }
    }

    fn clean_csv() -> String {
        let mut text = String::from("T,M,Y\n");
        for i in 0..60 {
            let t = (i % 2) as f64;
            let m = ((i * 37) % 11) as f64;
            let y = 2.0 * t + ((i * 13) % 7) as f64 * 0.1 + i as f64 * 0.001;
            text.push_str(&format!("{t},{m},{y}\n"));
        }
        text
    }

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn dirty_file_reports_cleaning_needed() {
        let mut text = clean_csv();
        text.push_str("1,,3\n0,1,0.5\n0,1,0.5\n");
        let file = write_temp(&text);
        let output = analyze(&args(file.path().to_path_buf())).unwrap();
        assert!(!output.success);
        assert_eq!(output.document["cleaning_needed"], json!(true));
        assert_eq!(output.document["null_rows_count"], json!(1));
        assert_eq!(output.document["duplicate_rows_count"], json!(1));
        assert_eq!(output.document["columns"], json!(["T", "M", "Y"]));
    }

    #[test]
    fn auto_clean_runs_the_pipeline() {
        let mut text = clean_csv();
        text.push_str("1,,3\n0,1,0.5\n0,1,0.5\n");
        let file = write_temp(&text);
        let mut a = args(file.path().to_path_buf());
        a.auto_clean = true;
        let output = analyze(&a).unwrap();
        assert!(output.success);
        assert_eq!(output.document["cleaning"]["null_rows_removed"], json!(1));
        assert_eq!(output.document["cleaning"]["duplicate_rows_removed"], json!(1));
        assert_eq!(output.document["cleaning_needed"], json!(false));
    }

    #[test]
    fn clean_file_yields_bundle() {
        let file = write_temp(&clean_csv());
        let output = analyze(&args(file.path().to_path_buf())).unwrap();
        assert!(output.success);
        let doc = &output.document;
        assert_eq!(doc["cleaning_needed"], json!(false));
        assert_eq!(doc["null_rows_count"], json!(0));
        assert_eq!(doc["columns"], json!(["T", "M", "Y"]));
        assert_eq!(doc["learned_graph"]["algorithm"], json!("PC"));
        let value = doc["estimate_value"].as_f64().unwrap();
        assert!((value - 2.0).abs() < 0.2);
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempdir().unwrap();
        let config = dir.path().join("opts.yaml");
        fs::write(&config, "alpha: 0.01\nestimator: psw\nrefuter:\n  enabled: false\n").unwrap();
        let mut a = args(dir.path().join("unused.csv"));
        a.config = Some(config);
        a.alpha = Some(0.1);
        let opts = resolve_opts(&a).unwrap();
        assert_eq!(opts.alpha, 0.1);
        assert_eq!(opts.estimator.as_deref(), Some("psw"));
        assert!(!opts.refuter.enabled);
        assert_eq!(opts.seed, Some(3));
    }

    #[test]
    fn missing_treatment_is_an_error() {
        let file = write_temp(&clean_csv());
        let mut a = args(file.path().to_path_buf());
        a.treatment = "absent".into();
        let err = analyze(&a).err().unwrap();
        assert!(err.to_string().contains("missing-column"));
    }
}
