//! The `pixelwash sanitize` command.

use clap::{Args, ValueEnum};
use pixelwash_core::output::OutputFormat as CoreOutputFormat;
use pixelwash_core::{Config, JobReport, OutputWriter, Pixelwash, ProcessOptions, StateLabel};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Arguments for the `sanitize` command.
#[derive(Args, Debug)]
pub struct SanitizeArgs {
    /// File or directory of untrusted images
    #[arg(required = true)]
    pub input: PathBuf,

    /// Directory for sanitized PNGs (defaults to `output.dir` from config)
    #[arg(short, long)]
    pub dir: Option<String>,

    /// Report file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Report format (defaults to `output.format` from config)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Longest allowed side of the sanitized image
    #[arg(long)]
    pub max_dimension: Option<u32>,

    /// Declared MIME type of the input, used as a decode hint
    #[arg(long)]
    pub content_type: Option<String>,
}

/// Supported report formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Single JSON array
    Json,
    /// One JSON object per line (newline-delimited)
    Jsonl,
}

impl From<OutputFormat> for CoreOutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => CoreOutputFormat::Json,
            OutputFormat::Jsonl => CoreOutputFormat::JsonLines,
        }
    }
}

/// Per-state counts for the end-of-run summary.
#[derive(Debug, Default, PartialEq, Eq)]
struct Summary {
    completed: usize,
    opted_out: usize,
    with_errors: usize,
    errors: usize,
}

impl Summary {
    fn record(&mut self, report: &JobReport) {
        match report.state.label {
            StateLabel::Completed => self.completed += 1,
            StateLabel::OptOut => self.opted_out += 1,
            StateLabel::CompletedWithErrors => self.with_errors += 1,
            StateLabel::Error => self.errors += 1,
        }
    }
}

/// Execute the sanitize command.
pub async fn execute(args: SanitizeArgs, config: Config) -> anyhow::Result<()> {
    if !args.input.exists() {
        anyhow::bail!(
            "Input path does not exist: {:?}\n\n  Hint: Check the file path and try again.",
            args.input
        );
    }

    let config = apply_overrides(config, &args)?;
    let format = resolve_format(&args, &config)?;
    let out_dir = match &args.dir {
        Some(dir) => PathBuf::from(shellexpand::tilde(dir).into_owned()),
        None => config.output_dir(),
    };
    let pretty = config.output.pretty;

    let pixelwash = Pixelwash::new(config);
    let files = pixelwash.discover(&args.input);
    if files.is_empty() {
        tracing::warn!("No input files found at {:?}", args.input);
        return Ok(());
    }
    tracing::info!("Found {} file(s) to sanitize", files.len());

    let options = ProcessOptions {
        content_type: args.content_type.clone(),
        out_dir: Some(out_dir),
    };

    let sink: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(std::io::stdout().lock()),
    };
    let mut writer = OutputWriter::new(sink, format, pretty);

    let start = std::time::Instant::now();
    let mut summary = Summary::default();
    let mut reports = Vec::new();

    for file in &files {
        let report = pixelwash.process_file(&file.path, &options).await;
        summary.record(&report);

        // JSONL streams; a JSON array needs every report first
        match format {
            CoreOutputFormat::JsonLines => writer.write(&report)?,
            CoreOutputFormat::Json => reports.push(report),
        }
    }

    if format == CoreOutputFormat::Json {
        writer.write_all(&reports)?;
    }
    writer.flush()?;

    if let Some(path) = &args.output {
        tracing::info!("Reports written to {:?}", path);
    }
    tracing::info!(
        "Sanitized {} of {} file(s) in {:.1}s ({} opted out, {} malformed, {} errors)",
        summary.completed,
        files.len(),
        start.elapsed().as_secs_f64(),
        summary.opted_out,
        summary.with_errors,
        summary.errors
    );

    Ok(())
}

/// Apply command-line overrides on top of the loaded config.
fn apply_overrides(mut config: Config, args: &SanitizeArgs) -> anyhow::Result<Config> {
    if let Some(max_dimension) = args.max_dimension {
        config.sanitize.max_dimension = max_dimension;
    }
    config.validate()?;
    Ok(config)
}

/// The `--format` flag wins over `output.format` from config.
fn resolve_format(args: &SanitizeArgs, config: &Config) -> anyhow::Result<CoreOutputFormat> {
    match args.format {
        Some(format) => Ok(format.into()),
        None => CoreOutputFormat::parse(&config.output.format).ok_or_else(|| {
            anyhow::anyhow!("Unknown output.format in config: {}", config.output.format)
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> SanitizeArgs {
        SanitizeArgs {
            input: PathBuf::from("in"),
            dir: None,
            output: None,
            format: None,
            max_dimension: None,
            content_type: None,
        }
    }

    #[test]
    fn test_max_dimension_override() {
        let config = apply_overrides(
            Config::default(),
            &SanitizeArgs {
                max_dimension: Some(128),
                ..args()
            },
        )
        .unwrap();
        assert_eq!(config.sanitize.max_dimension, 128);
    }

    #[test]
    fn test_zero_max_dimension_rejected() {
        let result = apply_overrides(
            Config::default(),
            &SanitizeArgs {
                max_dimension: Some(0),
                ..args()
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_format_resolution() {
        let mut config = Config::default();
        assert_eq!(
            resolve_format(&args(), &config).unwrap(),
            CoreOutputFormat::Json
        );

        config.output.format = "jsonl".to_string();
        assert_eq!(
            resolve_format(&args(), &config).unwrap(),
            CoreOutputFormat::JsonLines
        );

        let flagged = SanitizeArgs {
            format: Some(OutputFormat::Json),
            ..args()
        };
        assert_eq!(
            resolve_format(&flagged, &config).unwrap(),
            CoreOutputFormat::Json
        );
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = Summary::default();
        summary.record(&JobReport::from_error("a", &"boom"));
        summary.record(&JobReport::from_outcome(
            "b",
            "h",
            &pixelwash_core::SanitizationOutcome::OptedOut,
        ));
        assert_eq!(
            summary,
            Summary {
                opted_out: 1,
                errors: 1,
                ..Summary::default()
            }
        );
    }

    #[tokio::test]
    async fn test_execute_writes_reports_and_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        std::fs::create_dir(&input).unwrap();

        let img = image::RgbImage::from_pixel(700, 350, image::Rgb([200, 10, 10]));
        img.save(input.join("big.png")).unwrap();
        std::fs::write(input.join("notes.txt"), b"plain text").unwrap();

        let safe = dir.path().join("safe");
        let report_path = dir.path().join("reports.jsonl");
        execute(
            SanitizeArgs {
                input,
                dir: Some(safe.display().to_string()),
                output: Some(report_path.clone()),
                format: Some(OutputFormat::Jsonl),
                ..args()
            },
            Config::default(),
        )
        .await
        .unwrap();

        let text = std::fs::read_to_string(&report_path).unwrap();
        let reports: Vec<JobReport> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].state.label, StateLabel::Completed);
        assert_eq!(reports[1].state.label, StateLabel::OptOut);

        let artifact = reports[0].artifact().unwrap();
        assert!(artifact.width <= 512 && artifact.height <= 512);
        assert!(artifact.path.as_ref().unwrap().starts_with(&safe));
    }
}
