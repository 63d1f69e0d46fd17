//! oilqc - Essential-oil purity screening CLI
//!
//! Command-line interface for screening sample profiles against pure
//! references and known adulterants.

use clap::{Parser, Subcommand, ValueEnum};
use oil_purity::data::{CsvOptions, PipelineReport, ProfileTable};
use oil_purity::detect::DetectionRule;
use oil_purity::error::{PurityError, Result};
use oil_purity::pipeline::{Pipeline, PipelineConfig, RowErrorPolicy};
use oil_purity::plot::{CoordinatesCsv, ScatterPlot, VisualizationSink};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// How verdicts are printed on stdout.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    /// One line per sample
    #[default]
    Text,
    /// Pretty JSON report
    Json,
}

/// Essential-oil purity screening
#[derive(Parser)]
#[command(name = "oilqc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct RunArgs {
    /// Path to the test samples table
    #[arg(short, long)]
    test: PathBuf,

    /// Path to the pure reference table
    #[arg(short, long)]
    reference: PathBuf,

    /// Path to the known adulterant table
    #[arg(short, long)]
    adulterants: PathBuf,

    /// Pipeline configuration YAML
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Similarity threshold for a pure verdict (overrides config)
    #[arg(long)]
    threshold: Option<f64>,

    /// Skip rows that cannot be normalized instead of aborting
    #[arg(long)]
    skip_degenerate: bool,

    /// Flag an adulterant only where the sample strictly exceeds it
    #[arg(long)]
    strict_detection: bool,

    /// Screen samples in parallel
    #[arg(long)]
    parallel: bool,

    /// Column holding row identifiers
    #[arg(long)]
    id_column: Option<String>,

    /// Write a PCA scatter plot (SVG)
    #[arg(long)]
    plot: Option<PathBuf>,

    /// Write PCA coordinates as CSV
    #[arg(long)]
    coordinates: Option<PathBuf>,

    /// Write verdicts as TSV
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the pooled normalized table (references then samples) as CSV
    #[arg(long)]
    export_pooled: Option<PathBuf>,

    /// Output format for stdout
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Screen test samples against reference and adulterant tables
    Run(RunArgs),

    /// Prompt for the three input paths, then screen with defaults
    Interactive {
        /// Write a PCA scatter plot (SVG)
        #[arg(long)]
        plot: Option<PathBuf>,
    },

    /// Write an example pipeline configuration
    Example {
        /// Output path for the YAML file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run(args) => cmd_run(&args),
        Commands::Interactive { plot } => cmd_interactive(plot.as_deref()),
        Commands::Example { output } => cmd_example(&output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn load_table(path: &Path, id_column: Option<&str>) -> Result<ProfileTable> {
    let mut options = CsvOptions::for_path(path);
    if let Some(column) = id_column {
        options = options.with_id_column(column);
    }
    ProfileTable::from_csv(path, &options)
}

fn build_pipeline(args: &RunArgs) -> Result<Pipeline> {
    let mut pipeline = match &args.config {
        Some(path) => {
            eprintln!("Loading pipeline configuration from {:?}...", path);
            Pipeline::from_config(&PipelineConfig::from_file(path)?)
        }
        None => Pipeline::new().name("oilqc"),
    };

    if let Some(threshold) = args.threshold {
        pipeline = pipeline.similarity_threshold(threshold);
    }
    if args.skip_degenerate {
        pipeline = pipeline.on_row_error(RowErrorPolicy::SkipRow);
    }
    if args.strict_detection {
        pipeline = pipeline.detection_rule(DetectionRule::Exceeds);
    }
    if args.parallel {
        pipeline = pipeline.parallel(true);
    }
    Ok(pipeline)
}

/// Screen samples from files given on the command line.
fn cmd_run(args: &RunArgs) -> Result<()> {
    let pipeline = build_pipeline(args)?;

    eprintln!("Loading data...");
    let id_column = args.id_column.as_deref();
    let test = load_table(&args.test, id_column)?;
    let reference = load_table(&args.reference, id_column)?;
    let adulterants = load_table(&args.adulterants, id_column)?;
    eprintln!(
        "Loaded {} samples, {} references, {} adulterants over {} compounds",
        test.n_rows(),
        reference.n_rows(),
        adulterants.n_rows(),
        reference.n_compounds()
    );

    eprintln!("Running pipeline '{}'...", pipeline.config().name);
    let report = pipeline.run(&test, &reference, &adulterants)?;

    match args.format {
        OutputFormat::Text => print!("{}", report),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }

    if let Some(path) = &args.output {
        eprintln!("Writing results to {:?}...", path);
        report.to_tsv(path)?;
    }
    if let Some(path) = &args.export_pooled {
        eprintln!("Writing pooled table to {:?}...", path);
        report.pooled.table().to_csv(path, b',')?;
    }

    if let Some(path) = &args.plot {
        render_sink(&report, &ScatterPlot::new(path))?;
    }
    if let Some(path) = &args.coordinates {
        render_sink(&report, &CoordinatesCsv::new(path))?;
    }

    eprintln!();
    eprint!("{}", report.summary());
    for row in &report.skipped {
        eprintln!("  skipped {} row '{}': {}", row.table, row.row_id, row.reason);
    }
    Ok(())
}

/// Render a visualization; failures are reported but do not fail the run.
fn render_sink(report: &PipelineReport, sink: &dyn VisualizationSink) -> Result<()> {
    match report.render(sink) {
        Ok(()) => Ok(()),
        Err(e) if !e.is_terminal() => {
            eprintln!("Warning: {}", e);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

fn prompt_path(input: &mut impl BufRead, question: &str) -> Result<PathBuf> {
    eprint!("{}", question);
    io::stderr().flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(PurityError::InvalidParameter(
            "unexpected end of input".to_string(),
        ));
    }
    let path = line.trim();
    if path.is_empty() {
        return Err(PurityError::InvalidParameter("empty path".to_string()));
    }
    Ok(PathBuf::from(path))
}

/// Ask for the three inputs on stdin.
fn cmd_interactive(plot: Option<&Path>) -> Result<()> {
    let stdin = io::stdin();
    let mut input = stdin.lock();

    let test = prompt_path(&mut input, "Path to test samples file: ")?;
    let reference = prompt_path(&mut input, "Path to pure reference file: ")?;
    let adulterants = prompt_path(&mut input, "Path to known adulterants file: ")?;

    let args = RunArgs {
        test,
        reference,
        adulterants,
        config: None,
        threshold: None,
        skip_degenerate: false,
        strict_detection: false,
        parallel: false,
        id_column: None,
        plot: plot.map(Path::to_path_buf),
        coordinates: None,
        output: None,
        export_pooled: None,
        format: OutputFormat::Text,
    };
    cmd_run(&args)
}

/// Generate an example configuration file
fn cmd_example(output_path: &Path) -> Result<()> {
    let config = Pipeline::new()
        .name("lavender-screen")
        .similarity_threshold(0.9)
        .detection_rule(DetectionRule::MeetsOrExceeds)
        .on_row_error(RowErrorPolicy::FailFast)
        .to_config(Some(
            "Screen lavender oil samples against pure references and known adulterants",
        ));
    let yaml = config.to_yaml()?;
    std::fs::write(output_path, &yaml)?;

    eprintln!("Example configuration written to {:?}", output_path);
    eprintln!();
    eprintln!("Run with:");
    eprintln!(
        "  oilqc run -c {:?} --test samples.csv --reference pure.csv --adulterants adulterants.csv",
        output_path
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    fn parse_run(args: &[&str]) -> RunArgs {
        let mut argv = vec!["oilqc", "run", "-t", "s.csv", "-r", "p.csv", "-a", "x.csv"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Run(run) => run,
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults_without_config() {
        let pipeline = build_pipeline(&parse_run(&[])).unwrap();
        let config = pipeline.config();
        assert_eq!(config.name, "oilqc");
        assert_eq!(config.similarity_threshold, 0.9);
        assert_eq!(config.detection_rule, DetectionRule::MeetsOrExceeds);
        assert_eq!(config.on_row_error, RowErrorPolicy::FailFast);
        assert!(!config.parallel);
    }

    #[test]
    fn test_flags_override_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pipeline.yaml");
        std::fs::write(
            &path,
            "name: from-file\nsimilarity_threshold: 0.95\ndetection_rule: meets_or_exceeds\n",
        )
        .unwrap();
        let config_arg = path.to_str().unwrap();

        let kept = build_pipeline(&parse_run(&["-c", config_arg])).unwrap();
        assert_eq!(kept.config().name, "from-file");
        assert_eq!(kept.config().similarity_threshold, 0.95);

        let overridden = build_pipeline(&parse_run(&[
            "-c",
            config_arg,
            "--threshold",
            "0.8",
            "--skip-degenerate",
            "--strict-detection",
            "--parallel",
        ]))
        .unwrap();
        let config = overridden.config();
        assert_eq!(config.name, "from-file");
        assert_eq!(config.similarity_threshold, 0.8);
        assert_eq!(config.detection_rule, DetectionRule::Exceeds);
        assert_eq!(config.on_row_error, RowErrorPolicy::SkipRow);
        assert!(config.parallel);
    }

    #[test]
    fn test_missing_config_file() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("absent.yaml");
        let result = build_pipeline(&parse_run(&["-c", missing.to_str().unwrap()]));
        assert!(matches!(result, Err(PurityError::Io(_))));
    }

    #[test]
    fn test_prompt_reads_successive_lines() {
        let mut input: &[u8] = b" samples.csv \r\npure.csv\nadulterants.tsv\n";
        assert_eq!(prompt_path(&mut input, "").unwrap(), PathBuf::from("samples.csv"));
        assert_eq!(prompt_path(&mut input, "").unwrap(), PathBuf::from("pure.csv"));
        assert_eq!(prompt_path(&mut input, "").unwrap(), PathBuf::from("adulterants.tsv"));
    }

    #[test]
    fn test_prompt_rejects_blank_line() {
        let mut input: &[u8] = b"   \n";
        assert!(matches!(
            prompt_path(&mut input, ""),
            Err(PurityError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_prompt_rejects_end_of_input() {
        let mut input: &[u8] = b"";
        match prompt_path(&mut input, "") {
            Err(PurityError::InvalidParameter(msg)) => assert!(msg.contains("end of input")),
            other => panic!("expected InvalidParameter, got {other:?}"),
        }
    }
}
