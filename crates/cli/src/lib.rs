use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use repolens_analyzer::{scan_repository, Analyzer, AnalyzerConfig, RepositoryScan};
use repolens_protocol::{serialize_json_pretty, AnalysisResponse};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "repolens")]
#[command(about = "Digest and summarize code repositories", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for output)
    #[arg(long, global = true)]
    quiet: bool,

    /// TOML configuration file (overrides REPOLENS_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the digest of a local directory
    Digest(DigestArgs),

    /// Clone and summarize a repository, waiting for the result
    Analyze(AnalyzeArgs),

    /// Run the MCP server on stdio
    Serve,
}

#[derive(Args)]
struct DigestArgs {
    /// Directory to digest
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Lines kept per file
    #[arg(long)]
    max_lines: Option<usize>,

    /// Maximum number of files to digest
    #[arg(long)]
    max_files: Option<usize>,

    /// Keep files whose path mentions `test` or `spec`
    #[arg(long)]
    include_tests: bool,

    /// Output JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Repository URL
    repo_url: String,

    /// Branch to analyze (default: main)
    #[arg(short, long)]
    branch: Option<String>,

    /// Output the JSON response instead of the summary text
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct DigestOutput<'a> {
    root: String,
    #[serde(flatten)]
    scan: &'a RepositoryScan,
}

pub async fn main_entry() -> Result<()> {
    let mut cli = Cli::parse();

    // Keep stdout clean for JSON consumers
    let json_output = match &cli.command {
        Commands::Digest(args) => args.json,
        Commands::Analyze(args) => args.json,
        Commands::Serve => false,
    };
    if json_output {
        cli.quiet = true;
    }

    let default_filter = match cli.command {
        Commands::Serve => "warn",
        _ => "info",
    };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Digest(args) => run_digest(args, config)?,
        Commands::Analyze(args) => run_analyze(args, config).await?,
        Commands::Serve => {
            let analyzer = Analyzer::from_config(config).context("failed to initialise analyzer")?;
            repolens_mcp::serve_stdio(analyzer).await?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<AnalyzerConfig> {
    let config = match path {
        Some(path) => {
            let mut config = AnalyzerConfig::from_file(path)?;
            config.apply_overrides(|name| std::env::var(name).ok());
            config
        }
        None => AnalyzerConfig::load()?,
    };
    log::debug!("Configuration: {config:?}");
    Ok(config)
}

fn run_digest(args: DigestArgs, mut config: AnalyzerConfig) -> Result<()> {
    if let Some(max_lines) = args.max_lines {
        config.max_lines_per_file = max_lines;
    }
    if let Some(max_files) = args.max_files {
        config.max_files = max_files;
    }
    config.include_tests |= args.include_tests;

    let root = args
        .path
        .canonicalize()
        .with_context(|| format!("cannot access {}", args.path.display()))?;
    let scan = scan_repository(&root, &config)
        .with_context(|| format!("failed to digest {}", root.display()))?;

    if args.json {
        let output = DigestOutput {
            root: root.display().to_string(),
            scan: &scan,
        };
        return print_stdout(&serialize_json_pretty(&output)?);
    }

    print_stdout(&render_digest(&root, &scan))
}

fn render_digest(root: &Path, scan: &RepositoryScan) -> String {
    let stats = &scan.stats;
    let mut out = format!(
        "# {}\n{} source files, {} lines\n",
        root.display(),
        stats.files,
        stats.total_lines
    );
    let languages: Vec<String> = stats
        .top_languages()
        .iter()
        .map(|(lang, count)| format!("{lang} {count}"))
        .collect();
    if !languages.is_empty() {
        out.push_str(&format!("languages: {}\n", languages.join(", ")));
    }
    if scan.omitted_files > 0 {
        out.push_str(&format!(
            "{} files not digested (--max-files)\n",
            scan.omitted_files
        ));
    }
    if let Some(readme) = &scan.readme {
        out.push('\n');
        out.push_str(&readme.render());
    }
    for digest in &scan.digests {
        out.push('\n');
        out.push_str(&digest.render());
    }
    out
}

async fn run_analyze(args: AnalyzeArgs, config: AnalyzerConfig) -> Result<()> {
    let analyzer = Analyzer::from_config(config).context("failed to initialise analyzer")?;
    let response = analyzer
        .analyze_to_completion(&args.repo_url, args.branch.as_deref())
        .await;

    if args.json {
        print_stdout(&serialize_json_pretty(&response)?)?;
    }
    match response {
        AnalysisResponse::Completed { text } => {
            if !args.json {
                print_stdout(&text)?;
            }
            Ok(())
        }
        other => bail!("analysis {}: {}", other.status(), other.body()),
    }
}
