// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use doc_synth::utils::logging::{
    format_error, format_info, format_step, format_success, format_warning,
};
use doc_synth::{
    Config, DeclarationNode, DocumentationPipeline, DocumentationResult, FileScanner,
    GenerativeModel, JsonExporter, ProgressTracker, SubmittedFile, Validator,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "doc_synth")]
#[command(version)]
#[command(about = "Documentation generation service for Python, Java, C, C++ and JavaScript", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the REST service
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Document a file or directory and write documentation.json
    Document {
        path: PathBuf,

        #[arg(short, long, default_value = "./docs")]
        output: PathBuf,

        #[arg(short, long)]
        pretty: bool,

        /// Language tag applied to every file instead of extension inference
        #[arg(short, long, value_name = "TAG")]
        language: Option<String>,
    },

    /// Print the declaration tree of a file without generating documentation
    Parse {
        file: PathBuf,

        #[arg(short, long, value_name = "TAG")]
        language: Option<String>,
    },

    /// Print the health report
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    doc_synth::utils::logging::init_logger(cli.color, cli.verbose);

    info!("Loading configuration from: {}", cli.config.display());

    let config = if cli.config.exists() {
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?
    } else {
        warn!(
            "Config file {} not found, using defaults and environment",
            cli.config.display()
        );
        Config::load(None).context("Failed to load configuration")?
    };

    match cli.command {
        Commands::Serve { host, port } => {
            cmd_serve(config, host, port).await?;
        }
        Commands::Document {
            path,
            output,
            pretty,
            language,
        } => {
            cmd_document(&config, &path, output, pretty, language, cli.color).await?;
        }
        Commands::Parse { file, language } => {
            cmd_parse(&config, &file, language).await?;
        }
        Commands::Health => {
            cmd_health(&config)?;
        }
    }

    Ok(())
}

async fn cmd_serve(mut config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        Validator::validate_port(port)?;
        config.server.port = port;
    }

    let pipeline =
        Arc::new(DocumentationPipeline::new(&config).context("Failed to build pipeline")?);
    info!(
        "Starting documentation service on {} (model: {})",
        config.server.bind_address(),
        pipeline.model().name()
    );

    doc_synth::server::serve(&config, pipeline)
        .await
        .context("Server error")?;
    Ok(())
}

async fn cmd_document(
    config: &Config,
    path: &Path,
    output: PathBuf,
    pretty: bool,
    language: Option<String>,
    color: bool,
) -> Result<()> {
    let start_time = Instant::now();

    println!("{}", format_step(1, 3, &format!("Scanning {}", path.display())));
    let scanner = FileScanner::new(config.pipeline.clone());
    let files = scanner
        .scan(path)
        .with_context(|| format!("Failed to scan {}", path.display()))?;

    if files.is_empty() {
        println!("{}", format_warning("No supported source files found"));
        return Ok(());
    }
    info!("Found {} files to document", files.len());

    println!("{}", format_step(2, 3, &format!("Documenting {} files", files.len())));
    let pipeline = DocumentationPipeline::new(config).context("Failed to build pipeline")?;
    if !pipeline.model().is_remote() {
        println!(
            "{}",
            format_warning("No generation API key configured, using the offline fallback model")
        );
    }

    let progress = ProgressTracker::with_color(files.len(), color);
    let mut documented_files = Vec::new();

    for file in &files {
        progress.set_message(file.relative_path.clone());

        let submitted = match file.read() {
            Ok(submitted) => submitted,
            Err(e) => {
                warn!("Skipping {}: {}", file.relative_path, e);
                progress.file_failed();
                continue;
            }
        };
        let submitted = match &language {
            Some(tag) => submitted.with_language(tag.clone()),
            None => submitted,
        };

        match pipeline.process(vec![submitted]).await {
            Ok(result) => {
                progress.file_done(result.summary.documented, result.summary.failed);
                documented_files.extend(result.files);
            }
            Err(e) => {
                warn!("Failed to document {}: {}", file.relative_path, e);
                progress.file_failed();
            }
        }
    }

    progress.finish();
    let (documented, failed, files_failed) = progress.totals();

    println!("{}", format_step(3, 3, "Writing documentation"));
    let result = DocumentationResult::new(documented_files);
    let exporter = JsonExporter::new(output)?;
    let written = exporter.export(&result, pretty)?;

    println!(
        "{}",
        format_success(&format!(
            "Documented {} declarations in {} files ({:.2}s)",
            documented,
            result.summary.files,
            start_time.elapsed().as_secs_f64()
        ))
    );
    if failed > 0 || files_failed > 0 {
        println!(
            "{}",
            format_error(&format!(
                "{} declarations failed, {} files skipped",
                failed, files_failed
            ))
        );
    }
    println!("{}", format_info(&format!("Written to {}", written.display())));

    Ok(())
}

async fn cmd_parse(config: &Config, file: &Path, language: Option<String>) -> Result<()> {
    Validator::validate_file_path(file)?;
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let mut submitted = SubmittedFile::new(file.display().to_string(), content);
    if let Some(tag) = language {
        submitted = submitted.with_language(tag);
    }

    let pipeline = DocumentationPipeline::new(config).context("Failed to build pipeline")?;
    let extracted = pipeline.extract(vec![submitted]).await?;

    for (unit, nodes) in &extracted {
        println!("{} ({})", unit.path, unit.language.display_name());
        for node in nodes {
            print_node(node, 1);
        }
        let total: usize = nodes.iter().map(DeclarationNode::count).sum();
        println!("{}", format_info(&format!("{} declarations", total)));
    }

    Ok(())
}

fn print_node(node: &DeclarationNode, depth: usize) {
    println!(
        "{}{} {} [L{}-{}]",
        "  ".repeat(depth),
        node.kind,
        node.qualified_name,
        node.span.start_line,
        node.span.end_line
    );
    for child in &node.children {
        print_node(child, depth + 1);
    }
}

fn cmd_health(config: &Config) -> Result<()> {
    let pipeline = DocumentationPipeline::new(config).context("Failed to build pipeline")?;
    print!("{}", pipeline.health().format());
    Ok(())
}
