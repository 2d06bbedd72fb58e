use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use curriculum_index::audit::{self, Severity};
use curriculum_index::bench::{self, BenchParams};
use curriculum_index::config::{self, IndexConfig};
use curriculum_index::curriculum::{self, LessonId, ModuleId};
use curriculum_index::watch;
use curriculum_index::{KnowledgeIndex, LearnedSnapshot, RecordingTelemetry};

/// curidx - curriculum knowledge-state index
/// Answers "what has the learner already met at this step?" for a curriculum
#[derive(Parser)]
#[command(name = "curidx")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Curriculum knowledge-state index", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to .curidx/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Curriculum file, overrides [content] path from the configuration
    #[arg(long, global = true)]
    curriculum: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,

    /// Build the lexicon and show curriculum statistics
    Stats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Audit the curriculum for authoring problems
    Check {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show what the learner knows after a step
    State {
        #[arg(long)]
        module: String,
        #[arg(long)]
        lesson: String,
        /// Step index, clamped into the lesson
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        step: i64,
        /// Show the state before the lesson's first step instead
        #[arg(long)]
        base: bool,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List vocabulary for a review set up through a module or lesson
    Review {
        #[arg(long)]
        module: String,
        #[arg(long)]
        lesson: Option<String>,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Reload the index whenever the curriculum file changes
    Watch {
        /// Poll interval, overrides [watch] interval_ms
        #[arg(long)]
        interval_ms: Option<u64>,
    },

    /// Run performance benchmarks on a synthetic curriculum
    Bench {
        #[arg(long, default_value = "10")]
        modules: usize,
        #[arg(long, default_value = "8")]
        lessons: usize,
        #[arg(long, default_value = "40")]
        steps: usize,
        #[arg(long, default_value = "10")]
        iterations: usize,
        #[arg(long, default_value = "8")]
        workers: usize,
        #[arg(long, default_value = "42")]
        seed: u64,
        /// Write the results as JSON to this file
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr) // Always write logs to stderr, not stdout
        .init();

    let config_path = config::resolve_config_path(cli.config.as_deref())?;

    match cli.command {
        Commands::Init => {
            if config::init(&config_path, cli.curriculum.as_deref())? {
                println!("✅ Created {}", config_path.display());
            } else {
                println!("Configuration already exists at {}", config_path.display());
            }
        }
        Commands::Stats { json } => {
            let config = IndexConfig::load(&config_path)?;
            let index = open_index(&config, cli.curriculum.as_deref())?;
            let lexicon = index.init().context("Curriculum failed integrity checks")?;
            let stats = lexicon.stats();

            if json {
                println!("{}", serde_json::to_string_pretty(stats)?);
            } else {
                println!("Curriculum Statistics");
                println!("=====================");
                println!();
                println!("Modules:             {}", stats.modules);
                println!("Lessons:             {}", stats.lessons);
                println!("Steps:               {}", stats.steps);
                println!("Vocabulary items:    {}", stats.vocabulary);
                println!("Suffix steps:        {}", stats.suffix_steps);
                println!("Distinct suffixes:   {}", stats.distinct_suffixes);
                println!("Distinct connectors: {}", stats.distinct_connectors);
                println!("Review references:   {}", stats.review_references);
                println!();
                println!("Steps by kind:");
                for (kind, count) in &stats.steps_by_kind {
                    println!("  {:<20} {}", kind, count);
                }
            }
        }
        Commands::Check { json } => {
            let config = IndexConfig::load(&config_path)?;
            let content = load_curriculum(&config, cli.curriculum.as_deref())?;
            let telemetry = Arc::new(RecordingTelemetry::new());
            let index = KnowledgeIndex::with_telemetry(content, &config, telemetry.clone());
            let report = audit::audit(&index).context("Curriculum failed integrity checks")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Curriculum Audit");
                println!("================");
                println!();
                println!("Lessons checked: {}", report.lessons_checked);
                println!("Steps checked:   {}", report.steps_checked);
                println!("Soft warnings:   {}", telemetry.warnings().len());
                println!();
                if report.findings.is_empty() {
                    println!("✅ No findings");
                }
                for finding in &report.findings {
                    let marker = match finding.severity {
                        Severity::Error => "❌",
                        Severity::Warning => "⚠️ ",
                    };
                    println!("{} {}", marker, finding);
                }
            }

            if report.has_errors() {
                anyhow::bail!("Audit found index invariant violations");
            }
        }
        Commands::State {
            module,
            lesson,
            step,
            base,
            json,
        } => {
            let config = IndexConfig::load(&config_path)?;
            let index = open_index(&config, cli.curriculum.as_deref())?;
            let module = ModuleId::parse(&module)?;
            let lesson = LessonId::parse(&lesson)?;

            let snapshot = if base {
                index.base_state(&module, &lesson)?
            } else {
                index.learned_state(&module, &lesson, step)?.as_ref().clone()
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                let position = if base {
                    "before first step".to_string()
                } else {
                    format!("after step {}", step)
                };
                println!("{}/{} {}", module, lesson, position);
                print_snapshot(&snapshot);
            }
        }
        Commands::Review {
            module,
            lesson,
            json,
        } => {
            let config = IndexConfig::load(&config_path)?;
            let index = open_index(&config, cli.curriculum.as_deref())?;
            let module = ModuleId::parse(&module)?;
            let lesson = lesson.as_deref().map(LessonId::parse).transpose()?;

            let vocabulary = index.vocabulary_through(&module, lesson.as_ref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&vocabulary)?);
            } else {
                for id in &vocabulary {
                    println!("{}", id);
                }
                info!("{} vocabulary items in review set", vocabulary.len());
            }
        }
        Commands::Watch { interval_ms } => {
            let config = IndexConfig::load(&config_path)?;
            let path = curriculum_path(&config, cli.curriculum.as_deref())?;
            let index = Arc::new(KnowledgeIndex::new(curriculum::load(&path)?, &config));
            index.init().context("Curriculum failed integrity checks")?;

            let interval = Duration::from_millis(interval_ms.unwrap_or(config.watch.interval_ms));
            watch::run(index, path, interval).await?;
        }
        Commands::Bench {
            modules,
            lessons,
            steps,
            iterations,
            workers,
            seed,
            output,
        } => {
            let params = BenchParams {
                modules,
                lessons,
                steps,
                iterations,
                workers,
                seed,
            };
            let results = bench::run_benchmarks(params).await?;
            println!("{}", results.to_markdown());

            if let Some(output) = output {
                std::fs::write(&output, serde_json::to_string_pretty(&results)?)
                    .with_context(|| format!("Failed to write {}", output.display()))?;
                println!();
                println!("📄 Results written to {}", output.display());
            }
        }
    }

    Ok(())
}

fn curriculum_path(config: &IndexConfig, explicit: Option<&Path>) -> Result<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| config.content.path.clone())
        .ok_or_else(|| {
            anyhow::anyhow!(
                "No curriculum given. Use --curriculum <file> or set [content] path in the config"
            )
        })
}

fn load_curriculum(
    config: &IndexConfig,
    explicit: Option<&Path>,
) -> Result<curriculum::Curriculum> {
    curriculum::load(&curriculum_path(config, explicit)?)
}

fn open_index(config: &IndexConfig, explicit: Option<&Path>) -> Result<KnowledgeIndex> {
    Ok(KnowledgeIndex::new(load_curriculum(config, explicit)?, config))
}

fn print_snapshot(snapshot: &LearnedSnapshot) {
    let join = |set: &std::collections::BTreeSet<String>| {
        set.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
    };
    println!("Vocabulary ({}): {}", snapshot.vocab_ids.len(), join(&snapshot.vocab_ids));
    println!("Suffixes ({}): {}", snapshot.suffixes.len(), join(&snapshot.suffixes));
    println!("Connectors ({}): {}", snapshot.connectors.len(), join(&snapshot.connectors));
}
