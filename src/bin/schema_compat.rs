//! Schema Compatibility CLI
//!
//! Compares two schema snapshots and reports breaking changes, changed
//! resources, service labels and missing test or documentation coverage.
//!
//! Usage:
//!   schema-compat breaking-changes --old old.json --new new.json
//!   schema-compat detect-missing-tests --old old.json --new new.json --tests parsed-tests/
//!   schema-compat rules --markdown

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use schema_compat::{
    changed_resources, compute_breaking_changes, compute_schema_diff, detect_missing_docs,
    detect_missing_docs_for_datasources, detect_missing_tests, load_docs, load_resource_map, load_tests,
    report, CompatConfig, CorpusError, MissingDocInfo, MissingTestInfo, OutputFormat, RuleSet, SchemaDiff,
    SchemaDiffSummary, ServiceLabeler,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-compat")]
#[command(about = "Detect breaking changes and coverage gaps between provider schema snapshots")]
struct Cli {
    /// Configuration file layered over the defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format; overrides the configured format
    #[arg(short, long, global = true, value_enum)]
    format: Option<OutputFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Snapshots {
    /// Schema snapshot before the change (JSON)
    #[arg(long)]
    old: PathBuf,

    /// Schema snapshot after the change (JSON)
    #[arg(long)]
    new: PathBuf,
}

impl Snapshots {
    fn diff(&self) -> anyhow::Result<SchemaDiff> {
        let old = load_resource_map(&self.old).with_context(|| format!("reading {}", self.old.display()))?;
        let new = load_resource_map(&self.new).with_context(|| format!("reading {}", self.new.display()))?;
        Ok(compute_schema_diff(&old, &new))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List breaking changes
    BreakingChanges {
        #[command(flatten)]
        snapshots: Snapshots,
    },

    /// List every resource with a schema change
    ChangedSchemaResources {
        #[command(flatten)]
        snapshots: Snapshots,
    },

    /// Compute service labels for the changed resources
    AddLabels {
        #[command(flatten)]
        snapshots: Snapshots,
        /// Enrolled teams YAML mapping labels to resource patterns
        #[arg(long)]
        enrolled_teams: PathBuf,
        /// Label already applied; may be repeated
        #[arg(long = "existing-label")]
        existing_labels: Vec<String>,
    },

    /// Find changed fields that no acceptance test sets
    DetectMissingTests {
        #[command(flatten)]
        snapshots: Snapshots,
        /// Directory of parsed test files (JSON)
        #[arg(long)]
        tests: PathBuf,
    },

    /// Find new fields missing from resource documentation
    DetectMissingDocs {
        #[command(flatten)]
        snapshots: Snapshots,
        /// Directory of documentation pages
        #[arg(long)]
        docs: PathBuf,
        /// Only check that each data source has a page
        #[arg(long)]
        data_sources: bool,
    },

    /// Summarize added, modified and removed resources
    SchemaDiff {
        #[command(flatten)]
        snapshots: Snapshots,
    },

    /// Print the effective configuration as TOML
    Config {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the breaking-change rule catalog
    Rules {
        /// Render as markdown instead of a list of identifiers
        #[arg(long)]
        markdown: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = CompatConfig::load_from(cli.config.as_deref().and_then(Path::to_str))
        .context("loading configuration")?;
    if let Some(format) = cli.format {
        config.output.format = format;
    }
    let rules = RuleSet::from_config(&config.rules);
    let json = config.output.format == OutputFormat::Json;
    let pretty = config.output.pretty;

    match cli.command {
        Commands::BreakingChanges { snapshots } => {
            let changes = compute_breaking_changes(&snapshots.diff()?, &rules);
            info!(count = changes.len(), "breaking changes found");
            if json {
                println!("{}", report::render_json(&changes, pretty)?);
            } else {
                print!("{}", report::render_breaking_text(&changes));
            }
        }

        Commands::ChangedSchemaResources { snapshots } => {
            let resources = changed_resources(&snapshots.diff()?);
            if json {
                println!("{}", report::render_json(&resources, pretty)?);
            } else {
                for resource in resources {
                    println!("{resource}");
                }
            }
        }

        Commands::AddLabels {
            snapshots,
            enrolled_teams,
            existing_labels,
        } => {
            let labeler = ServiceLabeler::load(&enrolled_teams)
                .with_context(|| format!("reading {}", enrolled_teams.display()))?;
            let resources = changed_resources(&snapshots.diff()?);
            match labeler.labels_for_update(&resources, &existing_labels) {
                Some(labels) if json => println!("{}", report::render_json(&labels, pretty)?),
                Some(labels) => {
                    for label in labels {
                        println!("{label}");
                    }
                }
                None => info!("no label update needed"),
            }
        }

        Commands::DetectMissingTests { snapshots, tests } => {
            let diff = snapshots.diff()?;
            let (tests, errors) = load_tests(&tests);
            report_corpus_errors(&errors);
            let missing = detect_missing_tests(&diff, &tests, &config.detector);
            if json {
                println!("{}", report::render_json(&missing, pretty)?);
            } else {
                print_missing_tests(&missing);
            }
        }

        Commands::DetectMissingDocs {
            snapshots,
            docs,
            data_sources,
        } => {
            let diff = snapshots.diff()?;
            let (docs, errors) = load_docs(&docs);
            report_corpus_errors(&errors);
            let missing = if data_sources {
                detect_missing_docs_for_datasources(&diff, &docs, &config.detector)
            } else {
                detect_missing_docs(&diff, &docs, &config.detector)
            };
            if json {
                println!("{}", report::render_json(&missing, pretty)?);
            } else {
                print_missing_docs(&missing);
            }
        }

        Commands::SchemaDiff { snapshots } => {
            let summary = SchemaDiffSummary::from_diff(&snapshots.diff()?);
            if json {
                println!("{}", report::render_json(&summary, pretty)?);
            } else {
                print_summary(&summary);
            }
        }

        Commands::Config { output } => match output {
            Some(path) => {
                config
                    .save(&path)
                    .with_context(|| format!("writing {}", path.display()))?;
                info!(path = %path.display(), "configuration written");
            }
            None => print!("{}", config.to_toml()?),
        },

        Commands::Rules { markdown } => {
            if markdown {
                print!("{}", rules.catalog_markdown());
            } else if json {
                println!("{}", report::render_json(&rules.identifiers(), pretty)?);
            } else {
                for rule in rules.rules() {
                    println!("{:<55} {}", rule.identifier, rule.name);
                }
            }
        }
    }

    Ok(())
}

fn report_corpus_errors(errors: &[CorpusError]) {
    if !errors.is_empty() {
        warn!(skipped = errors.len(), "some corpus files could not be read");
    }
}

fn print_missing_tests(missing: &[MissingTestInfo]) {
    for info in missing {
        println!("{}: {}", info.resource, info.untested_fields.join(", "));
        if !info.tests.is_empty() {
            println!("  tests: {}", info.tests.join(", "));
        }
        println!("{}", info.suggested_test);
    }
}

fn print_missing_docs(missing: &[MissingDocInfo]) {
    for info in missing {
        let doc = info.doc.as_deref().unwrap_or("(no documentation)");
        println!("{} [{}]: {}", info.resource, doc, info.undocumented_fields.join(", "));
    }
}

fn print_summary(summary: &SchemaDiffSummary) {
    let sections = [
        ("Added", &summary.added_resources),
        ("Modified", &summary.modified_resources),
        ("Removed", &summary.removed_resources),
    ];
    for (title, resources) in sections {
        if resources.is_empty() {
            continue;
        }
        println!("{title}:");
        for resource in resources {
            println!("  {resource}");
        }
    }
}
