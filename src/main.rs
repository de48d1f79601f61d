//! CLI entry point for `s2sql`.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use s2sql::candidate::QueryFilters;
use s2sql::config::EngineConfig;
use s2sql::corrector::{CorrectionContext, SqlCorrectionPipeline};
use s2sql::dictionary::{DictionaryIndex, MatchResult, ModelScope};
use s2sql::matcher::{protected_ranges, ProtectedToken, Segment, SegmentMatcher};
use s2sql::schema::SemanticSchema;

#[derive(Parser)]
#[command(
    name = "s2sql",
    about = "Match schema terms in natural-language queries and correct generated SQL"
)]
struct Cli {
    /// Engine configuration (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print dictionary matches for every segment of a query
    Match {
        /// Dictionary file (JSON)
        #[arg(long)]
        dictionary: PathBuf,

        /// Query text
        #[arg(long)]
        text: String,

        /// Requester's tenant id
        #[arg(long)]
        tenant: Option<i64>,

        /// Restrict matches to these models
        #[arg(long = "model")]
        models: Vec<i64>,

        /// Token that must not be split, as `offset:length`
        #[arg(long = "protect", value_parser = parse_protected)]
        protected: Vec<ProtectedToken>,
    },
    /// Run the correction passes over one SQL statement
    Correct {
        /// Schema metadata (JSON)
        #[arg(long)]
        schema: PathBuf,

        /// SQL to correct
        #[arg(long)]
        sql: String,

        /// Models the SQL was generated for
        #[arg(long = "model")]
        models: Vec<i64>,

        /// Requester's tenant id
        #[arg(long, allow_negative_numbers = true)]
        tenant: Option<i64>,

        /// Reference date for the default date filter (YYYY-MM-DD)
        #[arg(long)]
        reference_date: Option<String>,

        /// Request filters (JSON)
        #[arg(long)]
        filters: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct SegmentReport<'a> {
    segment: &'a Segment,
    matches: &'a [MatchResult],
}

fn parse_protected(raw: &str) -> Result<ProtectedToken, String> {
    let (offset, length) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected `offset:length`, got `{raw}`"))?;
    let offset = offset
        .trim()
        .parse()
        .map_err(|e| format!("invalid offset `{offset}`: {e}"))?;
    let length = length
        .trim()
        .parse()
        .map_err(|e| format!("invalid length `{length}`: {e}"))?;
    Ok(ProtectedToken { offset, length })
}

fn fail(context: &str, error: impl std::fmt::Display) -> ! {
    eprintln!("{context}: {error}");
    process::exit(2);
}

fn load_config(path: Option<&Path>) -> EngineConfig {
    match path {
        Some(path) => EngineConfig::from_path(path)
            .unwrap_or_else(|e| fail(&format!("Error loading config {}", path.display()), e)),
        None => EngineConfig::default(),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());

    match cli.command {
        Command::Match {
            dictionary,
            text,
            tenant,
            models,
            protected,
        } => run_match(&config, &dictionary, &text, tenant, models, &protected),
        Command::Correct {
            schema,
            sql,
            models,
            tenant,
            reference_date,
            filters,
        } => run_correct(
            &config,
            &schema,
            &sql,
            models,
            tenant,
            reference_date,
            filters.as_deref(),
        ),
    }
}

fn run_match(
    config: &EngineConfig,
    dictionary: &Path,
    text: &str,
    tenant: Option<i64>,
    models: Vec<i64>,
    protected: &[ProtectedToken],
) {
    let index = DictionaryIndex::from_path(dictionary, config.search_size).unwrap_or_else(|e| {
        fail(
            &format!("Error loading dictionary {}", dictionary.display()),
            e,
        )
    });
    let matcher = SegmentMatcher::new(Arc::new(index), config)
        .unwrap_or_else(|e| fail("Error starting matcher", e));

    let scope = if models.is_empty() {
        ModelScope::All
    } else {
        ModelScope::Models(models.into_iter().collect())
    };
    let matches = matcher.match_text_in(text, &protected_ranges(protected), tenant, &scope);

    let mut report: Vec<SegmentReport<'_>> = matches
        .iter()
        .map(|(segment, matches)| SegmentReport { segment, matches })
        .collect();
    report.sort_by_key(|r| r.segment.reg_text.chars().count());

    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(e) => fail("Error serializing matches", e),
    }
}

fn run_correct(
    config: &EngineConfig,
    schema_path: &Path,
    sql: &str,
    models: Vec<i64>,
    tenant: Option<i64>,
    reference_date: Option<String>,
    filters_path: Option<&Path>,
) {
    let schema = SemanticSchema::from_path(schema_path).unwrap_or_else(|e| {
        fail(
            &format!("Error loading schema {}", schema_path.display()),
            e,
        )
    });
    let filters = match filters_path {
        Some(path) => std::fs::read_to_string(path)
            .map_err(s2sql::Error::from)
            .and_then(|raw| Ok(serde_json::from_str::<QueryFilters>(&raw)?))
            .unwrap_or_else(|e| fail(&format!("Error loading filters {}", path.display()), e)),
        None => QueryFilters::default(),
    };

    let ctx = CorrectionContext::new(&schema)
        .with_models(models.into_iter().collect::<BTreeSet<_>>())
        .with_tenant(tenant)
        .with_filters(filters)
        .with_reference_date(reference_date);

    let pipeline = SqlCorrectionPipeline::new(config);
    match pipeline.try_correct(sql, &ctx) {
        Ok(corrected) => println!("{corrected}"),
        Err(e) => fail("Error correcting SQL", e),
    }
}
