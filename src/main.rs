//! CLI entry point for the class roster tool.
//!
//! Provides subcommands for listing a semester's classes, building the
//! final-grade roster of one class, grading offline from JSON maps, and an
//! interactive browse mode that follows a changing class selection.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use class_roster::config::{ApiConfig, DEFAULT_SEMESTER};
use class_roster::grading::{AggregationPolicy, ScoreMap, aggregate};
use class_roster::infra::gradebook::{AuthenticatedClient, GradebookClient};
use class_roster::output::{self, OutputFormat, render_class_table, render_roster_table};
use class_roster::roster::{
    PageSize, RosterBuilder, RosterView, SortKey, await_all, paginate, sort_rows,
};
use class_roster::services::GradingApi;
use class_roster::telemetry::{self, LogTarget};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "class_roster")]
#[command(about = "View computed final grades for a class", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the classes offered in a semester
    Classes {
        /// Semester key, e.g. "fall2022"
        #[arg(short, long, default_value = DEFAULT_SEMESTER)]
        semester: String,
    },
    /// Build and display the final-grade roster for one class
    Roster {
        /// Class id to build the roster for
        #[arg(short, long)]
        class: String,

        /// Semester used to resolve the class title
        #[arg(short, long, default_value = DEFAULT_SEMESTER)]
        semester: String,

        /// How assignment weights combine grades
        #[arg(short, long, value_enum, default_value_t)]
        policy: AggregationPolicy,

        /// Row ordering
        #[arg(long, value_enum, default_value_t)]
        sort: SortKey,

        /// Page to show (1-based)
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Rows per page: 9, 25, 50 or 100
        #[arg(long, default_value_t = PageSize::default())]
        page_size: PageSize,

        /// Output format
        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,

        /// Write the output to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Compute one final grade from JSON maps, without the network
    Grade {
        /// JSON object of assignment id to grade, e.g. '{"a1": 80, "a2": "90"}'
        #[arg(long)]
        grades: String,

        /// JSON object of assignment id to weight, e.g. '{"a1": 50, "a2": 50}'
        #[arg(long)]
        weights: String,

        #[arg(short, long, value_enum, default_value_t)]
        policy: AggregationPolicy,
    },
    /// Read class ids from stdin, one per line, and show each roster
    Browse {
        #[arg(short, long, default_value = DEFAULT_SEMESTER)]
        semester: String,

        #[arg(short, long, value_enum, default_value_t)]
        policy: AggregationPolicy,

        #[arg(long, value_enum, default_value_t)]
        sort: SortKey,

        #[arg(long, default_value_t = PageSize::default())]
        page_size: PageSize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let _log_guard = telemetry::init(&LogTarget::from_env());

    let cli = Cli::parse();

    match cli.command {
        Commands::Classes { semester } => {
            let builder = connect(AggregationPolicy::default())?;
            let classes = builder.list_classes(&semester).await;
            println!("{}", render_class_table(&classes));
        }
        Commands::Roster {
            class,
            semester,
            policy,
            sort,
            page,
            page_size,
            format,
            output: out_path,
        } => {
            let builder = connect(policy)?;
            let classes = builder.list_classes(&semester).await;
            let mut roster = builder.build(&class, &classes).await;
            sort_rows(&mut roster.rows, sort);

            let page = paginate(&roster.rows, page_size, page);
            let rendered = output::render(format, &roster, page)?;
            match out_path {
                Some(path) => output::write_output(&path, &rendered)?,
                None => println!("{rendered}"),
            }

            if !roster.failures.is_empty() {
                warn!(
                    failures = roster.failures.len(),
                    "Roster is incomplete; some fetches failed"
                );
            }
        }
        Commands::Grade {
            grades,
            weights,
            policy,
        } => {
            let grades: ScoreMap =
                serde_json::from_str(&grades).context("--grades must be a JSON object")?;
            let weights: ScoreMap =
                serde_json::from_str(&weights).context("--weights must be a JSON object")?;

            let result = aggregate(&grades, &weights, policy);
            for skipped in &result.skipped {
                warn!(
                    key = %skipped.key,
                    reason = %skipped.reason,
                    "Grade entry excluded from final grade"
                );
            }
            info!(
                policy = %policy,
                matched = result.matched.len(),
                matched_weight = result.matched_weight,
                "Final grade computed"
            );
            println!("{}", result.final_grade);
        }
        Commands::Browse {
            semester,
            policy,
            sort,
            page_size,
        } => {
            let builder = Arc::new(connect(policy)?);
            browse(builder, &semester, sort, page_size).await?;
        }
    }

    Ok(())
}

/// Builds a roster builder over the live grading API using env config.
fn connect(policy: AggregationPolicy) -> Result<RosterBuilder<GradebookClient<AuthenticatedClient>>> {
    let config = ApiConfig::from_env()?;
    info!(base_url = %config.base_url, buid = %config.buid, "Using grading API");
    let api = Arc::new(GradebookClient::from_config(&config)?);
    Ok(RosterBuilder::new(api, policy).with_concurrency(config.concurrency))
}

/// Follows class selections typed on stdin. Each selection starts a roster
/// build in the background; a roster is printed only if its class is still
/// selected when it finishes.
async fn browse<A: GradingApi + 'static>(
    builder: Arc<RosterBuilder<A>>,
    semester: &str,
    sort: SortKey,
    page_size: PageSize,
) -> Result<()> {
    let classes = Arc::new(builder.list_classes(semester).await);
    println!("{}", render_class_table(&classes));
    println!("Enter a class id to select it (q to quit):");

    let view = Arc::new(RosterView::new());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tasks = Vec::new();

    while let Some(line) = lines.next_line().await? {
        let class_id = line.trim().to_string();
        if class_id.is_empty() {
            continue;
        }
        if class_id == "q" || class_id == "quit" {
            break;
        }

        view.select(&class_id);
        info!(class_id = %class_id, "Class selected");

        let builder = builder.clone();
        let view = view.clone();
        let classes = classes.clone();
        tasks.push(tokio::spawn(async move {
            let roster = builder.build(&class_id, &classes).await;

            let mut rows = roster.rows.clone();
            sort_rows(&mut rows, sort);
            let heading = format!(
                "{} ({}) - {}",
                roster.class.title, roster.class.class_id, roster.class.semester
            );
            let table = render_roster_table(&paginate(&rows, page_size, 1));

            let shown = view.commit_with(roster, |_| println!("{heading}\n{table}"));
            if shown.is_none() {
                info!(class_id = %class_id, "Selection changed before roster arrived; discarded");
            }
        }));
    }

    let failed = await_all(tasks).await;
    if failed > 0 {
        warn!(failed, "Some rosters could not be shown");
    }

    Ok(())
}
