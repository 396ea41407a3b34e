mod store;
mod telemetry;

use anyhow::{bail, Result};
use civic_core::config::AppConfig;
use civic_core::db::SqliteStore;
use civic_core::filter::filter_issues;
use civic_core::intake::{IntakeError, ReportIntake};
use civic_core::news::filter_news;
use civic_core::ranking;
use civic_core::schema::{IssueCategory, IssueDraft, Location, NewsType, Selector};
use civic_core::view::{Dashboard, View};
use civic_core::{DataSource, Dataset};
use clap::{Args, Parser, Subcommand};
use obsidian::render;
use schemars::schema_for;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use store::Store;
use tracing::info;

#[derive(Parser)]
#[command(name = "civic")]
#[command(about = "Civic issue dashboard CLI", long_about = None)]
struct Cli {
    /// Config file (default: ./civic.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database; overrides the configured storage path
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Directory with issues.yaml, departments.yaml and news.yaml
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List issues, filtered by category and search text
    Issues {
        /// Category tag or "all"
        #[arg(long, default_value = "all")]
        category: Selector<IssueCategory>,
        /// Case-insensitive text to find in title or description
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long)]
        json: bool,
    },
    /// Rank departments by resolution rate
    Leaderboard {
        #[arg(long)]
        json: bool,
    },
    /// Show the community news feed
    News {
        /// News type tag or "all"
        #[arg(long = "type", default_value = "all")]
        kind: Selector<NewsType>,
        #[arg(long)]
        json: bool,
    },
    /// Render one dashboard view with default filters
    View {
        /// dashboard, report, leaderboard or news
        view: View,
    },
    /// Submit a new issue report
    Report(ReportArgs),
    /// Write the sample dataset (or --data) into the SQLite store
    Seed,
    /// Obsidian vault export
    Vault {
        #[command(subcommand)]
        command: VaultCommands,
    },
    /// Export canonical JSON Schemas to the ./schemas directory
    Schema {
        #[command(subcommand)]
        command: SchemaCommands,
    },
}

#[derive(Args)]
struct ReportArgs {
    #[arg(long, default_value = "")]
    title: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long, default_value = "")]
    category: String,
    #[arg(long, default_value = "")]
    priority: String,
    /// Hide the reporter
    #[arg(long)]
    anonymous: bool,
    /// Image URL; repeat for several
    #[arg(long = "image")]
    images: Vec<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long, allow_negative_numbers = true)]
    lat: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    lng: Option<f64>,
    /// Reporter id, ignored for anonymous reports
    #[arg(long)]
    reporter: Option<String>,
    #[arg(long)]
    json: bool,
}

impl ReportArgs {
    fn into_draft(self) -> IssueDraft {
        let location = match (self.address, self.lat, self.lng) {
            (None, None, None) => None,
            (address, lat, lng) => Some(Location {
                lat: lat.unwrap_or_default(),
                lng: lng.unwrap_or_default(),
                address: address.unwrap_or_default(),
            }),
        };
        IssueDraft {
            title: self.title,
            description: self.description,
            category: self.category,
            priority: self.priority,
            is_anonymous: self.anonymous,
            images: self.images,
            location,
            reported_by: self.reporter,
        }
    }
}

#[derive(Subcommand)]
enum VaultCommands {
    /// Write issue, department and news notes plus index notes
    Build {
        #[arg(long, default_value = "vault")]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum SchemaCommands {
    /// Export JSON Schema files for canonical types
    Export {
        /// Output directory (default: ./schemas)
        #[arg(long, default_value = "schemas")]
        out_dir: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.storage.db_path = Some(db);
    }
    telemetry::init(&config.telemetry)?;

    let data_dir = cli.data;
    let open_dashboard = || -> Result<Dashboard<Store>> {
        Ok(Dashboard::new(Store::open(&config, data_dir.as_deref())?))
    };

    match cli.command {
        Commands::Issues {
            category,
            search,
            json,
        } => {
            let dashboard = open_dashboard()?;
            let issues = dashboard.source().list_issues()?;
            let matched = filter_issues(&issues, &category, &search);
            if json {
                println!("{}", serde_json::to_string_pretty(&matched)?);
            } else {
                println!("{}", render::render_issue_list(&matched, &category, &search));
            }
        }
        Commands::Leaderboard { json } => {
            let mut dashboard = open_dashboard()?;
            dashboard.switch_to(View::Leaderboard);
            let departments = dashboard.source().list_departments()?;
            if json {
                let ranked = ranking::rank_departments(&departments);
                let body = json!({
                    "summary": ranking::department_summary(&departments),
                    "achievements": ranking::achievements(&ranked),
                    "rankings": ranked,
                });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                println!("{}", render_current_view(&dashboard)?);
            }
        }
        Commands::News { kind, json } => {
            let dashboard = open_dashboard()?;
            let data = dashboard.source().snapshot()?;
            let items = filter_news(&data.news, &kind);
            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else {
                println!("{}", render::render_news_feed(&items, &data.departments, &kind));
            }
        }
        Commands::View { view } => {
            let mut dashboard = open_dashboard()?;
            dashboard.switch_to(view);
            println!("{}", render_current_view(&dashboard)?);
        }
        Commands::Report(args) => {
            let mut dashboard = open_dashboard()?;
            dashboard.switch_to(View::Report);
            return report(&dashboard, args, &config).await;
        }
        Commands::Seed => seed(&config, data_dir.as_deref())?,
        Commands::Vault { command } => match command {
            VaultCommands::Build { out } => {
                let dashboard = open_dashboard()?;
                obsidian::build_vault(dashboard.source(), &out)?;
                info!(out = %out.display(), "vault written");
                println!("Wrote vault to {}", out.display());
            }
        },
        Commands::Schema { command } => match command {
            SchemaCommands::Export { out_dir } => schema_export(out_dir)?,
        },
    }
    Ok(ExitCode::SUCCESS)
}

fn render_current_view(dashboard: &Dashboard<Store>) -> Result<String> {
    let data = dashboard.source().snapshot()?;
    let rendered = match dashboard.view() {
        View::Dashboard => {
            let issues = filter_issues(&data.issues, &Selector::All, "");
            render::render_issue_list(&issues, &Selector::All, "")
        }
        View::Report => render::render_report_form(),
        View::Leaderboard => render::render_leaderboard(&data.departments),
        View::News => {
            let items = filter_news(&data.news, &Selector::All);
            render::render_news_feed(&items, &data.departments, &Selector::All)
        }
    };
    Ok(rendered)
}

async fn report(
    dashboard: &Dashboard<Store>,
    args: ReportArgs,
    config: &AppConfig,
) -> Result<ExitCode> {
    let json = args.json;
    let draft = args.into_draft();
    let intake = ReportIntake::new(dashboard.source(), config.intake_policy());

    match intake.submit(&draft).await {
        Ok(issue) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&issue)?);
            } else {
                println!("Issue reported successfully: {} ({})", issue.title, issue.id);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(IntakeError::Validation(err)) => {
            eprintln!("Report not submitted. Fix these fields:");
            for field in &err.errors {
                eprintln!("  - {field}");
            }
            Ok(ExitCode::from(2))
        }
        Err(IntakeError::Submission(err)) => {
            eprintln!("Report could not be submitted, try again later: {err}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn seed(config: &AppConfig, data_dir: Option<&Path>) -> Result<()> {
    let Some(db_path) = &config.storage.db_path else {
        bail!("seed needs a database: pass --db or set CIVIC_DB_PATH");
    };
    let dataset = match data_dir {
        Some(dir) => Dataset::load_from_dir(dir)?,
        None => Dataset::builtin()?,
    };
    let store = SqliteStore::open(db_path)?;
    store.seed(&dataset)?;
    println!(
        "Seeded {} with {} issues, {} departments, {} news items",
        db_path.display(),
        dataset.issues.len(),
        dataset.departments.len(),
        dataset.news.len()
    );
    Ok(())
}

fn schema_export(out_dir: PathBuf) -> Result<()> {
    fs::create_dir_all(&out_dir)?;

    let schemas = [
        ("Issue", schema_for!(civic_core::schema::Issue)),
        ("Department", schema_for!(civic_core::schema::Department)),
        ("NewsItem", schema_for!(civic_core::schema::NewsItem)),
        ("IssueDraft", schema_for!(civic_core::schema::IssueDraft)),
    ];
    for (name, schema) in schemas {
        let json = serde_json::to_string_pretty(&schema)?;
        fs::write(out_dir.join(format!("{name}.schema.json")), json)?;
    }

    println!("Exported schemas to {}", out_dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_issue_filters() {
        let cli = Cli::parse_from(["civic", "issues", "--category", "water", "--search", "leak"]);
        match cli.command {
            Commands::Issues {
                category, search, ..
            } => {
                assert_eq!(category, Selector::Only(IssueCategory::Water));
                assert_eq!(search, "leak");
            }
            _ => panic!("expected issues command"),
        }
    }

    #[test]
    fn rejects_unknown_view() {
        assert!(Cli::try_parse_from(["civic", "view", "settings"]).is_err());
    }

    #[test]
    fn report_without_location_has_none() {
        let cli = Cli::parse_from([
            "civic", "report", "--title", "Leak", "--description", "Pipe", "--category", "water",
            "--priority", "low",
        ]);
        let Commands::Report(args) = cli.command else {
            panic!("expected report command");
        };
        let draft = args.into_draft();
        assert_eq!(draft.location, None);
        assert_eq!(draft.category, "water");
    }

    #[test]
    fn report_with_address_builds_location() {
        let cli = Cli::parse_from([
            "civic", "report", "--address", "Sector 18", "--lat", "28.5", "--lng", "-77.3",
        ]);
        let Commands::Report(args) = cli.command else {
            panic!("expected report command");
        };
        let location = args.into_draft().location.expect("location set");
        assert_eq!(location.address, "Sector 18");
        assert_eq!(location.lng, -77.3);
    }

    #[tokio::test]
    async fn report_through_memory_store_lists_new_issue() {
        let config = AppConfig::default();
        let store = Store::open(&config, None).unwrap();
        let dashboard = Dashboard::new(store);
        let cli = Cli::parse_from([
            "civic", "report", "--title", "Leak", "--description", "Pipe", "--category", "water",
            "--priority", "low",
        ]);
        let Commands::Report(args) = cli.command else {
            panic!("expected report command");
        };

        report(&dashboard, args, &config).await.unwrap();
        assert_eq!(dashboard.source().list_issues().unwrap().len(), 4);
    }

    #[test]
    fn every_view_renders() {
        let store = Store::open(&AppConfig::default(), None).unwrap();
        let mut dashboard = Dashboard::new(store);
        for view in View::ALL {
            dashboard.switch_to(*view);
            assert!(!render_current_view(&dashboard).unwrap().is_empty());
        }
    }
}
