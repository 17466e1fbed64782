mod catalog;
mod classifier;
mod github;
mod ingest;
mod llm;
mod model;
mod render;
mod settings;
mod store;
mod utils;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};
use tracing::info;

use catalog::Catalog;
use github::RealGithub;
use settings::Settings;
use store::CategoryStore;

#[derive(Parser)]
#[command(name = "awesome-scraping", about = "Maintain the awesome-scraping list")]
struct Cli {
    #[command(flatten)]
    paths: PathArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct PathArgs {
    /// Repository list (default: urls.json)
    #[arg(long, global = true)]
    urls: Option<PathBuf>,
    /// Category memberships (default: categories.json)
    #[arg(long, global = true)]
    categories: Option<PathBuf>,
    /// Urls to drop on refresh (default: blacklist.txt)
    #[arg(long, global = true)]
    blacklist: Option<PathBuf>,
    /// Where previous urls.json files are moved (default: history/)
    #[arg(long, global = true)]
    history: Option<PathBuf>,
    /// Generated report (default: README.md)
    #[arg(long, global = true)]
    readme: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add repositories submitted through "add <url>" issues
    Ingest,
    /// Classify repositories that have no category yet
    Categorize {
        /// Max repositories to classify (default: all pending)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Refresh metadata from GitHub and regenerate the README
    Render {
        /// Render from stored data without calling GitHub
        #[arg(long)]
        skip_refresh: bool,
        /// Leave out the table of contents
        #[arg(long)]
        no_toc: bool,
    },
}

impl PathArgs {
    fn apply(self, settings: &mut Settings) {
        if let Some(p) = self.urls {
            settings.urls_path = p;
        }
        if let Some(p) = self.categories {
            settings.categories_path = p;
        }
        if let Some(p) = self.blacklist {
            settings.blacklist_path = p;
        }
        if let Some(p) = self.history {
            settings.history_dir = p;
        }
        if let Some(p) = self.readme {
            settings.readme_path = p;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let mut settings = Settings::load()?;
    cli.paths.apply(&mut settings);
    info!(
        urls = %settings.urls_path.display(),
        categories = %settings.categories_path.display(),
        authenticated = settings.github_token.is_some(),
        "Settings loaded"
    );

    let catalog = Catalog::default_scraping();
    let github = RealGithub::new(&settings.github_api, settings.github_token.clone())?;

    let result = match cli.command {
        Commands::Ingest => ingest::run(&github, &settings).await.map(|_| ()),
        Commands::Categorize { limit } => {
            let api_key = settings.require_openrouter_key()?;
            let completer = llm::OpenRouter::new(&settings.openrouter_api, api_key, &settings.model)?;

            let entries = store::load_entries(&settings.urls_path)?;
            println!("Loaded {} repos from {}", entries.len(), settings.urls_path.display());

            let mut categories = CategoryStore::load(&settings.categories_path, &catalog)?;
            let classifier = classifier::Classifier::new(
                &github,
                &completer,
                &catalog,
                Duration::from_millis(settings.classify_delay_ms),
            );
            let stats = classifier
                .run(&entries, &mut categories, &settings.categories_path, limit)
                .await?;

            if stats.processed > 0 {
                println!("\nSaved categories to {}", settings.categories_path.display());
                classifier::print_summary(&categories, &stats);
            }
            Ok(())
        }
        Commands::Render {
            skip_refresh,
            no_toc,
        } => {
            let options = render::RenderOptions {
                refresh: !skip_refresh,
                include_toc: !no_toc,
            };
            let today = chrono::Local::now().date_naive();
            render::run(&github, &settings, &catalog, options, today)
                .await
                .map(|_| ())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", utils::format_duration(elapsed));
    }

    result
}
