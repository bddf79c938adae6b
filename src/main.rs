use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand};

use kurzy::api::{self, AppState};
use kurzy::config::Config;
use kurzy::feed::{CnbFeed, CsobFeed, HttpFetcher, TextFetcher};
use kurzy::job::UpdateJob;
use kurzy::manager::CurrencyManager;
use kurzy::store::PgStore;
use kurzy::trend::TrendPanel;

#[derive(Parser)]
#[command(name = "kurzy", version, about = "Currency exchange rates")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Refresh trend constants and stored rates
    Update,
    /// Create the initial currency set
    Install,
    /// Serve the read API
    Serve,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:#}", e);
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> Result<()> {
    let config = Config::from_env()?;
    let store = Arc::new(PgStore::connect(&config.database_url).await?);
    let fetcher: Arc<dyn TextFetcher> = Arc::new(HttpFetcher::new());

    let manager = Arc::new(CurrencyManager::new(
        store.clone(),
        CnbFeed::new(fetcher.clone(), &config.cnb_url),
        config.cache_ttl,
    ));

    match command {
        Command::Update => {
            let job = UpdateJob::new(
                manager,
                CsobFeed::new(fetcher.clone(), &config.csob_url_template, &config.user_agent),
                CnbFeed::new(fetcher, &config.cnb_url),
                store,
                &config.trend_code,
            );
            job.run(Local::now().naive_local(), &mut io::stdout()).await?;
        }
        Command::Install => {
            let count = manager.install().await?;
            println!("Installed {} currencies", count);
        }
        Command::Serve => {
            let state = AppState {
                manager,
                constants: store,
                panel: TrendPanel::new(config.trend_fields),
            };
            api::serve(state, config.listen_addr).await?;
        }
    }

    Ok(())
}
