use anyhow::Result;
use clap::Parser;
use indexping::blog::BlogClient;
use indexping::config::Config;
use indexping::indexing::IndexingSession;
use indexping::model::RunResult;
use indexping::report::SmtpMailer;
use indexping::{db, run};
use tracing::error;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// SQLite database URL (falls back to DATABASE_URL, then a local file)
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(err) => {
            error!(%err, "configuration error");
            println!(
                "{}",
                serde_json::to_string(&RunResult::config_error(err.to_string()))?
            );
            std::process::exit(1);
        }
    };

    let database_url = args
        .database_url
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| "sqlite://data/indexping.db".to_string());

    let pool = db::init_pool(&database_url).await?;
    db::run_migrations(&pool).await?;

    let blog = BlogClient::new(cfg.api_key.clone());
    let session = IndexingSession::new(&cfg.api_key)?;
    let mailer = SmtpMailer::new(&cfg);

    let outcomes = run::execute(&cfg, &pool, &blog, &session, &mailer).await?;
    println!(
        "{}",
        serde_json::to_string(&RunResult::completed(outcomes))?
    );
    Ok(())
}
