/// Intake API - Pub/Sub push webhook for client intake forms
///
/// Acknowledges every push delivery immediately and runs profile generation
/// and report delivery in the background.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use interior_intake::report::{ReportSender, UnconfiguredSender};
use interior_intake::{
    start_server, AppState, BackgroundDispatcher, GeminiProfileGenerator, Normalizer, Pipeline,
    ServiceConfig, SmtpReportSender,
};

#[derive(Parser)]
#[command(name = "intake-api")]
#[command(about = "Pub/Sub push webhook for interior design client intake", long_about = None)]
#[command(version)]
struct Cli {
    /// Address to bind (overrides HOST)
    #[arg(long)]
    host: Option<IpAddr>,

    /// Port to listen on (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Env file loaded before reading configuration
    #[arg(long, default_value = ".env")]
    env_file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // A missing env file is fine; the process environment may carry everything
    let env_file_loaded = dotenv::from_path(&cli.env_file).is_ok();

    let config = ServiceConfig::from_env()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "interior_intake={0},intake_api={0},tower_http=info",
            config.log_level
        ))
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    if env_file_loaded {
        tracing::info!("Loaded environment from {}", cli.env_file.display());
    }
    tracing::info!(
        "Starting {} v{} ({})",
        config.app_name,
        env!("CARGO_PKG_VERSION"),
        config.environment
    );

    let schema = config.load_form_schema()?;
    tracing::info!(
        "Form schema: {} positional column(s), sequence field '{}'",
        schema.columns.len(),
        schema.sequence_field
    );

    if !config.genai_ready() {
        tracing::warn!("GEMINI_API_KEY is not set; profile generation will fail until it is");
    }
    let generator = Arc::new(GeminiProfileGenerator::new(config.genai.clone())?);

    let sender: Arc<dyn ReportSender> = match SmtpReportSender::new(&config.smtp) {
        Ok(sender) => Arc::new(sender),
        Err(e) => {
            tracing::warn!("Email delivery disabled: {}", e);
            Arc::new(UnconfiguredSender)
        }
    };

    let pipeline = Pipeline::new(generator, sender, config.designer_email.clone())
        .with_email_retry(config.email_max_attempts, config.retry_delay);
    let dispatcher = Arc::new(BackgroundDispatcher::new(pipeline));

    let host = match cli.host {
        Some(host) => host,
        None => config.host.parse()?,
    };
    let addr = SocketAddr::new(host, cli.port.unwrap_or(config.port));

    tracing::info!(
        "Retry cap: {} delivery attempt(s) per message id",
        config.max_endpoint_retries
    );

    let state = Arc::new(AppState::new(config, Normalizer::new(schema), dispatcher));
    start_server(state, addr).await?;

    Ok(())
}
