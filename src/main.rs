use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use incident_meetings::bot::HeadlessChromeFactory;
use incident_meetings::invite::{InviteDispatcher, InviteTransport, SmtpInviteTransport};
use incident_meetings::{create_router, AppState, Config, Orchestrator, SessionRegistry};
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "incident-meetings", about = "Sev-1 incident meeting orchestrator")]
struct Args {
    /// Path to the configuration file (extension optional)
    #[arg(long, default_value = "config/incident-meetings")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;
    info!(service = %cfg.service.name, "starting incident meeting orchestrator");

    let transport = SmtpInviteTransport::from_config(&cfg.smtp, &cfg.invites.organizer_name)?
        .map(|t| Arc::new(t) as Arc<dyn InviteTransport>);
    if transport.is_none() {
        warn!("smtp credentials not configured, invites will be skipped");
    }
    let organizer_address = cfg.smtp.username.clone().unwrap_or_default();
    let invites = Arc::new(InviteDispatcher::new(
        transport,
        cfg.invites.organizer_name.clone(),
        organizer_address,
        cfg.invites.window_minutes,
    ));

    let drivers = Arc::new(HeadlessChromeFactory::discover());
    let registry = Arc::new(SessionRegistry::new());
    let orchestrator = Arc::new(Orchestrator::new(
        &cfg,
        Arc::clone(&registry),
        drivers,
        invites,
    ));

    let app = create_router(AppState::new(orchestrator, Arc::clone(&registry)));
    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(addr = %addr, "listening for incident webhooks");
    axum::serve(listener, app).await?;

    Ok(())
}
