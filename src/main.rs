use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use console::Term;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use moviematch::backend::{BackendClient, TmdbClient};
use moviematch::cli::{Cli, Command};
use moviematch::config::MatchConfig;
use moviematch::engine::{SessionController, SessionState, Verdict};
use moviematch::pairing::PairingService;
use moviematch::ui::{self, TerminalPresenter};

type Session = SessionController<BackendClient, BackendClient, TerminalPresenter>;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = MatchConfig::load(cli.config.as_deref())?;
    config.apply_cli(cli.base_url, cli.low_water_mark, cli.max_retries);
    config.validate()?;

    let client = BackendClient::new(
        config.base_url.clone(),
        config.session_cookie.clone(),
        config.request_timeout(),
    )?;

    match cli.command {
        Command::Swipe => swipe(&config, client).await,
        Command::Connect { user_id } => {
            let pairing = PairingService::new(client, config.submit_retry());
            match pairing.connect(&user_id).await {
                Ok(partner) => ui::print_partner(Some(&partner)),
                Err(err) => ui::print_failure(&err.to_string()),
            }
            Ok(())
        }
        Command::Matches => {
            let mut pairing = PairingService::new(client, config.submit_retry());
            if let Some(key) = &config.tmdb_api_key {
                pairing = pairing.with_details(TmdbClient::new(
                    config.tmdb_url.clone(),
                    key.clone(),
                    config.tmdb_language.clone(),
                    config.request_timeout(),
                )?);
            }
            let presenter = TerminalPresenter::start();
            let result = pairing.refresh_matches(&presenter).await;
            presenter.finish();
            if let Err(err) = result {
                ui::print_failure(&err.to_string());
            }
            Ok(())
        }
        Command::Status => {
            println!("Server:          {}", config.base_url);
            let set = |v: &Option<String>| if v.is_some() { "set" } else { "not set" };
            println!("Session cookie:  {}", set(&config.session_cookie));
            println!("TMDB key:        {}", set(&config.tmdb_api_key));
            println!("Prefetch:        {} movie(s)", config.low_water_mark);
            println!(
                "Retries:         fetch {}x, submit {}x ({:?} backoff)",
                config.fetch_max_attempts, config.submit_max_attempts, config.backoff
            );
            let pairing = PairingService::new(client, config.submit_retry());
            match pairing.connection_status().await {
                Ok(partner) => ui::print_partner(partner.as_ref()),
                Err(err) => ui::print_failure(&err.to_string()),
            }
            Ok(())
        }
    }
}

// Logs go to stderr so they do not tear the cards on stdout.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

/// Interactive session: one key per action, decisions run as tasks so input
/// keeps flowing (and gets debounced) while a write is in flight.
async fn swipe(config: &MatchConfig, client: BackendClient) -> Result<()> {
    let session: Arc<Session> = Arc::new(SessionController::new(
        client.clone(),
        client,
        TerminalPresenter::start(),
        &config.engine_settings(),
    ));
    session.start().await?;

    let term = Term::stdout();
    loop {
        let key = {
            let term = term.clone();
            tokio::task::spawn_blocking(move || term.read_char()).await??
        };

        let verdict = match key.to_ascii_lowercase() {
            'l' => Some(Verdict::Like),
            'd' => Some(Verdict::Dislike),
            'r' => Some(Verdict::Recommend),
            'p' => {
                if session.is_paused() {
                    session.resume();
                } else {
                    session.pause();
                }
                session.presenter().paused(session.is_paused());
                None
            }
            't' => {
                if session.state() == SessionState::Error {
                    let session = Arc::clone(&session);
                    tokio::spawn(async move {
                        if let Err(err) = session.retry().await {
                            tracing::debug!(%err, "retry ignored");
                        }
                    });
                }
                None
            }
            'q' => break,
            _ => None,
        };

        if let Some(verdict) = verdict {
            let session = Arc::clone(&session);
            tokio::spawn(async move {
                session.on_decision(verdict).await;
            });
        }
    }

    session.stop();
    session.presenter().finish();
    Ok(())
}
