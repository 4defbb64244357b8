use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use jobscout_app::logging::{self, LogDestination};
use jobscout_app::render::{summary, SearchOutcome, TerminalObserver};
use jobscout_app::{ScoutConfig, SessionController};
use jobscout_core::ConnectionState;
use jobscout_engine::{EngineHandle, RELEASE_GRACE};
use jobscout_logging::{scout_info, scout_warn};
use log::LevelFilter;

type Controller = SessionController<EngineHandle, TerminalObserver<io::Stdout>>;

const POLL: Duration = Duration::from_millis(100);
/// Slack on top of the release grace for the engine thread to wind down.
const SHUTDOWN_SLACK: Duration = Duration::from_millis(500);

/// Search job boards through a jobscout service and stream the listings.
#[derive(Debug, Parser)]
#[command(name = "jobscout", version)]
struct Cli {
    /// Keywords to search for.
    #[arg(required = true)]
    keywords: Vec<String>,

    /// RON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use the single-response endpoint instead of the push channel.
    #[arg(long)]
    bulk: bool,

    /// Give up after this many seconds.
    #[arg(long, default_value_t = 600)]
    timeout_secs: u64,

    /// Where log output goes; overrides the config file.
    #[arg(long, value_enum)]
    log: Option<LogDestination>,

    /// Log at debug level.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ScoutConfig::load_or_default(cli.config.as_deref())
        .context("loading configuration")?;

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    logging::initialize(cli.log.unwrap_or(config.log), level);

    let keywords = cli.keywords.join(" ");
    let engine = EngineHandle::new(config.channel_settings(), config.command_settings());
    let observer = TerminalObserver::new(io::stdout(), !cli.bulk);
    let mut controller =
        SessionController::new(engine, observer).with_reconnect(config.reconnect_policy());
    let deadline = Instant::now() + Duration::from_secs(cli.timeout_secs);

    if cli.bulk {
        controller
            .search_bulk(&keywords)
            .context("submitting bulk search")?;
    } else {
        controller.open();
        wait_until(&mut controller, deadline, |controller| {
            controller.state().connection() != ConnectionState::Connecting
        });
        if controller.state().connection() != ConnectionState::Connected {
            bail!("could not connect to {}", config.base_url);
        }
        if let Err(err) = controller.submit_keywords(&keywords) {
            teardown(&mut controller);
            return Err(err).context("submitting search");
        }
    }
    scout_info!("searching for {:?}", keywords);

    wait_until(&mut controller, deadline, |controller| {
        match controller.observer().outcome() {
            SearchOutcome::Running => false,
            SearchOutcome::Aborted => !controller.reconnect_pending(),
            SearchOutcome::Completed | SearchOutcome::Failed => true,
        }
    });

    let outcome = controller.observer().outcome();
    let view = controller.view();
    teardown(&mut controller);

    match outcome {
        SearchOutcome::Completed => {
            println!("{}", summary(&view));
            Ok(())
        }
        SearchOutcome::Failed => bail!("search could not be started"),
        SearchOutcome::Aborted | SearchOutcome::Running => {
            println!("{}", summary(&view));
            bail!("search did not complete")
        }
    }
}

/// Ends the session and gives its release a bounded chance to reach the server.
fn teardown(controller: &mut Controller) {
    controller.disconnect();
    if !controller.backend().shutdown(RELEASE_GRACE + SHUTDOWN_SLACK) {
        scout_warn!("session release may not have reached the server");
    }
}

fn wait_until<F>(controller: &mut Controller, deadline: Instant, done: F)
where
    F: Fn(&Controller) -> bool,
{
    while !done(controller) && Instant::now() < deadline {
        controller.wait(POLL);
    }
}
