mod cli;

use reelforge::collaborators::CommandCollaborators;
use reelforge::config::{self, Config};
use reelforge::driver::{Driver, TickOutcome};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use rf_core::{Clock, RunOutcome, SystemClock};
use rf_pipeline::{Collaborators, PipelineContext, PipelineEngine, PipelineState};
use rf_schedule::AdmissionController;
use rf_store::{Housekeeper, StatsStore};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Everything a command needs, wired from one config.
struct App {
    config: Config,
    clock: Arc<dyn Clock>,
    controller: Arc<AdmissionController>,
    engine: Arc<PipelineEngine>,
    shutdown: CancellationToken,
}

impl App {
    fn new(config: Config) -> Result<Self> {
        let store = Arc::new(StatsStore::from_config(&config.storage));
        store.ensure_initialized()?;
        let controller = Arc::new(AdmissionController::new(config.schedule.clone(), store)?);

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let timeout = Duration::from_secs(config.pipeline.collaborator_timeout_secs);
        let collaborators =
            CommandCollaborators::new(config.collaborators.clone(), &config.storage.data_dir)
                .with_timeout(timeout);
        let shutdown = CancellationToken::new();
        let ctx = PipelineContext::new(Collaborators::from_shared(Arc::new(collaborators)))
            .with_clock(clock.clone())
            .with_call_timeout(timeout)
            .with_cancellation(shutdown.clone());

        Ok(Self {
            config,
            clock,
            controller,
            engine: Arc::new(PipelineEngine::new(ctx)),
            shutdown,
        })
    }

    fn driver(&self) -> Driver {
        Driver::new(
            self.controller.clone(),
            self.engine.clone(),
            self.config.pipeline.clone(),
            self.clock.clone(),
        )
        .with_shutdown(self.shutdown.clone())
        .with_housekeeper(Housekeeper::new(&self.config.storage))
    }

    /// Cancel the shared token on Ctrl-C so the current stage can finish.
    fn drain_on_ctrl_c(&self) {
        let token = self.shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupt received, finishing current stage");
                token.cancel();
            }
        });
    }

    fn record(&self, result: &rf_core::Result<PipelineState>) -> Result<RunOutcome> {
        let outcome = match result {
            Ok(state) => state.outcome(),
            Err(e) => RunOutcome::crashed(e),
        };
        self.controller.record_run(&outcome, self.clock.now())?;
        Ok(outcome)
    }
}

async fn start(app: App) -> Result<()> {
    tracing::info!("Starting reelforge scheduler");
    app.drain_on_ctrl_c();
    app.driver().run().await;
    Ok(())
}

async fn run_once(app: App, force: bool) -> Result<()> {
    app.drain_on_ctrl_c();

    if force {
        let config = app
            .controller
            .optimal_config(&app.config.pipeline, app.clock.now());
        let result = app.engine.run(&config).await;
        print_outcome(&app.record(&result)?);
        return Ok(());
    }

    match app.driver().tick().await? {
        TickOutcome::Skipped(reason) => println!("Not running: {reason}"),
        TickOutcome::Ran(outcome) => print_outcome(&outcome),
    }
    Ok(())
}

async fn run_batch(app: App, count: usize) -> Result<()> {
    app.drain_on_ctrl_c();

    let outcomes = app.driver().batch(count).await;
    let created = outcomes.iter().filter(|o| o.is_success()).count();
    println!("Batch complete: {created}/{count} videos created");
    Ok(())
}

fn print_outcome(outcome: &RunOutcome) {
    match (&outcome.video_path, &outcome.error) {
        (Some(path), None) => println!(
            "Created {} (rating {:.1}/10, {:.1}s)",
            path.display(),
            outcome.rating,
            outcome.processing_time_secs
        ),
        (_, Some(error)) => println!("Run {}: {error}", outcome.status),
        (None, None) => println!("Run {}", outcome.status),
    }
}

fn show_status(app: &App, json: bool, weekly: bool) -> Result<()> {
    let now = app.clock.now();
    if weekly {
        let summary = app.controller.weekly_summary(now);
        if json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            println!("{summary}");
        }
    } else {
        let status = app.controller.status(now);
        if json {
            println!("{}", serde_json::to_string_pretty(&status)?);
        } else {
            println!("{status}");
        }
    }
    Ok(())
}

fn show_config(config: &Config) -> Result<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

fn validate_config(path: Option<&std::path::Path>) -> Result<()> {
    let path = path.map(|p| p.to_path_buf()).or_else(config::find_config_file);
    let config = match &path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            config::load_config(p)?
        }
        None => {
            println!("No config file found, validating defaults");
            config::load_config_or_default(None)?
        }
    };

    println!("✓ Configuration is valid");
    println!(
        "  Schedule: every {}h, max {}/day, quiet {}",
        config.schedule.interval_hours, config.schedule.max_videos_per_day, config.schedule.quiet_hours
    );
    println!("  Sources: {}", config.pipeline.source_selectors.join(", "));
    println!("  Data dir: {}", config.storage.data_dir.display());

    let warnings = config.validate();
    if !warnings.is_empty() {
        println!("  Warnings:");
        for warning in warnings {
            println!("    - {warning}");
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "reelforge=trace,rf_pipeline=trace,rf_schedule=debug,rf_store=debug".to_string()
        } else {
            "reelforge=info,rf_pipeline=info,rf_schedule=info,rf_store=info".to_string()
        }
    });

    // Logs go to stderr so `status --json` output stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Start => {
            let app = App::new(config::load_config_or_default(cli.config.as_deref())?)?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start(app))
        }
        Commands::Once { force } => {
            let app = App::new(config::load_config_or_default(cli.config.as_deref())?)?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_once(app, force))
        }
        Commands::Batch { count } => {
            let app = App::new(config::load_config_or_default(cli.config.as_deref())?)?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_batch(app, count))
        }
        Commands::Status { json, weekly } => {
            let app = App::new(config::load_config_or_default(cli.config.as_deref())?)?;
            show_status(&app, json, weekly)
        }
        Commands::Config => show_config(&config::load_config_or_default(cli.config.as_deref())?),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("reelforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
