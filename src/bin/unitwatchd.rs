//! unitwatchd - systemd unit metrics daemon.
//!
//! Loads a check configuration file, builds one `systemd` check per instance
//! and runs each instance on its own collection interval. Metrics are written
//! to the log.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use clap::Parser;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

use unitwatch::check::systemd::{self, CHECK_NAME};
use unitwatch::check::{Check, CheckCatalog, CheckConfigFile};
use unitwatch::collector::{ManagerScope, Systemctl};
use unitwatch::collector::systemctl::DEFAULT_SYSTEMCTL;
use unitwatch::sender::{Aggregator, LogSink};

/// Systemd unit metrics daemon.
#[derive(Parser)]
#[command(name = "unitwatchd", about = "Systemd unit metrics daemon", version)]
struct Args {
    /// Check configuration file with `init_config` and `instances`.
    #[arg(short, long, default_value = "/etc/unitwatch/systemd.yaml")]
    config: PathBuf,

    /// Path to the systemctl binary.
    #[arg(long, default_value = DEFAULT_SYSTEMCTL)]
    systemctl: PathBuf,

    /// Query the calling user's service manager instead of the system one.
    #[arg(long)]
    user: bool,

    /// Run every instance once and exit. Exit status is non-zero if any run failed.
    #[arg(long)]
    once: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Initializes the tracing subscriber with the appropriate log level.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = [
        format!("unitwatchd={}", level),
        format!("unitwatch={}", level),
    ]
    .iter()
    .filter_map(|directive| directive.parse::<Directive>().ok())
    .fold(EnvFilter::from_default_env(), |filter, directive| {
        filter.add_directive(directive)
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// A configured check and the time it is due next.
struct Scheduled {
    check: Box<dyn Check>,
    next_run: Instant,
}

impl Scheduled {
    /// Runs the check and schedules the next tick. Returns `false` on failure.
    fn tick(&mut self) -> bool {
        let start = Instant::now();
        let result = self.check.run();
        self.next_run = start + self.check.interval();

        match result {
            Ok(()) => {
                debug!(check = %self.check.id(), elapsed = ?start.elapsed(), "check run complete");
                true
            }
            Err(e) => {
                error!(check = %self.check.id(), error = %e, "check run failed");
                false
            }
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    info!("unitwatchd {} starting", env!("CARGO_PKG_VERSION"));

    let file = match CheckConfigFile::load(&args.config) {
        Ok(file) => file,
        Err(e) => {
            error!("Failed to load {}: {}", args.config.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let scope = if args.user {
        ManagerScope::User
    } else {
        ManagerScope::System
    };
    let manager = Systemctl::new(&args.systemctl).with_scope(scope);
    info!(
        "Config: file={}, instances={}, systemctl={}, scope={:?}",
        args.config.display(),
        file.instances.len(),
        manager.binary().display(),
        scope
    );

    let aggregator = Arc::new(Aggregator::new(Arc::new(LogSink)));
    let mut catalog = CheckCatalog::new();
    systemd::register(&mut catalog, manager, aggregator.clone());

    let now = Instant::now();
    let mut checks = Vec::new();
    for (index, instance) in file.instances.iter().enumerate() {
        match catalog.load(CHECK_NAME, instance, &file.init_config) {
            Ok(check) => {
                info!(
                    "Instance #{}: {} every {:?}",
                    index,
                    check.id(),
                    check.interval()
                );
                checks.push(Scheduled {
                    check,
                    next_run: now,
                });
            }
            Err(e) => error!("Instance #{}: configuration rejected: {}", index, e),
        }
    }

    if checks.is_empty() {
        error!("No usable check instances");
        return ExitCode::FAILURE;
    }

    if args.once {
        let failures = checks.iter_mut().map(|s| s.tick()).filter(|ok| !ok).count();
        aggregator.close();
        return if failures == 0 {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        };
    }

    // Setup graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    info!("Starting collection loop");

    while running.load(Ordering::SeqCst) {
        let now = Instant::now();
        for scheduled in checks.iter_mut().filter(|s| s.next_run <= now) {
            scheduled.tick();
        }

        let next = checks
            .iter()
            .map(|s| s.next_run)
            .min()
            .unwrap_or_else(|| Instant::now() + Duration::from_secs(1));

        // Sleep with periodic checks for shutdown signal
        let sleep_interval = Duration::from_millis(100);
        while running.load(Ordering::SeqCst) {
            let remaining = next.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            std::thread::sleep(remaining.min(sleep_interval));
        }
    }

    info!("Shutting down...");
    for scheduled in &checks {
        aggregator.close_sender(scheduled.check.id());
    }
    aggregator.close();
    info!("Shutdown complete");

    ExitCode::SUCCESS
}
