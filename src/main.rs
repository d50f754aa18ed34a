//! Presence Agent CLI
//!
//! Observes presence events on stdin and writes daily transition reports.

use clap::{Parser, Subcommand};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use presence_agent::{
    aggregator::{PresenceAggregator, SubjectSnapshot},
    config::Config,
    event::{ParseError, PresenceEvent},
    remote::{BlockingRemoteClient, RemoteConfig},
    scheduler::Scheduler,
    sink::{remote::RemoteSink, LocalFileSink, LogCategory, LogSink, SplitSink},
    VERSION,
};

#[derive(Parser)]
#[command(name = "presence-agent")]
#[command(version = VERSION)]
#[command(about = "Presence and activity reporting agent", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start observing presence events from stdin
    Run {
        /// Configuration file (defaults to the per-user config path)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Subject to track from startup; repeatable, merged with the
        /// configured roster
        #[arg(long = "subject")]
        subjects: Vec<String>,

        /// Ignore configured remote credentials and keep all reports local
        #[arg(long)]
        local_only: bool,
    },

    /// Show configuration
    Config,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            subjects,
            local_only,
        } => {
            cmd_run(config, subjects, local_only);
        }
        Commands::Config => {
            cmd_config();
        }
    }
}

fn cmd_run(config_path: Option<PathBuf>, extra_subjects: Vec<String>, local_only: bool) {
    println!("Presence Agent v{VERSION}");
    println!();

    let config = match config_path {
        Some(path) => Config::load_from(&path),
        None => Config::load(),
    }
    .unwrap_or_else(|e| {
        eprintln!("Warning: could not load config, using defaults: {e}");
        Config::default()
    });

    if let Err(e) = config.ensure_directories() {
        eprintln!("Error: could not create report directory: {e}");
        std::process::exit(1);
    }

    let mut subjects = config.subjects.clone();
    subjects.extend(extra_subjects);
    subjects.sort();
    subjects.dedup();

    let local = Arc::new(LocalFileSink::new(config.local_root.clone()));

    let sink: Arc<dyn LogSink> = match (&config.remote, local_only) {
        (Some(settings), false) => {
            let remote_config = RemoteConfig::new(
                settings.host.clone(),
                settings.username.clone(),
                settings.password.clone(),
            );
            match BlockingRemoteClient::new(remote_config) {
                Ok(client) => {
                    println!("  Remote store: {}", settings.host);
                    let remote = RemoteSink::with_idle_timeout(
                        Box::new(client),
                        config.idle_timeout,
                    );
                    Arc::new(SplitSink::new(Arc::new(remote), local.clone()))
                }
                Err(e) => {
                    eprintln!("Warning: remote store unavailable, reporting locally: {e}");
                    local.clone()
                }
            }
        }
        _ => {
            println!("  Remote store: disabled");
            local.clone()
        }
    };

    println!("  Report root: {:?}", config.local_root);
    println!("  Subjects: {}", subjects.len());
    println!();
    println!("Reading events from stdin. Press Ctrl+C to stop");
    println!();

    let aggregator = Arc::new(Mutex::new(PresenceAggregator::new(sink)));

    let roster: Vec<SubjectSnapshot> = subjects
        .iter()
        .map(|id| SubjectSnapshot::unknown(id.as_str()))
        .collect();
    if let Err(e) = aggregator.lock().unwrap().init(&roster) {
        eprintln!("Warning: {e}; subjects will be adopted as observed");
    }

    // Day rollover flushes the ending day and re-dates the sinks.
    let mut scheduler = Scheduler::with_periods(config.tick_period, config.tick_tolerance);
    let rollover_aggregator = aggregator.clone();
    scheduler.add_day_callback(move || {
        rollover_aggregator.lock().unwrap().rollover();
    });
    if let Err(e) = scheduler.start() {
        eprintln!("Error starting scheduler: {e}");
        std::process::exit(1);
    }

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");

    // stdin is read on its own thread so the main loop can keep observing
    // the shutdown flag while no events arrive.
    let (line_tx, line_rx) = crossbeam_channel::unbounded::<String>();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if line_tx.send(line).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });

    while running.load(Ordering::SeqCst) {
        match line_rx.recv_timeout(Duration::from_millis(100)) {
            Ok(line) => {
                dispatch_line(&aggregator, &line);
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                // stdin closed; flush what we have and stop.
                break;
            }
        }
    }

    println!();
    println!("Stopping...");
    scheduler.stop();
    aggregator.lock().unwrap().flush();
}

fn dispatch_line(aggregator: &Arc<Mutex<PresenceAggregator>>, line: &str) {
    match PresenceEvent::parse_line(line) {
        Ok(PresenceEvent::Status { subject, status }) => {
            aggregator.lock().unwrap().on_status_change(&subject, status);
        }
        Ok(PresenceEvent::Activity { subject, activity }) => {
            aggregator
                .lock()
                .unwrap()
                .on_activity_change(&subject, activity);
        }
        Ok(PresenceEvent::DirectMessage { sender, body }) => {
            aggregator.lock().unwrap().add_direct_message(&sender, &body);
        }
        Err(ParseError::EmptyLine) => {}
        Err(e) => {
            tracing::warn!("ignoring malformed event line: {e}");
            aggregator
                .lock()
                .unwrap()
                .add_debug_line(LogCategory::Warning, &format!("malformed event: {e}"));
        }
    }
}

fn cmd_config() {
    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}
