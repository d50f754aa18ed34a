//! Presence Agent - Presence and activity reporting for chat subjects.
//!
//! This library observes status and activity changes for a roster of
//! subjects, aggregates them into human-readable transition reports, and
//! delivers those reports through pluggable log sinks.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       Presence Agent                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌────────────┐   ┌─────────────┐   ┌─────────────────────┐  │
//! │  │   Events   │──▶│ Aggregator  │──▶│     Split Sink      │  │
//! │  │  (stdin)   │   │(transitions)│   │ reports│diagnostics │  │
//! │  └────────────┘   └─────────────┘   └─────────┬───────────┘  │
//! │                          │                    │              │
//! │                          ▼                    ▼              │
//! │                   ┌────────────┐     ┌───────────────┐       │
//! │                   │ Scheduler  │     │ Local / Remote│       │
//! │                   │(day ticks) │     │     files     │       │
//! │                   └────────────┘     └───────────────┘       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use presence_agent::aggregator::{PresenceAggregator, SubjectSnapshot};
//! use presence_agent::sink::ConsoleSink;
//!
//! let sink = Arc::new(ConsoleSink::new());
//! let mut aggregator = PresenceAggregator::new(sink);
//! aggregator
//!     .init(&[SubjectSnapshot::unknown("alice")])
//!     .expect("empty roster");
//! ```

pub mod aggregator;
pub mod clock;
pub mod config;
pub mod event;
pub mod remote;
pub mod scheduler;
pub mod sink;
pub mod watchdog;

// Re-export key types at crate root for convenience
pub use aggregator::{PresenceAggregator, RosterError, Status, SubjectSnapshot};
pub use clock::Timestamped;
pub use config::{Config, ConfigError, RemoteSettings};
pub use event::{ParseError, PresenceEvent};
pub use remote::{BlockingRemoteClient, RemoteClient, RemoteConfig, RemoteError, RemoteTransport};
pub use scheduler::{CallbackId, Scheduler, SchedulerError};
pub use sink::{LogCategory, LogSink};
pub use watchdog::{TimeoutTarget, Watchdog};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
