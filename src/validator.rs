//! Port and application validation.
//!
//! Each port goes through a fixed sequence of checks and stops at the first
//! one that fails:
//!
//! ```text
//! Connect -> ShortText -> LongText -> Binary -> ConcurrentBatch -> SequentialBatch -> PASS
//!    |           |           |          |             |                  |
//!    +-----------+-----------+----------+-------------+------------------+----> FAIL
//! ```
//!
//! The three single-shot probes share the connection opened by `Connect`;
//! it is closed before the batches start. The batches dial their own
//! connections.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::batch::BatchRunner;
use crate::config::AppConfig;
use crate::context::ProbeContext;
use crate::dialer::Dialer;
use crate::payload::{generate_binary_excluding, generate_text};
use crate::protocols::echo::frame::DELIM;
use crate::protocols::echo::probe;

/// Short text payload size
pub const SHORT_TEXT_SIZE: usize = 100;

/// Long text payload size (64 KiB)
pub const LONG_TEXT_SIZE: usize = 64 * 1024;

/// Binary payload size
pub const BINARY_SIZE: usize = 200;

/// Checks run against every port, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    Connect,
    ShortText,
    LongText,
    Binary,
    ConcurrentBatch,
    SequentialBatch,
}

impl Check {
    pub fn label(&self) -> &'static str {
        match self {
            Check::Connect => "connect",
            Check::ShortText => "short_text",
            Check::LongText => "long_text",
            Check::Binary => "binary",
            Check::ConcurrentBatch => "concurrent_connections",
            Check::SequentialBatch => "sequential_connections",
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Final judgement for one port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortVerdict {
    pub port: u16,
    pub passed: bool,
    /// First check that failed, if any
    pub failed_check: Option<Check>,
}

/// Outcome of validating one application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppReport {
    pub name: String,
    /// Set when the application has no ports configured
    pub skipped: bool,
    pub verdicts: Vec<PortVerdict>,
}

impl AppReport {
    pub fn passed(&self) -> usize {
        self.verdicts.iter().filter(|v| v.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.verdicts.len() - self.passed()
    }
}

/// Outcome of a whole run, one report per application in config order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub apps: Vec<AppReport>,
}

impl RunReport {
    pub fn ports_passed(&self) -> usize {
        self.apps.iter().map(AppReport::passed).sum()
    }

    pub fn ports_failed(&self) -> usize {
        self.apps.iter().map(AppReport::failed).sum()
    }

    pub fn apps_skipped(&self) -> usize {
        self.apps.iter().filter(|app| app.skipped).count()
    }
}

/// Drives the checks for every configured application.
pub struct Validator {
    dialer: Arc<dyn Dialer>,
    batches: BatchRunner,
    timeout: Option<Duration>,
}

impl Validator {
    pub fn new(dialer: Arc<dyn Dialer>, timeout: Option<Duration>) -> Self {
        let batches = BatchRunner::new(Arc::clone(&dialer), timeout);
        Self {
            dialer,
            batches,
            timeout,
        }
    }

    /// Validate every application in order.
    pub async fn validate_all(&self, apps: &[AppConfig]) -> RunReport {
        let mut report = RunReport {
            apps: Vec::with_capacity(apps.len()),
        };
        for app in apps {
            report.apps.push(self.validate_app(app).await);
        }
        report
    }

    /// Validate each port of `app` in order. A failing port does not stop
    /// the ones after it.
    pub async fn validate_app(&self, app: &AppConfig) -> AppReport {
        info!(app = %app.name, ports = ?app.ports, targets = ?app.targets, "started processing");

        if app.ports.is_empty() {
            warn!(app = %app.name, "no ports in application configuration, skipping");
            return AppReport {
                name: app.name.clone(),
                skipped: true,
                verdicts: Vec::new(),
            };
        }

        let name: Arc<str> = Arc::from(app.name.as_str());
        let mut verdicts = Vec::with_capacity(app.ports.len());
        for &port in &app.ports {
            let ctx = ProbeContext::new(Arc::clone(&name), port);
            verdicts.push(self.validate_port(&ctx).await);
        }

        AppReport {
            name: app.name.clone(),
            skipped: false,
            verdicts,
        }
    }

    /// Run the full check sequence against one port.
    pub async fn validate_port(&self, ctx: &ProbeContext) -> PortVerdict {
        match self.run_checks(ctx).await {
            Ok(()) => {
                info!(app = %ctx.app, port = ctx.port, "OK");
                PortVerdict {
                    port: ctx.port,
                    passed: true,
                    failed_check: None,
                }
            }
            Err(check) => {
                warn!(app = %ctx.app, port = ctx.port, check = %check, "FAIL");
                PortVerdict {
                    port: ctx.port,
                    passed: false,
                    failed_check: Some(check),
                }
            }
        }
    }

    async fn run_checks(&self, ctx: &ProbeContext) -> Result<(), Check> {
        self.run_single_shots(ctx).await?;

        let concurrent = self.batches.run_concurrent(ctx).await;
        if !concurrent.passed() {
            warn!(
                app = %ctx.app,
                port = ctx.port,
                succeeded = concurrent.succeeded,
                attempted = concurrent.attempted,
                "FAIL: {}",
                Check::ConcurrentBatch
            );
            return Err(Check::ConcurrentBatch);
        }

        let sequential = self.batches.run_sequential(ctx).await;
        if !sequential.passed() {
            warn!(
                app = %ctx.app,
                port = ctx.port,
                succeeded = sequential.succeeded,
                attempted = sequential.attempted,
                "FAIL: {}",
                Check::SequentialBatch
            );
            return Err(Check::SequentialBatch);
        }

        Ok(())
    }

    /// Short text, long text and binary probes over one connection. The
    /// connection is dropped when this returns.
    async fn run_single_shots(&self, ctx: &ProbeContext) -> Result<(), Check> {
        let mut stream = match self.dialer.dial(ctx.port).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(
                    app = %ctx.app,
                    port = ctx.port,
                    reason = %e,
                    "FAIL: failed to establish connection on port"
                );
                return Err(Check::Connect);
            }
        };

        info!(app = %ctx.app, port = ctx.port, action = Check::Connect.label(), "OK");

        let short = generate_text(SHORT_TEXT_SIZE);
        self.single_shot(ctx, &mut stream, Check::ShortText, short.as_bytes())
            .await?;

        let long = generate_text(LONG_TEXT_SIZE);
        self.single_shot(ctx, &mut stream, Check::LongText, long.as_bytes())
            .await?;

        let binary = generate_binary_excluding(BINARY_SIZE, DELIM);
        self.single_shot(ctx, &mut stream, Check::Binary, &binary)
            .await?;

        Ok(())
    }

    async fn single_shot(
        &self,
        ctx: &ProbeContext,
        stream: &mut TcpStream,
        check: Check,
        payload: &[u8],
    ) -> Result<(), Check> {
        let outcome = probe(ctx, check.label(), payload, stream, self.timeout).await;
        if outcome.success {
            return Ok(());
        }
        debug!(
            app = %ctx.app,
            port = ctx.port,
            action = outcome.action,
            "skipping remaining checks for port"
        );
        Err(check)
    }
}

/// Log one summary line per application, then the run totals.
pub fn log_summary(run: &RunReport) {
    for report in &run.apps {
        if report.skipped {
            info!(app = %report.name, "summary: skipped, no ports");
        } else if report.failed() == 0 {
            info!(app = %report.name, passed = report.passed(), "summary: all ports OK");
        } else {
            let failed: Vec<u16> = report
                .verdicts
                .iter()
                .filter(|v| !v.passed)
                .map(|v| v.port)
                .collect();
            warn!(
                app = %report.name,
                passed = report.passed(),
                failed = report.failed(),
                failed_ports = ?failed,
                "summary: some ports FAILED"
            );
        }
    }

    info!(
        apps = run.apps.len(),
        skipped = run.apps_skipped(),
        ports_passed = run.ports_passed(),
        ports_failed = run.ports_failed(),
        "run finished"
    );
}
