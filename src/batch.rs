//! Load patterns: batches of probes, each over its own fresh connection.
//!
//! - Concurrent: [`CONCURRENT_ATTEMPTS`] tasks dial and probe in parallel.
//! - Sequential: [`SEQUENTIAL_ATTEMPTS`] dial/probe/close rounds, one after
//!   another.
//!
//! A batch passes when at least [`PASS_THRESHOLD`] probes succeed. A failed
//! dial or probe only lowers the count; the batch always runs to the end.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::context::ProbeContext;
use crate::dialer::Dialer;
use crate::payload::generate_text;
use crate::protocols::echo::probe;

/// Number of probes in the concurrent batch
pub const CONCURRENT_ATTEMPTS: usize = 10;

/// Number of probes in the sequential batch
pub const SEQUENTIAL_ATTEMPTS: usize = 11;

/// Successes required for a batch to pass
pub const PASS_THRESHOLD: usize = 5;

/// Text payload size used by every batch probe
pub const BATCH_PAYLOAD_SIZE: usize = 100;

/// Tally of one batch run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchResult {
    pub attempted: usize,
    pub succeeded: usize,
}

impl BatchResult {
    pub fn passed(&self) -> bool {
        self.succeeded >= PASS_THRESHOLD
    }
}

/// Runs the batch patterns against one port
#[derive(Clone)]
pub struct BatchRunner {
    dialer: Arc<dyn Dialer>,
    timeout: Option<Duration>,
}

impl BatchRunner {
    pub fn new(dialer: Arc<dyn Dialer>, timeout: Option<Duration>) -> Self {
        Self { dialer, timeout }
    }

    /// Launch all probes at once and wait for every one of them.
    pub async fn run_concurrent(&self, ctx: &ProbeContext) -> BatchResult {
        let mut tasks = JoinSet::new();

        for _ in 0..CONCURRENT_ATTEMPTS {
            let dialer = Arc::clone(&self.dialer);
            let ctx = ctx.clone();
            let timeout = self.timeout;
            tasks.spawn(async move {
                probe_fresh_connection(dialer.as_ref(), &ctx, "concurrent_conn", timeout).await
            });
        }

        let mut succeeded = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(true) => succeeded += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(app = %ctx.app, port = ctx.port, reason = %e, "FAIL: concurrent_conn task aborted");
                }
            }
        }

        let result = BatchResult {
            attempted: CONCURRENT_ATTEMPTS,
            succeeded,
        };
        info!(
            app = %ctx.app,
            port = ctx.port,
            succeeded = result.succeeded,
            attempted = result.attempted,
            "concurrent batch finished"
        );
        result
    }

    /// Dial, probe and close one connection at a time.
    pub async fn run_sequential(&self, ctx: &ProbeContext) -> BatchResult {
        let mut succeeded = 0;

        for _ in 0..SEQUENTIAL_ATTEMPTS {
            if probe_fresh_connection(self.dialer.as_ref(), ctx, "sequential_conn", self.timeout)
                .await
            {
                succeeded += 1;
            }
        }

        let result = BatchResult {
            attempted: SEQUENTIAL_ATTEMPTS,
            succeeded,
        };
        info!(
            app = %ctx.app,
            port = ctx.port,
            succeeded = result.succeeded,
            attempted = result.attempted,
            "sequential batch finished"
        );
        result
    }
}

/// Dial a new connection, run one text probe over it and drop it.
async fn probe_fresh_connection(
    dialer: &dyn Dialer,
    ctx: &ProbeContext,
    action: &'static str,
    timeout: Option<Duration>,
) -> bool {
    let mut stream = match dialer.dial(ctx.port).await {
        Ok(stream) => stream,
        Err(e) => {
            warn!(app = %ctx.app, port = ctx.port, action, reason = %e, "FAIL: connect");
            return false;
        }
    };

    let payload = generate_text(BATCH_PAYLOAD_SIZE);
    probe(ctx, action, payload.as_bytes(), &mut stream, timeout)
        .await
        .success
}
