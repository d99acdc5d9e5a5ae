//! Logging context carried through every probe.

use std::sync::Arc;

/// Identifies the application and port a log line belongs to.
///
/// Cloned into each concurrent task so lines from parallel probes keep
/// their attribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeContext {
    pub app: Arc<str>,
    pub port: u16,
}

impl ProbeContext {
    pub fn new(app: impl Into<Arc<str>>, port: u16) -> Self {
        Self {
            app: app.into(),
            port,
        }
    }
}
