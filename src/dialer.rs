//! Connection establishment.
//!
//! Every probe in a batch dials its own connection through a [`Dialer`], so
//! the validators never hold on to a socket longer than one probe needs.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::trace;

/// Future returned by [`Dialer::dial`].
pub type DialFuture<'a> = Pin<Box<dyn Future<Output = io::Result<TcpStream>> + Send + 'a>>;

/// Opens a fresh connection to a port on the host under test.
pub trait Dialer: Send + Sync {
    fn dial(&self, port: u16) -> DialFuture<'_>;
}

/// Dials `host:port` over TCP.
#[derive(Debug, Clone)]
pub struct TcpDialer {
    host: String,
    timeout: Option<Duration>,
}

impl TcpDialer {
    pub fn new(host: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            host: host.into(),
            timeout,
        }
    }
}

impl Dialer for TcpDialer {
    fn dial(&self, port: u16) -> DialFuture<'_> {
        Box::pin(async move {
            let stream = with_timeout(
                self.timeout,
                TcpStream::connect((self.host.as_str(), port)),
            )
            .await?;
            stream.set_nodelay(true)?;
            trace!(host = %self.host, port, "Connected");
            Ok(stream)
        })
    }
}

/// Run `fut`, failing with `TimedOut` once `limit` elapses.
///
/// `None` waits forever.
pub async fn with_timeout<F, T>(limit: Option<Duration>, fut: F) -> io::Result<T>
where
    F: Future<Output = io::Result<T>>,
{
    match limit {
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("timed out after {}ms", limit.as_millis()),
            )),
        },
        None => fut.await,
    }
}
