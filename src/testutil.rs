//! Shared fixtures for tests: in-process responders and dialers.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use crate::dialer::{DialFuture, Dialer, TcpDialer};

/// Behaviour of a test responder.
#[derive(Debug, Clone, Copy)]
pub enum Responder {
    /// Echo every frame unchanged.
    Echo,
    /// Echo every frame with letters uppercased.
    Uppercase,
    /// Answer every frame with `#` bytes of the same length.
    Corrupt,
    /// Read frames and never answer.
    Silent,
    /// Echo the first `n` frames of each connection, then close it.
    EchoFrames(usize),
    /// Echo on the first `n` accepted connections, drop the rest at once.
    EchoFirstConnections(usize),
}

/// Bind a responder on a loopback port and return the port.
pub async fn spawn_responder(responder: Responder) -> u16 {
    spawn_tracked_responder(responder).await.0
}

/// Like [`spawn_responder`], also returning the number of connections the
/// client side has closed (EOF or reset seen by the responder).
pub async fn spawn_tracked_responder(responder: Responder) -> (u16, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let closed = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&closed);

    tokio::spawn(async move {
        let mut accepted = 0usize;
        while let Ok((stream, _)) = listener.accept().await {
            accepted += 1;
            if let Responder::EchoFirstConnections(n) = responder {
                if accepted > n {
                    drop(stream);
                    continue;
                }
            }
            tokio::spawn(serve(stream, responder, Arc::clone(&counter)));
        }
    });

    (port, closed)
}

async fn serve(stream: TcpStream, responder: Responder, closed: Arc<AtomicUsize>) {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut frame = Vec::new();
    let mut served = 0usize;

    loop {
        if let Responder::EchoFrames(n) = responder {
            if served == n {
                return;
            }
        }

        frame.clear();
        match reader.read_until(b'\n', &mut frame).await {
            Ok(0) | Err(_) => {
                closed.fetch_add(1, Ordering::SeqCst);
                return;
            }
            Ok(_) => {}
        }
        served += 1;

        let reply = match responder {
            Responder::Echo | Responder::EchoFrames(_) | Responder::EchoFirstConnections(_) => {
                frame.clone()
            }
            Responder::Uppercase => frame.to_ascii_uppercase(),
            Responder::Corrupt => {
                let mut reply = vec![b'#'; frame.len() - 1];
                reply.push(b'\n');
                reply
            }
            Responder::Silent => continue,
        };

        if writer.write_all(&reply).await.is_err() {
            closed.fetch_add(1, Ordering::SeqCst);
            return;
        }
    }
}

/// Wait until `counter` reaches `expected`, then return its value.
///
/// Gives up after a few seconds so a missing close fails the assertion
/// instead of hanging the test.
pub async fn settle(counter: &AtomicUsize, expected: usize) -> usize {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while counter.load(Ordering::SeqCst) < expected && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    // let any extra closes land before reporting
    tokio::time::sleep(Duration::from_millis(50)).await;
    counter.load(Ordering::SeqCst)
}

/// In-memory log sink for asserting on emitted lines.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Install as the thread's default subscriber until the guard drops.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_target(false)
            .with_max_level(tracing::Level::TRACE)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A loopback port with nothing listening on it.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// Loopback dialer that counts every dial attempt.
pub struct CountingDialer {
    inner: TcpDialer,
    dials: AtomicUsize,
}

impl CountingDialer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: TcpDialer::new("127.0.0.1", None),
            dials: AtomicUsize::new(0),
        })
    }

    pub fn dials(&self) -> usize {
        self.dials.load(Ordering::SeqCst)
    }
}

impl Dialer for CountingDialer {
    fn dial(&self, port: u16) -> DialFuture<'_> {
        self.dials.fetch_add(1, Ordering::SeqCst);
        self.inner.dial(port)
    }
}
