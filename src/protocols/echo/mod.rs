//! Echo protocol client.
//!
//! The service under test is expected to echo every frame it receives:
//!
//! ```text
//! Request:  <payload bytes>\n
//! Response: <payload bytes>\n
//!
//! Example:
//! Request:  helloWorld\n
//! Response: HELLOWORLD\n   (accepted: letters compare case-insensitively)
//! ```
//!
//! Payloads are not escaped. A binary payload containing `\n` ends the frame
//! early, so the echo read back is shorter than what was sent and the probe
//! fails.

pub mod frame;
pub mod prober;

pub use prober::probe;
