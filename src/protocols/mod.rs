//! Wire protocols spoken to the service under test.
//!
//! - `echo`: newline-delimited echo, the only protocol the load balancer
//!   backends speak today.

pub mod echo;
