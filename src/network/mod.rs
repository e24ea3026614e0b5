//! Network Infrastructure
//!
//! Framing of discrete messages over a single TCP stream.
pub(crate) mod connection;
pub(crate) mod utility;
pub use connection::{Conn, ConnectionError, Received};
