//! reverb: a concurrent uppercase-reverse echo server and client.
//!
//! The server accepts any number of simultaneous connections and runs
//! one handler task per connection: read whatever bytes are available
//! (up to a cap), uppercase and reverse the text, write it back. The
//! client drives the same protocol interactively, one message per line
//! of input.
//!
//! Features:
//! - Backpressure-aware buffered I/O (enqueue never blocks, drain
//!   suspends until the transport has capacity)
//! - Fully independent per-connection progress; one slow peer never
//!   stalls another
//! - Transport-generic connections, so encrypted or in-memory streams
//!   compose without handler changes
//! - Configuration via CLI arguments or TOML file

pub mod client;
pub mod config;
pub mod connection;
pub mod delay;
pub mod handler;
pub mod reader;
pub mod server;
pub mod transform;
pub mod writer;
