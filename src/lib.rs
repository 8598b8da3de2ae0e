//! A reliable, ordered, message-oriented ARQ transport core.
//!
//! This crate implements only the per-session state machine: a
//! sliding-window send/receive pipeline with selective acknowledgement, a
//! fast-retransmit engine driven by duplicate-ACK counting, an RTT/RTO
//! estimator with an optional no-delay mode, and a TCP-like congestion
//! controller. It does not open sockets, acquire a clock, or negotiate a
//! connection — the caller supplies a monotonic millisecond clock via
//! [`Session::update`], hands received datagrams to [`Session::input`],
//! and drains outgoing bytes through a closure passed to [`Session::new`].
//!
//! A minimal usage loop:
//!
//! ```
//! use arqcore::{Config, Session};
//!
//! let mut a = Session::new(1, 0, Config::default(), Box::new(|_bytes: &[u8]| {
//!     // hand `_bytes` to a socket, a channel, whatever the caller uses.
//! }));
//! a.send(b"hello").unwrap();
//! a.update(0);
//! ```

mod config;
mod session;

pub use config::Config;
pub use session::{
    Cmd, ConfigError, InputError, OutputFn, RecvError, Segment, SendError, Session, HEADER_LEN,
};
