//! Native implementations of [`site_host`] service contracts.
//!
//! [`HttpSiteApi`] talks to the site server over HTTP with `reqwest`; [`TokioClock`] backs
//! engine timers with `tokio::time`.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod clock;
pub mod http;

pub use clock::TokioClock;
pub use http::{decode_error, HttpSiteApi, DEFAULT_API_BASE};
