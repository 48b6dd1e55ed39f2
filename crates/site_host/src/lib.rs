//! Typed host-domain contracts shared by the terminal engine and its host adapters.
//!
//! This crate is the API-first boundary between the terminal engine and the outside world. It
//! exposes the backend service trait ([`SiteApi`]), the timer trait ([`TerminalClock`]), and
//! in-memory implementations of both, while the concrete HTTP and tokio adapters live in
//! `site_host_http`.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod api;
pub mod clock;
pub mod memory;

pub use api::{
    admin_topic_path, AdminCredential, ApiError, NoopSiteApi, SiteApi, SiteApiFuture, UploadFile,
};
pub use clock::{ClockFuture, ManualClock, TerminalClock};
pub use memory::{ApiCall, ApiMethod, MemorySiteApi};
