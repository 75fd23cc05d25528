//! Async client for Hattrick's CHPP XML API.
//!
//! CHPP is an OAuth 1.0a protected XML API. This crate owns the transport
//! concerns (request signing, the XML-to-JSON conversion, the typed feed
//! records) and exposes the [`feed::ChppFeed`] trait as the seam the sync
//! engine and test fakes program against.
//!
//! Element names from the feed are preserved verbatim in the raw attribute
//! bags: downstream diffing and position scoring key on them.

pub mod client;
pub mod config;
pub mod feed;
pub mod models;
pub mod oauth;
pub mod xml;

pub use client::{ChppClient, ChppError};
pub use config::ChppConfig;
pub use feed::ChppFeed;
