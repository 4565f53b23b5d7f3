//! Network utilities for upstream metric providers.
//!
//! This module provides:
//! - An HTTP client that maps responses onto the fetch error taxonomy
//! - Source descriptors with public/authenticated endpoint selection
//! - The adapter traits implemented by each provider

mod client;
mod source;

pub use client::{extract_domain, HttpClient};
pub use source::{
    DynHistorySource, DynSourceAdapter, HistorySource, ResolvedEndpoint, SourceAdapter,
    SourceDescriptor,
};
