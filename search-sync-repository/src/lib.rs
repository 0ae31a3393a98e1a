//! # Search Sync Repository
//!
//! This crate provides traits and implementations for the two external
//! collaborators of the sync pipeline: the search engine and the document
//! store. It includes definitions for errors, interfaces, a concrete
//! OpenSearch index client, and a REST gateway table scanner.

pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod rest;

pub use errors::{SearchError, StoreError};
pub use interfaces::{
    ChangeFeed, ChangeFeedSource, RawChangeRecord, SearchIndexClient, TableScanner,
};
pub use opensearch::OpenSearchClient;
pub use rest::{RestStoreClient, StoreCredentials};
