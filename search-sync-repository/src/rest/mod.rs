//! REST gateway implementation of the table scanner.

mod client;

pub use client::{RestStoreClient, StoreCredentials};
