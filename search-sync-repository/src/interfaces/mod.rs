//! Abstract interfaces for the pipeline's external collaborators.

mod document_store;
mod search_index_client;

pub use document_store::{ChangeFeed, ChangeFeedSource, RawChangeRecord, TableScanner};
pub use search_index_client::SearchIndexClient;
