//! Persistence for analyses, case-library entries and CME topics.
//!
//! Every operation is scoped to the calling user. A record owned by somebody
//! else is reported exactly like a missing one.

mod memory;
mod postgres;

pub use memory::InMemoryStorage;
pub use postgres::PostgresStorage;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    Analysis, AnalysisFilter, AnalysisUpdate, CaseLibraryEntry, CmeTopic, NewAnalysis,
    NewCaseEntry, NewCmeTopic,
};

/// Maximum number of hits returned by a case-library search.
pub const CASE_SEARCH_LIMIT: usize = 50;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;

#[async_trait]
pub trait AnalysisStorage: Send + Sync {
    async fn create_analysis(&self, user_id: &str, new: NewAnalysis) -> Result<Analysis>;
    async fn get_analysis(&self, user_id: &str, id: i64) -> Result<Option<Analysis>>;
    async fn list_analyses(&self, user_id: &str, filter: &AnalysisFilter) -> Result<Vec<Analysis>>;
    async fn update_analysis(
        &self,
        user_id: &str,
        id: i64,
        update: AnalysisUpdate,
    ) -> Result<Option<Analysis>>;
    /// Returns `false` when nothing was deleted.
    async fn delete_analysis(&self, user_id: &str, id: i64) -> Result<bool>;
    async fn count_analyses(&self, user_id: &str) -> Result<usize>;
}

#[async_trait]
pub trait CaseLibraryStorage: Send + Sync {
    /// Creates an entry for one of the caller's analyses. Fails with
    /// [`StorageError::NotFound`] when the analysis is not theirs.
    async fn create_case(&self, user_id: &str, new: NewCaseEntry) -> Result<CaseLibraryEntry>;
    /// Own and public entries, newest first.
    async fn list_cases(&self, user_id: &str) -> Result<Vec<CaseLibraryEntry>>;
    async fn get_case(&self, user_id: &str, id: i64) -> Result<Option<CaseLibraryEntry>>;
    /// Increments the view counter of a visible entry and returns the new value.
    async fn record_case_view(&self, user_id: &str, id: i64) -> Result<Option<i64>>;
    /// Visible entries matching `query`, at most [`CASE_SEARCH_LIMIT`].
    async fn search_cases(&self, user_id: &str, query: &str) -> Result<Vec<CaseLibraryEntry>>;
}

#[async_trait]
pub trait CmeTopicStorage: Send + Sync {
    async fn create_topic(&self, user_id: &str, new: NewCmeTopic) -> Result<CmeTopic>;
    async fn list_topics(&self, user_id: &str) -> Result<Vec<CmeTopic>>;
    async fn complete_topic(&self, user_id: &str, id: i64) -> Result<Option<CmeTopic>>;
    async fn delete_topic(&self, user_id: &str, id: i64) -> Result<bool>;
}

/// Everything the HTTP layer needs from a backend.
pub trait Storage: AnalysisStorage + CaseLibraryStorage + CmeTopicStorage {}

impl<T: AnalysisStorage + CaseLibraryStorage + CmeTopicStorage> Storage for T {}
