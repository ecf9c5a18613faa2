use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use super::{
    AnalysisStorage, CASE_SEARCH_LIMIT, CaseLibraryStorage, CmeTopicStorage, Result, StorageError,
};
use crate::models::{
    Analysis, AnalysisFilter, AnalysisUpdate, CaseLibraryEntry, CmeTopic, NewAnalysis,
    NewCaseEntry, NewCmeTopic, SortOrder,
};

/// DashMap-backed storage for development and tests.
pub struct InMemoryStorage {
    analyses: Arc<DashMap<i64, Analysis>>,
    cases: Arc<DashMap<i64, CaseLibraryEntry>>,
    topics: Arc<DashMap<i64, CmeTopic>>,
    next_id: AtomicI64,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            analyses: Arc::new(DashMap::new()),
            cases: Arc::new(DashMap::new()),
            topics: Arc::new(DashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (chrono::DateTime<Utc>, i64)) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl AnalysisStorage for InMemoryStorage {
    async fn create_analysis(&self, user_id: &str, new: NewAnalysis) -> Result<Analysis> {
        let now = Utc::now();
        let analysis = Analysis {
            id: self.next_id(),
            user_id: user_id.to_string(),
            patient_id: new.patient_id,
            patient_data: new.patient_data,
            debate_history: new.debate_history,
            final_report: new.final_report,
            differential_diagnoses: new.differential_diagnoses,
            selected_specialists: new.selected_specialists,
            follow_up_history: new.follow_up_history,
            detected_medications: new.detected_medications,
            is_completed: true,
            created_at: now,
            updated_at: now,
        };
        self.analyses.insert(analysis.id, analysis.clone());
        Ok(analysis)
    }

    async fn get_analysis(&self, user_id: &str, id: i64) -> Result<Option<Analysis>> {
        Ok(self
            .analyses
            .get(&id)
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.clone()))
    }

    async fn list_analyses(&self, user_id: &str, filter: &AnalysisFilter) -> Result<Vec<Analysis>> {
        let mut items: Vec<Analysis> = self
            .analyses
            .iter()
            .filter(|entry| entry.user_id == user_id && filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();

        newest_first(&mut items, |a| (a.created_at, a.id));
        if filter.order == SortOrder::OldestFirst {
            items.reverse();
        }
        if let Some(limit) = filter.limit {
            items.truncate(limit);
        }
        Ok(items)
    }

    async fn update_analysis(
        &self,
        user_id: &str,
        id: i64,
        update: AnalysisUpdate,
    ) -> Result<Option<Analysis>> {
        match self.analyses.get_mut(&id) {
            Some(mut entry) if entry.user_id == user_id => {
                update.apply(entry.value_mut());
                Ok(Some(entry.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_analysis(&self, user_id: &str, id: i64) -> Result<bool> {
        let removed = self
            .analyses
            .remove_if(&id, |_, analysis| analysis.user_id == user_id)
            .is_some();
        if removed {
            self.cases.retain(|_, case| case.analysis_id != id);
        }
        Ok(removed)
    }

    async fn count_analyses(&self, user_id: &str) -> Result<usize> {
        Ok(self
            .analyses
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .count())
    }
}

#[async_trait]
impl CaseLibraryStorage for InMemoryStorage {
    async fn create_case(&self, user_id: &str, new: NewCaseEntry) -> Result<CaseLibraryEntry> {
        if self.get_analysis(user_id, new.analysis_id).await?.is_none() {
            return Err(StorageError::NotFound(format!("analysis {}", new.analysis_id)));
        }
        let now = Utc::now();
        let entry = CaseLibraryEntry {
            id: self.next_id(),
            analysis_id: new.analysis_id,
            owner_id: user_id.to_string(),
            tags: new.tags,
            final_diagnosis: new.final_diagnosis,
            outcome: new.outcome,
            is_anonymous: new.is_anonymous,
            is_public: new.is_public,
            view_count: 0,
            created_at: now,
            updated_at: now,
        };
        self.cases.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn list_cases(&self, user_id: &str) -> Result<Vec<CaseLibraryEntry>> {
        let mut items: Vec<CaseLibraryEntry> = self
            .cases
            .iter()
            .filter(|entry| entry.visible_to(user_id))
            .map(|entry| entry.value().clone())
            .collect();
        newest_first(&mut items, |c| (c.created_at, c.id));
        Ok(items)
    }

    async fn get_case(&self, user_id: &str, id: i64) -> Result<Option<CaseLibraryEntry>> {
        Ok(self
            .cases
            .get(&id)
            .filter(|entry| entry.visible_to(user_id))
            .map(|entry| entry.clone()))
    }

    async fn record_case_view(&self, user_id: &str, id: i64) -> Result<Option<i64>> {
        match self.cases.get_mut(&id) {
            Some(mut entry) if entry.visible_to(user_id) => {
                entry.view_count += 1;
                Ok(Some(entry.view_count))
            }
            _ => Ok(None),
        }
    }

    async fn search_cases(&self, user_id: &str, query: &str) -> Result<Vec<CaseLibraryEntry>> {
        let mut items = self.list_cases(user_id).await?;
        items.retain(|entry| entry.matches_query(query));
        items.truncate(CASE_SEARCH_LIMIT);
        Ok(items)
    }
}

#[async_trait]
impl CmeTopicStorage for InMemoryStorage {
    async fn create_topic(&self, user_id: &str, new: NewCmeTopic) -> Result<CmeTopic> {
        let topic = CmeTopic {
            id: self.next_id(),
            user_id: user_id.to_string(),
            topic: new.topic,
            relevance: new.relevance,
            is_completed: new.is_completed,
            created_at: Utc::now(),
        };
        self.topics.insert(topic.id, topic.clone());
        Ok(topic)
    }

    async fn list_topics(&self, user_id: &str) -> Result<Vec<CmeTopic>> {
        let mut items: Vec<CmeTopic> = self
            .topics
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        newest_first(&mut items, |t| (t.created_at, t.id));
        Ok(items)
    }

    async fn complete_topic(&self, user_id: &str, id: i64) -> Result<Option<CmeTopic>> {
        match self.topics.get_mut(&id) {
            Some(mut entry) if entry.user_id == user_id => {
                entry.is_completed = true;
                Ok(Some(entry.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_topic(&self, user_id: &str, id: i64) -> Result<bool> {
        Ok(self
            .topics
            .remove_if(&id, |_, topic| topic.user_id == user_id)
            .is_some())
    }
}
