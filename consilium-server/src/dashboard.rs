use std::collections::{HashMap, HashSet};

use crate::models::{Analysis, AnalysisSummary, DashboardStats, DiagnosisCount};

/// Placeholder until clinician feedback is collected.
pub const FEEDBACK_ACCURACY: f64 = 0.85;
pub const RECENT_ANALYSES: usize = 5;
pub const TOP_DIAGNOSES: usize = 5;
/// How many of the newest completed analyses feed the diagnosis counts.
pub const DIAGNOSIS_WINDOW: usize = 100;

/// Most frequent consensus diagnoses. Ties keep first-seen order.
pub fn common_diagnoses(completed: &[Analysis]) -> Vec<DiagnosisCount> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    for name in completed.iter().flat_map(Analysis::consensus_diagnosis_names) {
        let count = counts.entry(name.clone()).or_insert(0);
        if *count == 0 {
            order.push(name);
        }
        *count += 1;
    }

    let mut ranked: Vec<DiagnosisCount> = order
        .into_iter()
        .map(|name| {
            let count = counts[&name];
            DiagnosisCount { name, count }
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(TOP_DIAGNOSES);
    ranked
}

/// Newest completed analyses first, topped up from the newest overall.
pub fn recent_analyses(completed: &[Analysis], newest: &[Analysis]) -> Vec<AnalysisSummary> {
    let mut seen = HashSet::new();
    completed
        .iter()
        .chain(newest)
        .filter(|analysis| seen.insert(analysis.id))
        .take(RECENT_ANALYSES)
        .map(Analysis::summary)
        .collect()
}

/// `completed` and `newest` are both expected newest first.
pub fn build_stats(total: usize, completed: &[Analysis], newest: &[Analysis]) -> DashboardStats {
    DashboardStats {
        total_analyses: total,
        common_diagnoses: common_diagnoses(completed),
        feedback_accuracy: FEEDBACK_ACCURACY,
        recent_analyses: recent_analyses(completed, newest),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use serde_json::{Value, json};

    fn analysis(id: i64, report: Option<Value>, is_completed: bool) -> Analysis {
        let created = Utc::now() - Duration::minutes(id);
        Analysis {
            id,
            user_id: "u".into(),
            patient_id: format!("P{id}"),
            patient_data: json!({"firstName": "Pat", "lastName": format!("{id}")}),
            debate_history: vec![],
            final_report: report,
            differential_diagnoses: vec![],
            selected_specialists: vec![],
            follow_up_history: vec![],
            detected_medications: None,
            is_completed,
            created_at: created,
            updated_at: created,
        }
    }

    fn report(names: &[&str]) -> Option<Value> {
        let consensus: Vec<Value> = names.iter().map(|n| json!({"name": n})).collect();
        Some(json!({ "consensusDiagnosis": consensus }))
    }

    #[test]
    fn diagnoses_are_ranked_by_frequency() {
        let completed = vec![
            analysis(1, report(&["Pneumonia", "Bronchitis"]), true),
            analysis(2, report(&["Asthma", "Pneumonia"]), true),
            analysis(3, report(&["Bronchitis", "Pneumonia"]), true),
            analysis(4, Some(json!({"consensusDiagnosis": [{"probability": 0.3}]})), true),
            analysis(5, None, true),
        ];
        let ranked = common_diagnoses(&completed);
        assert_eq!(
            ranked,
            vec![
                DiagnosisCount { name: "Pneumonia".into(), count: 3 },
                DiagnosisCount { name: "Bronchitis".into(), count: 2 },
                DiagnosisCount { name: "Asthma".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn only_top_five_are_kept() {
        let completed: Vec<Analysis> = ["A", "B", "C", "D", "E", "F", "G"]
            .iter()
            .enumerate()
            .map(|(i, name)| analysis(i as i64, report(&[name]), true))
            .collect();
        let ranked = common_diagnoses(&completed);
        assert_eq!(ranked.len(), TOP_DIAGNOSES);
        assert_eq!(ranked[0].name, "A");
    }

    #[test]
    fn recent_prefers_completed_then_tops_up() {
        let completed = vec![analysis(2, report(&["MI"]), true)];
        let newest = vec![
            analysis(1, None, false),
            analysis(2, report(&["MI"]), true),
            analysis(3, None, false),
        ];
        let recent = recent_analyses(&completed, &newest);
        let ids: Vec<i64> = recent.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
        assert_eq!(recent[0].diagnosis_summary, "MI");
        assert_eq!(recent[1].diagnosis_summary, "In progress");
    }

    #[test]
    fn empty_history_gives_zeroed_stats() {
        let stats = build_stats(0, &[], &[]);
        assert_eq!(stats.total_analyses, 0);
        assert!(stats.common_diagnoses.is_empty());
        assert!(stats.recent_analyses.is_empty());
        assert_eq!(stats.feedback_accuracy, FEEDBACK_ACCURACY);
    }
}
