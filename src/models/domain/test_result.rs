use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct TestResult {
    pub id: String,
    pub learner_id: String,
    pub test_id: String,
    pub score: f64,
    pub is_passed: bool,
    pub submitted_at: DateTime<Utc>,
}

impl TestResult {
    pub fn new(learner_id: &str, test_id: &str, score: f64, is_passed: bool) -> Self {
        TestResult {
            id: Uuid::new_v4().to_string(),
            learner_id: learner_id.to_string(),
            test_id: test_id.to_string(),
            score,
            is_passed,
            submitted_at: Utc::now(),
        }
    }

    /// Orders attempts so the best one compares greatest: higher score wins,
    /// equal scores fall back to the later submission. NaN scores rank lowest.
    pub fn rank(&self, other: &TestResult) -> Ordering {
        let score = |r: &TestResult| if r.score.is_nan() { f64::NEG_INFINITY } else { r.score };
        score(self)
            .partial_cmp(&score(other))
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.submitted_at.cmp(&other.submitted_at))
    }
}

/// Picks the highest-ranked attempt out of a learner's results for one test.
pub fn best_result<'a, I>(results: I) -> Option<&'a TestResult>
where
    I: IntoIterator<Item = &'a TestResult>,
{
    results.into_iter().max_by(|a, b| a.rank(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn best_result_prefers_highest_score() {
        let low = TestResult::new("l-1", "t-1", 40.0, false);
        let high = TestResult::new("l-1", "t-1", 90.0, true);
        let mid = TestResult::new("l-1", "t-1", 70.0, true);

        let results = vec![low, high.clone(), mid];
        assert_eq!(best_result(&results).map(|r| r.id.clone()), Some(high.id));
    }

    #[test]
    fn equal_scores_pick_latest_submission() {
        let mut older = TestResult::new("l-1", "t-1", 80.0, true);
        older.submitted_at = Utc::now() - Duration::hours(1);
        let newer = TestResult::new("l-1", "t-1", 80.0, true);

        let results = vec![newer.clone(), older];
        assert_eq!(best_result(&results).map(|r| r.id.clone()), Some(newer.id));
    }

    #[test]
    fn nan_score_never_wins() {
        let broken = TestResult::new("l-1", "t-1", f64::NAN, true);
        let real = TestResult::new("l-1", "t-1", 10.0, false);

        let results = vec![broken, real.clone()];
        assert_eq!(best_result(&results).map(|r| r.id.clone()), Some(real.id));
    }

    #[test]
    fn no_results_means_no_best() {
        let results: Vec<TestResult> = vec![];
        assert!(best_result(&results).is_none());
    }
}
