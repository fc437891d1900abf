//! Folds a learner's lesson positions and test attempts into one course
//! percentage.
//!
//! Everything here is pure: callers load the course content and the
//! learner's records, then hand them over as slices. Ratios are kept in
//! `[0, 1]` and the final percentage in `[0, 100]`; a non-finite value at
//! any stage counts as zero.

use std::collections::HashMap;

use async_graphql::SimpleObject;
use serde::Serialize;

use crate::models::domain::{
    test_result::best_result, CourseTest, Lesson, LessonProgress, TestResult,
};

/// How far a learner got through one lesson.
#[derive(Clone, Debug, PartialEq, Serialize, SimpleObject)]
pub struct LessonSignal {
    pub lesson_id: String,
    pub ratio: f64,
    pub attempted: bool,
}

/// The learner's best attempt at one test.
#[derive(Clone, Debug, PartialEq, Serialize, SimpleObject)]
pub struct TestSignal {
    pub test_id: String,
    pub best_score: Option<f64>,
    pub passed: bool,
    pub attempted: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, SimpleObject)]
pub struct ProgressBreakdown {
    pub lessons_progress: f64,
    pub tests_progress: f64,
    pub overall_percentage: f64,
    /// True once every lesson and every test has at least one record.
    pub attempt_completeness: bool,
    pub lessons: Vec<LessonSignal>,
    pub tests: Vec<TestSignal>,
}

pub fn clamp_ratio(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn clamp_percentage(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Completion ratio of a single lesson. Completed lessons count in full;
/// otherwise the timed position is preferred over the page position.
pub fn lesson_ratio(lesson: &Lesson, progress: Option<&LessonProgress>) -> f64 {
    let Some(progress) = progress else {
        return 0.0;
    };

    if progress.is_completed {
        return 1.0;
    }

    if let (Some(total), Some(current)) = (lesson.positive_duration(), progress.current_time_seconds)
    {
        return clamp_ratio(current / total);
    }

    if let (Some(total), Some(current)) = (lesson.positive_page_count(), progress.current_page) {
        return clamp_ratio(f64::from(current) / f64::from(total));
    }

    0.0
}

/// 100 × mean of the ratios, or 0 for an empty set.
fn mean_percentage(ratios: impl Iterator<Item = f64>, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    let sum: f64 = ratios.map(clamp_ratio).sum();
    clamp_percentage(100.0 * sum / count as f64)
}

pub fn aggregate(
    lessons: &[Lesson],
    tests: &[CourseTest],
    progress: &[LessonProgress],
    results: &[TestResult],
) -> ProgressBreakdown {
    let progress_by_lesson: HashMap<&str, &LessonProgress> = progress
        .iter()
        .map(|p| (p.lesson_id.as_str(), p))
        .collect();

    let mut results_by_test: HashMap<&str, Vec<&TestResult>> = HashMap::new();
    for result in results {
        results_by_test
            .entry(result.test_id.as_str())
            .or_default()
            .push(result);
    }

    let lesson_signals: Vec<LessonSignal> = lessons
        .iter()
        .map(|lesson| {
            let record = progress_by_lesson.get(lesson.id.as_str()).copied();
            LessonSignal {
                lesson_id: lesson.id.clone(),
                ratio: lesson_ratio(lesson, record),
                attempted: record.is_some(),
            }
        })
        .collect();

    let test_signals: Vec<TestSignal> = tests
        .iter()
        .map(|test| {
            let best = results_by_test
                .get(test.id.as_str())
                .and_then(|attempts| best_result(attempts.iter().copied()));
            TestSignal {
                test_id: test.id.clone(),
                best_score: best.map(|r| r.score),
                passed: best.map(|r| r.is_passed).unwrap_or(false),
                attempted: best.is_some(),
            }
        })
        .collect();

    let lesson_count = lesson_signals.len();
    let test_count = test_signals.len();

    let lessons_progress = mean_percentage(lesson_signals.iter().map(|s| s.ratio), lesson_count);
    let tests_progress = mean_percentage(
        test_signals.iter().map(|s| if s.passed { 1.0 } else { 0.0 }),
        test_count,
    );

    let item_count = lesson_count + test_count;
    let overall_percentage = if item_count == 0 {
        0.0
    } else {
        clamp_percentage(
            (lessons_progress * lesson_count as f64 + tests_progress * test_count as f64)
                / item_count as f64,
        )
    };

    let attempt_completeness = lesson_signals.iter().all(|s| s.attempted)
        && test_signals.iter().all(|s| s.attempted);

    ProgressBreakdown {
        lessons_progress,
        tests_progress,
        overall_percentage,
        attempt_completeness,
        lessons: lesson_signals,
        tests: test_signals,
    }
}
