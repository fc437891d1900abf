//! In-process repositories backed by `tokio::sync::RwLock<HashMap<..>>`.
//!
//! Backs `STORAGE_BACKEND=memory` runs, optionally preloaded from a
//! [`Seed`] file, and the test suites. Every conditional write happens under
//! a single write guard, so these honour the same duplicate/capacity
//! guarantees as the Mongo implementations.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::{
    errors::{AppError, AppResult},
    models::domain::{Course, CourseTest, Enrollment, Lesson, LessonProgress, TestResult},
    repositories::{ContentRepository, EnrollmentRepository, ProgressRepository},
};

#[derive(Default)]
pub struct InMemoryContentRepository {
    courses: Arc<RwLock<HashMap<String, Course>>>,
    lessons: Arc<RwLock<Vec<Lesson>>>,
    tests: Arc<RwLock<Vec<CourseTest>>>,
}

impl InMemoryContentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put_course(&self, course: Course) {
        self.courses.write().await.insert(course.id.clone(), course);
    }

    pub async fn put_lesson(&self, lesson: Lesson) {
        let mut lessons = self.lessons.write().await;
        lessons.retain(|l| l.id != lesson.id);
        lessons.push(lesson);
    }

    pub async fn put_test(&self, test: CourseTest) {
        let mut tests = self.tests.write().await;
        tests.retain(|t| t.id != test.id);
        tests.push(test);
    }
}

#[async_trait]
impl ContentRepository for InMemoryContentRepository {
    async fn find_course(&self, course_id: &str) -> AppResult<Option<Course>> {
        Ok(self.courses.read().await.get(course_id).cloned())
    }

    async fn find_lessons_by_course(&self, course_id: &str) -> AppResult<Vec<Lesson>> {
        let lessons = self.lessons.read().await;
        Ok(lessons
            .iter()
            .filter(|l| l.course_id == course_id)
            .cloned()
            .collect())
    }

    async fn find_tests_by_course(&self, course_id: &str) -> AppResult<Vec<CourseTest>> {
        let tests = self.tests.read().await;
        Ok(tests
            .iter()
            .filter(|t| t.course_id == course_id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryProgressRepository {
    lesson_progress: Arc<RwLock<HashMap<(String, String), LessonProgress>>>,
    test_results: Arc<RwLock<Vec<TestResult>>>,
}

impl InMemoryProgressRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upserts by (learner, lesson); there is at most one record per pair.
    pub async fn record_lesson_progress(&self, progress: LessonProgress) {
        let key = (progress.learner_id.clone(), progress.lesson_id.clone());
        self.lesson_progress.write().await.insert(key, progress);
    }

    pub async fn record_test_result(&self, result: TestResult) {
        self.test_results.write().await.push(result);
    }
}

#[async_trait]
impl ProgressRepository for InMemoryProgressRepository {
    async fn find_lesson_progress(
        &self,
        learner_id: &str,
        lesson_ids: &[String],
    ) -> AppResult<Vec<LessonProgress>> {
        let progress = self.lesson_progress.read().await;
        Ok(progress
            .values()
            .filter(|p| p.learner_id == learner_id && lesson_ids.contains(&p.lesson_id))
            .cloned()
            .collect())
    }

    async fn find_test_results(
        &self,
        learner_id: &str,
        test_ids: &[String],
    ) -> AppResult<Vec<TestResult>> {
        let results = self.test_results.read().await;
        Ok(results
            .iter()
            .filter(|r| r.learner_id == learner_id && test_ids.contains(&r.test_id))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryEnrollmentRepository {
    enrollments: Arc<RwLock<HashMap<(String, String), Enrollment>>>,
}

impl InMemoryEnrollmentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn key(learner_id: &str, course_id: &str) -> (String, String) {
    (learner_id.to_string(), course_id.to_string())
}

fn not_found(learner_id: &str, course_id: &str) -> AppError {
    AppError::NotFound(format!(
        "Enrollment for learner '{}' in course '{}' not found",
        learner_id, course_id
    ))
}

#[async_trait]
impl EnrollmentRepository for InMemoryEnrollmentRepository {
    async fn find(&self, learner_id: &str, course_id: &str) -> AppResult<Option<Enrollment>> {
        let enrollments = self.enrollments.read().await;
        Ok(enrollments.get(&key(learner_id, course_id)).cloned())
    }

    async fn find_by_learner(&self, learner_id: &str) -> AppResult<Vec<Enrollment>> {
        let enrollments = self.enrollments.read().await;
        let mut items: Vec<_> = enrollments
            .values()
            .filter(|e| e.learner_id == learner_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.assigned_at.cmp(&a.assigned_at));
        Ok(items)
    }

    async fn find_by_course(&self, course_id: &str) -> AppResult<Vec<Enrollment>> {
        let enrollments = self.enrollments.read().await;
        let mut items: Vec<_> = enrollments
            .values()
            .filter(|e| e.course_id == course_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.learner_id.cmp(&b.learner_id));
        Ok(items)
    }

    async fn count_by_course(&self, course_id: &str) -> AppResult<u64> {
        let enrollments = self.enrollments.read().await;
        Ok(enrollments
            .values()
            .filter(|e| e.course_id == course_id)
            .count() as u64)
    }

    async fn insert(
        &self,
        enrollment: Enrollment,
        capacity: Option<u32>,
    ) -> AppResult<Enrollment> {
        let mut enrollments = self.enrollments.write().await;
        let k = key(&enrollment.learner_id, &enrollment.course_id);

        if enrollments.contains_key(&k) {
            return Err(AppError::Conflict(format!(
                "Learner '{}' is already enrolled in course '{}'",
                enrollment.learner_id, enrollment.course_id
            )));
        }

        if let Some(max) = capacity {
            let taken = enrollments
                .values()
                .filter(|e| e.course_id == enrollment.course_id)
                .count();
            if taken >= max as usize {
                return Err(AppError::CapacityExceeded(format!(
                    "Course '{}' has no free seats",
                    enrollment.course_id
                )));
            }
        }

        enrollments.insert(k, enrollment.clone());
        Ok(enrollment)
    }

    async fn update(&self, enrollment: Enrollment) -> AppResult<Enrollment> {
        let mut enrollments = self.enrollments.write().await;
        let k = key(&enrollment.learner_id, &enrollment.course_id);
        match enrollments.get_mut(&k) {
            Some(existing) => {
                *existing = enrollment.clone();
                Ok(enrollment)
            }
            None => Err(not_found(&enrollment.learner_id, &enrollment.course_id)),
        }
    }

    async fn delete(&self, learner_id: &str, course_id: &str) -> AppResult<()> {
        let mut enrollments = self.enrollments.write().await;
        if enrollments.remove(&key(learner_id, course_id)).is_none() {
            return Err(not_found(learner_id, course_id));
        }
        Ok(())
    }
}

/// Initial contents for the in-memory repositories, read from JSON.
/// Every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Seed {
    pub courses: Vec<Course>,
    pub lessons: Vec<Lesson>,
    pub tests: Vec<CourseTest>,
    pub lesson_progress: Vec<LessonProgress>,
    pub test_results: Vec<TestResult>,
    pub enrollments: Vec<Enrollment>,
}

impl Seed {
    pub fn from_json(json: &str) -> AppResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| AppError::ValidationError(format!("Invalid seed data: {}", e)))
    }

    pub async fn apply(
        self,
        content: &InMemoryContentRepository,
        progress: &InMemoryProgressRepository,
        enrollments: &InMemoryEnrollmentRepository,
    ) -> AppResult<()> {
        log::info!(
            "Seeding {} course(s), {} lesson(s), {} test(s), {} enrollment(s)",
            self.courses.len(),
            self.lessons.len(),
            self.tests.len(),
            self.enrollments.len()
        );

        for course in self.courses {
            content.put_course(course).await;
        }
        for lesson in self.lessons {
            content.put_lesson(lesson).await;
        }
        for test in self.tests {
            content.put_test(test).await;
        }
        for record in self.lesson_progress {
            progress.record_lesson_progress(record).await;
        }
        for result in self.test_results {
            progress.record_test_result(result).await;
        }
        // seeded rows were admitted elsewhere, so no seat check here
        for enrollment in self.enrollments {
            enrollments.insert(enrollment, None).await?;
        }
        Ok(())
    }
}
