use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{
    config::CollectionNames,
    db::Database,
    errors::AppResult,
    models::domain::{LessonProgress, TestResult},
};

/// Read access to what a learner has done: lesson positions and test attempts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    async fn find_lesson_progress(
        &self,
        learner_id: &str,
        lesson_ids: &[String],
    ) -> AppResult<Vec<LessonProgress>>;
    async fn find_test_results(
        &self,
        learner_id: &str,
        test_ids: &[String],
    ) -> AppResult<Vec<TestResult>>;
}

pub struct MongoProgressRepository {
    lesson_progress: Collection<LessonProgress>,
    test_results: Collection<TestResult>,
}

impl MongoProgressRepository {
    pub fn new(db: &Database, names: &CollectionNames) -> Self {
        Self {
            lesson_progress: db.get_collection(&names.lesson_progress),
            test_results: db.get_collection(&names.test_results),
        }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for progress collections");

        let learner_lesson_index = IndexModel::builder()
            .keys(doc! { "learner_id": 1, "lesson_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("learner_lesson_unique".to_string())
                    .build(),
            )
            .build();

        let learner_test_index = IndexModel::builder()
            .keys(doc! { "learner_id": 1, "test_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("learner_test".to_string())
                    .build(),
            )
            .build();

        self.lesson_progress.create_index(learner_lesson_index).await?;
        self.test_results.create_index(learner_test_index).await?;

        log::info!("Successfully created indexes for progress collections");
        Ok(())
    }
}

#[async_trait]
impl ProgressRepository for MongoProgressRepository {
    async fn find_lesson_progress(
        &self,
        learner_id: &str,
        lesson_ids: &[String],
    ) -> AppResult<Vec<LessonProgress>> {
        if lesson_ids.is_empty() {
            return Ok(vec![]);
        }
        let progress = self
            .lesson_progress
            .find(doc! {
                "learner_id": learner_id,
                "lesson_id": { "$in": lesson_ids.to_vec() }
            })
            .await?
            .try_collect()
            .await?;
        Ok(progress)
    }

    async fn find_test_results(
        &self,
        learner_id: &str,
        test_ids: &[String],
    ) -> AppResult<Vec<TestResult>> {
        if test_ids.is_empty() {
            return Ok(vec![]);
        }
        let results = self
            .test_results
            .find(doc! {
                "learner_id": learner_id,
                "test_id": { "$in": test_ids.to_vec() }
            })
            .await?
            .try_collect()
            .await?;
        Ok(results)
    }
}
