use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{
    config::CollectionNames,
    db::Database,
    errors::AppResult,
    models::domain::{Course, CourseTest, Lesson},
};

/// Read access to course definitions: the course itself, its lessons and its tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentRepository: Send + Sync {
    async fn find_course(&self, course_id: &str) -> AppResult<Option<Course>>;
    async fn find_lessons_by_course(&self, course_id: &str) -> AppResult<Vec<Lesson>>;
    async fn find_tests_by_course(&self, course_id: &str) -> AppResult<Vec<CourseTest>>;
}

pub struct MongoContentRepository {
    courses: Collection<Course>,
    lessons: Collection<Lesson>,
    tests: Collection<CourseTest>,
}

impl MongoContentRepository {
    pub fn new(db: &Database, names: &CollectionNames) -> Self {
        Self {
            courses: db.get_collection(&names.courses),
            lessons: db.get_collection(&names.lessons),
            tests: db.get_collection(&names.tests),
        }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for course content collections");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let course_index = |name: &str| {
            IndexModel::builder()
                .keys(doc! { "course_id": 1 })
                .options(IndexOptions::builder().name(name.to_string()).build())
                .build()
        };

        self.courses.create_index(id_index).await?;
        self.lessons.create_index(course_index("lesson_course")).await?;
        self.tests.create_index(course_index("test_course")).await?;

        log::info!("Successfully created indexes for course content collections");
        Ok(())
    }
}

#[async_trait]
impl ContentRepository for MongoContentRepository {
    async fn find_course(&self, course_id: &str) -> AppResult<Option<Course>> {
        let course = self.courses.find_one(doc! { "id": course_id }).await?;
        Ok(course)
    }

    async fn find_lessons_by_course(&self, course_id: &str) -> AppResult<Vec<Lesson>> {
        let lessons = self
            .lessons
            .find(doc! { "course_id": course_id })
            .await?
            .try_collect()
            .await?;
        Ok(lessons)
    }

    async fn find_tests_by_course(&self, course_id: &str) -> AppResult<Vec<CourseTest>> {
        let tests = self
            .tests
            .find(doc! { "course_id": course_id })
            .await?
            .try_collect()
            .await?;
        Ok(tests)
    }
}
