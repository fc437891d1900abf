use std::sync::Arc;

use crate::{
    clock::{Clock, SystemClock},
    config::{Config, StorageBackend},
    db::Database,
    errors::{AppError, AppResult},
    repositories::{
        memory::{
            InMemoryContentRepository, InMemoryEnrollmentRepository, InMemoryProgressRepository,
            Seed,
        },
        ContentRepository, EnrollmentRepository, MongoContentRepository,
        MongoEnrollmentRepository, MongoProgressRepository, ProgressRepository,
    },
    services::{key_locks::KeyLocks, EnrollmentService, ProgressService},
};

#[derive(Clone)]
pub struct AppState {
    pub progress_service: Arc<ProgressService>,
    pub enrollment_service: Arc<EnrollmentService>,
    pub config: Arc<Config>,
    /// `None` when running on in-process repositories.
    pub db: Option<Database>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        match config.storage {
            StorageBackend::Mongo => Self::with_mongo(config).await,
            StorageBackend::Memory => Self::in_memory(config).await,
        }
    }

    async fn with_mongo(config: Config) -> AppResult<Self> {
        let db = Database::connect(&config).await?;

        let content_repository = Arc::new(MongoContentRepository::new(&db, &config.collections));
        content_repository.ensure_indexes().await?;

        let progress_repository = Arc::new(MongoProgressRepository::new(&db, &config.collections));
        progress_repository.ensure_indexes().await?;

        let enrollment_repository =
            Arc::new(MongoEnrollmentRepository::new(&db, &config.collections));
        enrollment_repository.ensure_indexes().await?;

        let mut state = Self::with_repositories(
            config,
            content_repository,
            progress_repository,
            enrollment_repository,
            Arc::new(SystemClock),
        );
        state.db = Some(db);
        Ok(state)
    }

    /// Process-local storage, preloaded from `config.seed_file` when set.
    pub async fn in_memory(config: Config) -> AppResult<Self> {
        let content = Arc::new(InMemoryContentRepository::new());
        let progress = Arc::new(InMemoryProgressRepository::new());
        let enrollments = Arc::new(InMemoryEnrollmentRepository::new());

        if let Some(path) = &config.seed_file {
            let json = tokio::fs::read_to_string(path).await.map_err(|e| {
                AppError::InternalError(format!("Cannot read seed file '{}': {}", path, e))
            })?;
            Seed::from_json(&json)?
                .apply(&content, &progress, &enrollments)
                .await?;
        }

        log::warn!("Using in-memory storage; data is lost on restart");
        Ok(Self::with_repositories(
            config,
            content,
            progress,
            enrollments,
            Arc::new(SystemClock),
        ))
    }

    /// Wires the services over arbitrary repositories. Both services share
    /// one lock registry so enroll, cancel and reconcile for the same
    /// (learner, course) never overlap.
    pub fn with_repositories(
        config: Config,
        content: Arc<dyn ContentRepository>,
        progress: Arc<dyn ProgressRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let locks = Arc::new(KeyLocks::new());

        let progress_service = Arc::new(ProgressService::new(
            content.clone(),
            progress,
            enrollments.clone(),
            locks.clone(),
            clock.clone(),
        ));
        let enrollment_service = Arc::new(EnrollmentService::new(
            content,
            enrollments,
            locks,
            clock,
        ));

        Self {
            progress_service,
            enrollment_service,
            config: Arc::new(config),
            db: None,
        }
    }
}
