use std::{env, str::FromStr};

#[derive(Clone, Debug)]
pub struct Config {
    pub storage: StorageBackend,
    /// JSON file loaded into the in-memory repositories at startup.
    pub seed_file: Option<String>,
    pub mongo_conn_string: String,
    pub mongo_db_name: String,
    pub web_server_host: String,
    pub web_server_port: u16,
    pub collections: CollectionNames,
}

/// Where repositories keep their data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    Mongo,
    /// Process-local maps; everything is lost on restart.
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StorageBackend::Mongo),
            "memory" | "in-memory" => Ok(StorageBackend::Memory),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

impl StorageBackend {
    fn from_env() -> Self {
        match env::var("STORAGE_BACKEND") {
            Ok(value) => value.parse().unwrap_or_else(|err| {
                log::warn!("{}, falling back to mongo", err);
                StorageBackend::Mongo
            }),
            Err(_) => StorageBackend::Mongo,
        }
    }
}

/// MongoDB collection names, overridable per deployment.
#[derive(Clone, Debug)]
pub struct CollectionNames {
    pub courses: String,
    pub lessons: String,
    pub tests: String,
    pub lesson_progress: String,
    pub test_results: String,
    pub enrollments: String,
    pub course_seats: String,
}

impl CollectionNames {
    pub fn from_env() -> Self {
        Self {
            courses: env_or("COURSES_COLLECTION", "courses"),
            lessons: env_or("LESSONS_COLLECTION", "lessons"),
            tests: env_or("TESTS_COLLECTION", "tests"),
            lesson_progress: env_or("LESSON_PROGRESS_COLLECTION", "lesson_progress"),
            test_results: env_or("TEST_RESULTS_COLLECTION", "test_results"),
            enrollments: env_or("ENROLLMENTS_COLLECTION", "enrollments"),
            course_seats: env_or("SEATS_COLLECTION", "course_seats"),
        }
    }
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            courses: "courses".to_string(),
            lessons: "lessons".to_string(),
            tests: "tests".to_string(),
            lesson_progress: "lesson_progress".to_string(),
            test_results: "test_results".to_string(),
            enrollments: "enrollments".to_string(),
            course_seats: "course_seats".to_string(),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            storage: StorageBackend::from_env(),
            seed_file: env::var("SEED_FILE").ok().filter(|path| !path.is_empty()),
            mongo_conn_string: env_or("MONGO_CONN_STRING", "mongodb://localhost:27017"),
            mongo_db_name: env_or("MONGO_DB_NAME", "training-local"),
            web_server_host: env_or("WEB_SERVER_HOST", "localhost"),
            web_server_port: env::var("WEB_SERVER_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            collections: CollectionNames::from_env(),
        }
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            storage: StorageBackend::Memory,
            seed_file: None,
            mongo_conn_string: "mongodb://localhost:27017".to_string(),
            mongo_db_name: "training-test".to_string(),
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 8080,
            collections: CollectionNames::default(),
        }
    }
}
