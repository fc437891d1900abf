pub mod content_repository;
pub mod enrollment_repository;
pub mod memory;
pub mod progress_repository;

pub use content_repository::{ContentRepository, MongoContentRepository};
pub use enrollment_repository::{EnrollmentRepository, MongoEnrollmentRepository};
pub use progress_repository::{MongoProgressRepository, ProgressRepository};
