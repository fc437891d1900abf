pub mod assignment;
pub mod enrollment_service;
pub mod enrollment_state;
pub mod key_locks;
pub mod lifecycle_guard;
pub mod progress_aggregator;
pub mod progress_service;

pub use enrollment_service::EnrollmentService;
pub use progress_service::ProgressService;
