pub mod course;
pub mod course_test;
pub mod enrollment;
pub mod lesson;
pub mod lesson_progress;
pub mod test_result;
pub use course::Course;
pub use course_test::CourseTest;
pub use enrollment::{Enrollment, EnrollmentStatus};
pub use lesson::Lesson;
pub use lesson_progress::LessonProgress;
pub use test_result::TestResult;
