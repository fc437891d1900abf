use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    error::{Error, ErrorKind, WriteFailure},
    options::{IndexOptions, UpdateOptions},
    ClientSession, Collection, IndexModel,
};

use crate::{
    config::CollectionNames,
    db::{
        abort_quietly, commit_with_retry, is_transient, Database, MAX_TRANSACTION_ATTEMPTS,
        TRANSACTION_BACKOFF,
    },
    errors::{AppError, AppResult},
    models::domain::Enrollment,
};

const DUPLICATE_KEY: i32 = 11000;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    async fn find(&self, learner_id: &str, course_id: &str) -> AppResult<Option<Enrollment>>;
    async fn find_by_learner(&self, learner_id: &str) -> AppResult<Vec<Enrollment>>;
    async fn find_by_course(&self, course_id: &str) -> AppResult<Vec<Enrollment>>;
    async fn count_by_course(&self, course_id: &str) -> AppResult<u64>;
    /// Inserts the enrollment as one conditional write. Fails with
    /// `Conflict` when the (learner, course) pair already exists and with
    /// `CapacityExceeded` when `capacity` seats are already taken.
    async fn insert(&self, enrollment: Enrollment, capacity: Option<u32>)
        -> AppResult<Enrollment>;
    async fn update(&self, enrollment: Enrollment) -> AppResult<Enrollment>;
    async fn delete(&self, learner_id: &str, course_id: &str) -> AppResult<()>;
}

/// Enrollments plus a per-course seat document.
///
/// Every insert and delete runs in one transaction that also rewrites the
/// course's seat document with the live enrollment count. Two concurrent
/// writers for the same course therefore conflict on that document and one
/// of them is retried against fresh data, which is what makes the capacity
/// check atomic. The stored count is recomputed on each write and cannot
/// drift away from the enrollment rows.
pub struct MongoEnrollmentRepository {
    db: Database,
    collection: Collection<Enrollment>,
    seats: Collection<Document>,
}

/// A write that touches both the enrollment rows and the seat document.
enum SeatWrite<'a> {
    Insert {
        enrollment: &'a Enrollment,
        capacity: Option<u32>,
    },
    Delete {
        learner_id: &'a str,
        course_id: &'a str,
    },
}

impl SeatWrite<'_> {
    fn course_id(&self) -> &str {
        match self {
            SeatWrite::Insert { enrollment, .. } => enrollment.course_id.as_str(),
            SeatWrite::Delete { course_id, .. } => *course_id,
        }
    }
}

/// Driver errors in the outer `Result`; a business rejection, raised after
/// the transaction was aborted, in the inner one.
type Attempt = Result<AppResult<()>, Error>;

/// Rejects an insert when `enrolled` already fills the course.
pub fn check_seats(course_id: &str, enrolled: u64, capacity: Option<u32>) -> AppResult<()> {
    match capacity {
        Some(max) if enrolled >= u64::from(max) => Err(AppError::CapacityExceeded(format!(
            "Course '{}' has no free seats",
            course_id
        ))),
        _ => Ok(()),
    }
}

fn not_found(learner_id: &str, course_id: &str) -> AppError {
    AppError::NotFound(format!(
        "Enrollment for learner '{}' in course '{}' not found",
        learner_id, course_id
    ))
}

impl MongoEnrollmentRepository {
    pub fn new(db: &Database, names: &CollectionNames) -> Self {
        Self {
            db: db.clone(),
            collection: db.get_collection(&names.enrollments),
            seats: db.get_collection(&names.course_seats),
        }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for enrollments collection");

        let learner_course_index = IndexModel::builder()
            .keys(doc! { "learner_id": 1, "course_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("learner_course_unique".to_string())
                    .build(),
            )
            .build();

        let course_index = IndexModel::builder()
            .keys(doc! { "course_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("course_id".to_string())
                    .build(),
            )
            .build();

        let seat_index = IndexModel::builder()
            .keys(doc! { "course_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("seat_course_unique".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(learner_course_index).await?;
        self.collection.create_index(course_index).await?;
        self.seats.create_index(seat_index).await?;

        log::info!("Successfully created indexes for enrollments collection");
        Ok(())
    }

    /// Runs `write` in a fresh transaction, retrying from scratch on
    /// transient errors. A duplicate key that reaches this loop comes from
    /// two writers creating the same seat document, which is retried too;
    /// duplicate enrollments are turned into `Conflict` inside the attempt.
    async fn run(&self, write: SeatWrite<'_>) -> AppResult<()> {
        let mut attempt = 1;
        loop {
            let mut session = self.db.start_session().await?;
            let err = match self.attempt(&mut session, &write).await {
                Ok(outcome) => return outcome,
                Err(err) => err,
            };
            abort_quietly(&mut session).await;

            let retryable = is_transient(&err) || is_duplicate_key(&err);
            if !retryable || attempt >= MAX_TRANSACTION_ATTEMPTS {
                log::warn!(
                    "Enrollment write for course {} failed after {} attempt(s): {}",
                    write.course_id(),
                    attempt,
                    err
                );
                return Err(err.into());
            }
            log::debug!(
                "Retrying enrollment write for course {} ({}): {}",
                write.course_id(),
                attempt,
                err
            );
            tokio::time::sleep(TRANSACTION_BACKOFF * attempt as u32).await;
            attempt += 1;
        }
    }

    async fn attempt(&self, session: &mut ClientSession, write: &SeatWrite<'_>) -> Attempt {
        session.start_transaction().await?;

        match write {
            SeatWrite::Insert {
                enrollment,
                capacity,
            } => {
                let course_id = enrollment.course_id.as_str();
                let enrolled = self.count_in(session, course_id).await?;
                if let Err(rejection) = check_seats(course_id, enrolled, *capacity) {
                    abort_quietly(session).await;
                    return Ok(Err(rejection));
                }

                self.write_seat_count(session, course_id, enrolled + 1).await?;

                if let Err(err) = self.collection.insert_one(*enrollment).session(&mut *session).await {
                    if !is_duplicate_key(&err) {
                        return Err(err);
                    }
                    abort_quietly(session).await;
                    return Ok(Err(AppError::Conflict(format!(
                        "Learner '{}' is already enrolled in course '{}'",
                        enrollment.learner_id, course_id
                    ))));
                }
            }
            SeatWrite::Delete {
                learner_id,
                course_id,
            } => {
                let result = self
                    .collection
                    .delete_one(doc! { "learner_id": *learner_id, "course_id": *course_id })
                    .session(&mut *session)
                    .await?;
                if result.deleted_count == 0 {
                    abort_quietly(session).await;
                    return Ok(Err(not_found(learner_id, course_id)));
                }

                let enrolled = self.count_in(session, course_id).await?;
                self.write_seat_count(session, course_id, enrolled).await?;
            }
        }

        commit_with_retry(session).await?;
        Ok(Ok(()))
    }

    async fn count_in(&self, session: &mut ClientSession, course_id: &str) -> Result<u64, Error> {
        self.collection
            .count_documents(doc! { "course_id": course_id })
            .session(&mut *session)
            .await
    }

    async fn write_seat_count(
        &self,
        session: &mut ClientSession,
        course_id: &str,
        taken: u64,
    ) -> Result<(), Error> {
        self.seats
            .update_one(
                doc! { "course_id": course_id },
                doc! { "$set": { "taken": taken as i64 } },
            )
            .with_options(UpdateOptions::builder().upsert(true).build())
            .session(&mut *session)
            .await?;
        Ok(())
    }
}

fn is_duplicate_key(err: &Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY
    )
}

#[async_trait]
impl EnrollmentRepository for MongoEnrollmentRepository {
    async fn find(&self, learner_id: &str, course_id: &str) -> AppResult<Option<Enrollment>> {
        let enrollment = self
            .collection
            .find_one(doc! { "learner_id": learner_id, "course_id": course_id })
            .await?;
        Ok(enrollment)
    }

    async fn find_by_learner(&self, learner_id: &str) -> AppResult<Vec<Enrollment>> {
        let enrollments = self
            .collection
            .find(doc! { "learner_id": learner_id })
            .sort(doc! { "assigned_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(enrollments)
    }

    async fn find_by_course(&self, course_id: &str) -> AppResult<Vec<Enrollment>> {
        let enrollments = self
            .collection
            .find(doc! { "course_id": course_id })
            .await?
            .try_collect()
            .await?;
        Ok(enrollments)
    }

    async fn count_by_course(&self, course_id: &str) -> AppResult<u64> {
        let count = self
            .collection
            .count_documents(doc! { "course_id": course_id })
            .await?;
        Ok(count)
    }

    async fn insert(
        &self,
        enrollment: Enrollment,
        capacity: Option<u32>,
    ) -> AppResult<Enrollment> {
        self.run(SeatWrite::Insert {
            enrollment: &enrollment,
            capacity,
        })
        .await?;
        Ok(enrollment)
    }

    async fn update(&self, enrollment: Enrollment) -> AppResult<Enrollment> {
        let result = self
            .collection
            .replace_one(
                doc! {
                    "learner_id": &enrollment.learner_id,
                    "course_id": &enrollment.course_id
                },
                &enrollment,
            )
            .await?;

        if result.matched_count == 0 {
            return Err(not_found(&enrollment.learner_id, &enrollment.course_id));
        }

        Ok(enrollment)
    }

    async fn delete(&self, learner_id: &str, course_id: &str) -> AppResult<()> {
        self.run(SeatWrite::Delete {
            learner_id,
            course_id,
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seats_are_free_below_capacity() {
        assert!(check_seats("c-1", 0, Some(1)).is_ok());
        assert!(check_seats("c-1", 4, Some(5)).is_ok());
    }

    #[test]
    fn last_seat_taken_means_full() {
        assert!(matches!(
            check_seats("c-1", 5, Some(5)),
            Err(AppError::CapacityExceeded(_))
        ));
        assert!(matches!(
            check_seats("c-1", 9, Some(5)),
            Err(AppError::CapacityExceeded(_))
        ));
    }

    #[test]
    fn uncapped_courses_never_fill() {
        assert!(check_seats("c-1", u64::MAX, None).is_ok());
    }

    #[test]
    fn seat_writes_know_their_course() {
        let enrollment = Enrollment::self_enrolled("l-1", "c-1", chrono::Utc::now());
        let insert = SeatWrite::Insert {
            enrollment: &enrollment,
            capacity: None,
        };
        let delete = SeatWrite::Delete {
            learner_id: "l-1",
            course_id: "c-2",
        };

        assert_eq!(insert.course_id(), "c-1");
        assert_eq!(delete.course_id(), "c-2");
    }
}
