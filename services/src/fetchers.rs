//! Record fetchers: the narrow, read-only queries the progress pipeline is
//! built on.
//!
//! Every fetch goes through a [`ReadClient`] and is bounded by the fetcher's
//! timeout. Fetches return a plain `Result`; callers that prefer an empty
//! collection over an error opt in with [`Degrade::degrade`].

use std::future::Future;
use std::time::Duration;

use db::ReadClient;
use db::models::{lesson, lesson_completion, module, quiz, quiz_attempt, subject, user};
use sea_orm::{
    ColumnTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect, QueryTrait,
};

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("store error while fetching {what}: {source}")]
    Store {
        what: &'static str,
        #[source]
        source: DbErr,
    },
    #[error("fetching {what} timed out after {after_ms}ms")]
    Timeout { what: &'static str, after_ms: u64 },
}

pub type FetchResult<T> = Result<T, FetchError>;

/// Rows from a fetch that was allowed to fail.
///
/// `degraded` is set when the fetch failed and `rows` is the empty
/// substitute, so an empty live result and a failure stay distinguishable.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub rows: Vec<T>,
    pub degraded: bool,
}

impl<T> Fetched<T> {
    pub fn live(rows: Vec<T>) -> Self {
        Self {
            rows,
            degraded: false,
        }
    }

    pub fn degraded() -> Self {
        Self {
            rows: Vec::new(),
            degraded: true,
        }
    }
}

pub trait Degrade<T> {
    /// Swaps a failure for an empty collection, logging `context`.
    fn degrade(self, context: &str) -> Fetched<T>;
}

impl<T> Degrade<T> for FetchResult<Vec<T>> {
    fn degrade(self, context: &str) -> Fetched<T> {
        match self {
            Ok(rows) => Fetched::live(rows),
            Err(err) => {
                tracing::warn!(error = %err, context, "fetch failed, continuing with empty rows");
                Fetched::degraded()
            }
        }
    }
}

/// Runs a store future under `limit`, tagging both failure kinds with `what`.
pub async fn with_timeout<T, F>(limit: Duration, what: &'static str, fut: F) -> FetchResult<T>
where
    F: Future<Output = Result<T, DbErr>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(source)) => Err(FetchError::Store { what, source }),
        Err(_) => Err(FetchError::Timeout {
            what,
            after_ms: limit.as_millis() as u64,
        }),
    }
}

/// Which students a class-wide view covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudentScope {
    Section(i64),
    AllStudents,
    Explicit(Vec<i64>),
}

#[derive(Debug, Clone)]
pub struct RecordFetcher {
    client: ReadClient,
    timeout: Duration,
}

impl RecordFetcher {
    pub fn new(client: ReadClient, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn fetch_subject_by_name(&self, name: &str) -> FetchResult<Option<subject::Model>> {
        with_timeout(
            self.timeout,
            "subject",
            subject::Model::find_by_name(self.client.conn(), name),
        )
        .await
    }

    pub async fn fetch_modules_for_subject(
        &self,
        subject_id: i64,
    ) -> FetchResult<Vec<module::Model>> {
        with_timeout(
            self.timeout,
            "modules",
            module::Model::find_by_subject(self.client.conn(), subject_id),
        )
        .await
    }

    pub async fn fetch_module(&self, module_id: i64) -> FetchResult<Option<module::Model>> {
        with_timeout(
            self.timeout,
            "module",
            module::Entity::find_by_id(module_id).one(self.client.conn()),
        )
        .await
    }

    pub async fn fetch_lessons(&self, module_ids: &[i64]) -> FetchResult<Vec<lesson::Model>> {
        if module_ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = lesson::Entity::find()
            .filter(lesson::Column::ModuleId.is_in(module_ids.to_vec()))
            .order_by_asc(lesson::Column::ModuleId)
            .order_by_asc(lesson::Column::SortOrder)
            .order_by_asc(lesson::Column::Id);

        with_timeout(self.timeout, "lessons", query.all(self.client.conn())).await
    }

    pub async fn fetch_quizzes(&self, module_ids: &[i64]) -> FetchResult<Vec<quiz::Model>> {
        if module_ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = quiz::Entity::find()
            .filter(quiz::Column::ModuleId.is_in(module_ids.to_vec()))
            .order_by_asc(quiz::Column::ModuleId)
            .order_by_asc(quiz::Column::Id);

        with_timeout(self.timeout, "quizzes", query.all(self.client.conn())).await
    }

    /// Completions by `student_ids` of any lesson in `module_ids`.
    pub async fn fetch_lesson_completions(
        &self,
        student_ids: &[i64],
        module_ids: &[i64],
    ) -> FetchResult<Vec<lesson_completion::Model>> {
        if student_ids.is_empty() || module_ids.is_empty() {
            return Ok(Vec::new());
        }

        let lesson_ids = lesson::Entity::find()
            .select_only()
            .column(lesson::Column::Id)
            .filter(lesson::Column::ModuleId.is_in(module_ids.to_vec()));

        let query = lesson_completion::Entity::find()
            .filter(lesson_completion::Column::StudentId.is_in(student_ids.to_vec()))
            .filter(
                lesson_completion::Column::LessonId.in_subquery(lesson_ids.as_query().to_owned()),
            )
            .order_by_asc(lesson_completion::Column::CompletedAt);

        with_timeout(self.timeout, "lesson completions", query.all(self.client.conn())).await
    }

    /// Scored attempts by `student_ids` on any quiz in `module_ids`.
    pub async fn fetch_quiz_attempts(
        &self,
        student_ids: &[i64],
        module_ids: &[i64],
    ) -> FetchResult<Vec<quiz_attempt::Model>> {
        if student_ids.is_empty() || module_ids.is_empty() {
            return Ok(Vec::new());
        }

        let quiz_ids = quiz::Entity::find()
            .select_only()
            .column(quiz::Column::Id)
            .filter(quiz::Column::ModuleId.is_in(module_ids.to_vec()));

        let query = quiz_attempt::Entity::find()
            .filter(quiz_attempt::Column::StudentId.is_in(student_ids.to_vec()))
            .filter(quiz_attempt::Column::QuizId.in_subquery(quiz_ids.as_query().to_owned()))
            .filter(quiz_attempt::Column::Score.is_not_null())
            .order_by_asc(quiz_attempt::Column::CompletedAt);

        with_timeout(self.timeout, "quiz attempts", query.all(self.client.conn())).await
    }

    pub async fn fetch_students(&self, scope: &StudentScope) -> FetchResult<Vec<user::Model>> {
        let mut query = user::Entity::find().filter(user::Column::Role.eq(user::Role::Student));

        query = match scope {
            StudentScope::Section(section_id) => {
                query.filter(user::Column::SectionId.eq(*section_id))
            }
            StudentScope::AllStudents => query,
            StudentScope::Explicit(ids) if ids.is_empty() => return Ok(Vec::new()),
            StudentScope::Explicit(ids) => query.filter(user::Column::Id.is_in(ids.clone())),
        };

        with_timeout(
            self.timeout,
            "students",
            query.order_by_asc(user::Column::Id).all(self.client.conn()),
        )
        .await
    }
}
