//! Authoring and learner writes: modules, lessons, quizzes, completions and
//! attempts, plus the ordered deletes that keep references intact.
//!
//! All writes go through an [`AdminClient`]. Creation reports a [`SyncState`]
//! instead of an id it cannot vouch for: a draft either becomes `Synced` with
//! the stored row, or comes back as `WriteFailed` with the reason.

use chrono::Utc;
use db::models::{lesson, lesson_completion, module, quiz, quiz_attempt};
use db::AdminClient;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, DbErr, EntityTrait, QueryFilter,
    QuerySelect, QueryTrait, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use util::validation::format_validation_errors;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::progress::attempt_score;

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("{0}")]
    Validation(String),
    #[error("{what} {id} not found")]
    NotFound { what: &'static str, id: i64 },
    #[error("maximum of {max} attempts reached for this quiz")]
    AttemptLimit { max: u32 },
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

impl From<validator::ValidationErrors> for ContentError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ContentError::Validation(format_validation_errors(&errors))
    }
}

/// A write the client has asked for, identified before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft<D> {
    pub local_id: Uuid,
    pub input: D,
}

impl<D> Draft<D> {
    pub fn new(input: D) -> Self {
        Self::with_local_id(Uuid::new_v4(), input)
    }

    pub fn with_local_id(local_id: Uuid, input: D) -> Self {
        Self { local_id, input }
    }

    /// Marks the draft as queued but not yet written.
    pub fn pending<T>(self) -> SyncState<T, D> {
        SyncState::PendingWrite { draft: self }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SyncState<T, D> {
    Synced { item: T },
    PendingWrite { draft: Draft<D> },
    WriteFailed { draft: Draft<D>, reason: String },
}

impl<T, D> SyncState<T, D> {
    pub fn is_synced(&self) -> bool {
        matches!(self, SyncState::Synced { .. })
    }

    pub fn synced(&self) -> Option<&T> {
        match self {
            SyncState::Synced { item } => Some(item),
            _ => None,
        }
    }
}

fn settle<T, D>(draft: Draft<D>, result: Result<T, DbErr>) -> SyncState<T, D> {
    match result {
        Ok(item) => SyncState::Synced { item },
        Err(err) => {
            tracing::error!(local_id = %draft.local_id, error = %err, "content write failed");
            SyncState::WriteFailed {
                reason: err.to_string(),
                draft,
            }
        }
    }
}

fn non_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

fn four_filled_options(question: &QuestionInput) -> Result<(), ValidationError> {
    if question.options.len() != 4 {
        return Err(ValidationError::new("option_count")
            .with_message("Each question needs exactly 4 options".into()));
    }
    if question.options.iter().any(|o| o.trim().is_empty()) {
        return Err(ValidationError::new("blank_option")
            .with_message("Question options cannot be empty".into()));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewModule {
    pub subject_id: i64,
    #[validate(
        length(max = 200, message = "Module name must be at most 200 characters"),
        custom(function = "non_blank", message = "Module name is required")
    )]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewLesson {
    pub module_id: i64,
    #[validate(
        length(max = 200, message = "Lesson title must be at most 200 characters"),
        custom(function = "non_blank", message = "Lesson title is required")
    )]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub quiz_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "four_filled_options"))]
pub struct QuestionInput {
    #[validate(custom(function = "non_blank", message = "Question text is required"))]
    pub text: String,
    pub options: Vec<String>,
    #[validate(range(max = 3, message = "Correct option must be between 0 and 3"))]
    pub correct_option: u8,
    #[serde(default)]
    #[validate(url(message = "Image URL must be a valid URL"))]
    pub image_url: Option<String>,
}

impl From<QuestionInput> for quiz::QuizQuestion {
    fn from(q: QuestionInput) -> Self {
        quiz::QuizQuestion {
            text: q.text.trim().to_owned(),
            options: q.options.into_iter().map(|o| o.trim().to_owned()).collect(),
            correct_option: q.correct_option,
            image_url: q.image_url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewQuiz {
    pub module_id: i64,
    #[validate(
        length(max = 200, message = "Quiz title must be at most 200 characters"),
        custom(function = "non_blank", message = "Quiz title is required")
    )]
    pub title: String,
    #[validate(range(min = 0, max = 100, message = "Passing score must be between 0 and 100"))]
    pub passing_score: i32,
    #[validate(length(min = 1, message = "A quiz needs at least one question"), nested)]
    pub questions: Vec<QuestionInput>,
    /// Lesson of the same module to gate with this quiz.
    #[serde(default)]
    pub lesson_id: Option<i64>,
}

#[derive(Debug, Clone, Validate)]
struct QuestionSet {
    #[validate(length(min = 1, message = "A quiz needs at least one question"), nested)]
    questions: Vec<QuestionInput>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteStep {
    DeleteQuizAttempts,
    DeleteLessonCompletions,
    ClearLessonQuizRefs,
    DeleteQuizzes,
    DeleteLessons,
    DeleteModule,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    pub step: DeleteStep,
    pub rows_affected: u64,
}

/// Steps of a committed delete, in the order they ran.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeleteReport {
    pub steps: Vec<StepOutcome>,
}

impl DeleteReport {
    fn record(&mut self, step: DeleteStep, rows_affected: u64) {
        self.steps.push(StepOutcome {
            step,
            rows_affected,
        });
    }

    pub fn rows_for(&self, step: DeleteStep) -> u64 {
        self.steps
            .iter()
            .filter(|s| s.step == step)
            .map(|s| s.rows_affected)
            .sum()
    }
}

#[derive(Debug, Clone)]
pub struct ContentService {
    client: AdminClient,
    max_quiz_attempts: u32,
}

impl ContentService {
    pub fn new(client: AdminClient, max_quiz_attempts: u32) -> Self {
        Self {
            client,
            max_quiz_attempts,
        }
    }

    pub async fn create_module(
        &self,
        draft: Draft<NewModule>,
    ) -> Result<SyncState<module::Model, NewModule>, ContentError> {
        draft.input.validate()?;

        let d = &draft.input;
        let result = module::Model::create(
            self.client.conn(),
            d.subject_id,
            d.name.trim(),
            d.description.as_deref().map(str::trim).filter(|s| !s.is_empty()),
            d.sort_order,
        )
        .await;

        Ok(settle(draft, result))
    }

    pub async fn create_lesson(
        &self,
        draft: Draft<NewLesson>,
    ) -> Result<SyncState<lesson::Model, NewLesson>, ContentError> {
        draft.input.validate()?;

        if let Some(quiz_id) = draft.input.quiz_id {
            let quiz = quiz::Entity::find_by_id(quiz_id)
                .one(self.client.conn())
                .await?
                .ok_or(ContentError::NotFound { what: "quiz", id: quiz_id })?;
            if quiz.module_id != draft.input.module_id {
                return Err(ContentError::Validation(
                    "Quiz must belong to the lesson's module".into(),
                ));
            }
        }

        let d = &draft.input;
        let result = lesson::Model::create(
            self.client.conn(),
            d.module_id,
            d.title.trim(),
            &d.description,
            d.sort_order,
            d.quiz_id,
        )
        .await;

        Ok(settle(draft, result))
    }

    /// Creates the quiz and, if asked, binds it to a lesson in one transaction.
    pub async fn create_quiz(
        &self,
        draft: Draft<NewQuiz>,
    ) -> Result<SyncState<quiz::Model, NewQuiz>, ContentError> {
        draft.input.validate()?;

        let d = &draft.input;
        let questions: Vec<quiz::QuizQuestion> =
            d.questions.iter().cloned().map(Into::into).collect();

        let result = async {
            let txn = self.client.conn().begin().await?;
            let created =
                quiz::Model::create(&txn, d.module_id, d.title.trim(), d.passing_score, questions)
                    .await?;

            if let Some(lesson_id) = d.lesson_id {
                let bound = lesson::Entity::update_many()
                    .col_expr(lesson::Column::QuizId, Expr::value(created.id))
                    .col_expr(lesson::Column::UpdatedAt, Expr::value(Utc::now()))
                    .filter(lesson::Column::Id.eq(lesson_id))
                    .filter(lesson::Column::ModuleId.eq(d.module_id))
                    .exec(&txn)
                    .await?;
                if bound.rows_affected == 0 {
                    return Err(DbErr::RecordNotFound(format!(
                        "lesson {lesson_id} in module {}",
                        d.module_id
                    )));
                }
            }

            txn.commit().await?;
            Ok::<_, DbErr>(created)
        }
        .await;

        Ok(settle(draft, result))
    }

    /// Replaces a quiz's whole question set.
    pub async fn update_quiz_questions(
        &self,
        quiz_id: i64,
        questions: Vec<QuestionInput>,
    ) -> Result<quiz::Model, ContentError> {
        let set = QuestionSet { questions };
        set.validate()?;

        let existing = quiz::Entity::find_by_id(quiz_id)
            .one(self.client.conn())
            .await?
            .ok_or(ContentError::NotFound { what: "quiz", id: quiz_id })?;

        let questions = set.questions.into_iter().map(Into::into).collect();
        Ok(existing.replace_questions(self.client.conn(), questions).await?)
    }

    /// Points a lesson at a quiz of the same module, or clears the binding.
    pub async fn bind_lesson_quiz(
        &self,
        lesson_id: i64,
        quiz_id: Option<i64>,
    ) -> Result<lesson::Model, ContentError> {
        let db = self.client.conn();
        let row = lesson::Entity::find_by_id(lesson_id)
            .one(db)
            .await?
            .ok_or(ContentError::NotFound { what: "lesson", id: lesson_id })?;

        if let Some(quiz_id) = quiz_id {
            let quiz = quiz::Entity::find_by_id(quiz_id)
                .one(db)
                .await?
                .ok_or(ContentError::NotFound { what: "quiz", id: quiz_id })?;
            if quiz.module_id != row.module_id {
                return Err(ContentError::Validation(
                    "Quiz must belong to the lesson's module".into(),
                ));
            }
        }

        let mut active: lesson::ActiveModel = row.into();
        active.quiz_id = Set(quiz_id);
        active.updated_at = Set(Utc::now());
        Ok(active.update(db).await?)
    }

    /// Appends a completion. Repeats are stored; readers count presence.
    pub async fn record_lesson_completion(
        &self,
        student_id: i64,
        lesson_id: i64,
    ) -> Result<lesson_completion::Model, ContentError> {
        let db = self.client.conn();
        if lesson::Entity::find_by_id(lesson_id).one(db).await?.is_none() {
            return Err(ContentError::NotFound { what: "lesson", id: lesson_id });
        }

        let row = lesson_completion::Model::create(db, student_id, lesson_id).await?;
        tracing::info!(student_id, lesson_id, "lesson completed");
        Ok(row)
    }

    /// Scores one submission. `total_questions` must match the stored quiz, so a
    /// client cannot inflate a score by shrinking the denominator.
    pub async fn record_quiz_attempt(
        &self,
        student_id: i64,
        quiz_id: i64,
        correct_answers: u32,
        total_questions: u32,
    ) -> Result<quiz_attempt::Model, ContentError> {
        let txn = self.client.conn().begin().await?;

        let quiz = quiz::Entity::find_by_id(quiz_id)
            .one(&txn)
            .await?
            .ok_or(ContentError::NotFound { what: "quiz", id: quiz_id })?;

        // Scores are only meaningful against the stored question count.
        if quiz.total_questions <= 0 {
            return Err(ContentError::Validation("Quiz has no questions".into()));
        }
        if i64::from(total_questions) != i64::from(quiz.total_questions) {
            return Err(ContentError::Validation(format!(
                "Quiz has {} questions, got {total_questions}",
                quiz.total_questions
            )));
        }
        if correct_answers > total_questions {
            return Err(ContentError::Validation(
                "Correct answers must be between 0 and the number of questions".into(),
            ));
        }

        let previous = quiz_attempt::Model::count_for(&txn, student_id, quiz_id).await?;
        if previous >= u64::from(self.max_quiz_attempts) {
            return Err(ContentError::AttemptLimit {
                max: self.max_quiz_attempts,
            });
        }

        let score = attempt_score(correct_answers, total_questions);
        let attempt = quiz_attempt::Model::create(
            &txn,
            student_id,
            quiz_id,
            previous as i32 + 1,
            Some(score),
            correct_answers as i32,
            total_questions as i32,
        )
        .await?;
        txn.commit().await?;

        tracing::info!(
            student_id,
            quiz_id,
            score,
            attempt = attempt.attempt_number,
            "quiz attempt recorded"
        );
        Ok(attempt)
    }

    /// Lesson back-references, then attempts, then the quiz.
    pub async fn delete_quiz(&self, quiz_id: i64) -> Result<DeleteReport, ContentError> {
        let txn = self.client.conn().begin().await?;
        let outcome = delete_quiz_steps(&txn, quiz_id).await;
        finish(txn, outcome, "quiz", quiz_id).await
    }

    /// Completions, then the lesson.
    pub async fn delete_lesson(&self, lesson_id: i64) -> Result<DeleteReport, ContentError> {
        let txn = self.client.conn().begin().await?;
        let outcome = delete_lesson_steps(&txn, lesson_id).await;
        finish(txn, outcome, "lesson", lesson_id).await
    }

    /// Attempts, completions, quiz back-references, quizzes, lessons, module.
    pub async fn delete_module(&self, module_id: i64) -> Result<DeleteReport, ContentError> {
        let txn = self.client.conn().begin().await?;
        let outcome = delete_module_steps(&txn, module_id).await;
        finish(txn, outcome, "module", module_id).await
    }
}

async fn finish(
    txn: DatabaseTransaction,
    outcome: Result<DeleteReport, ContentError>,
    what: &'static str,
    id: i64,
) -> Result<DeleteReport, ContentError> {
    match outcome {
        Ok(report) => {
            txn.commit().await?;
            tracing::info!(what, id, steps = report.steps.len(), "delete committed");
            Ok(report)
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::error!(what, id, error = %rollback_err, "rollback failed");
            }
            tracing::warn!(what, id, error = %err, "delete rolled back");
            Err(err)
        }
    }
}

async fn delete_quiz_steps(
    txn: &DatabaseTransaction,
    quiz_id: i64,
) -> Result<DeleteReport, ContentError> {
    if quiz::Entity::find_by_id(quiz_id).one(txn).await?.is_none() {
        return Err(ContentError::NotFound { what: "quiz", id: quiz_id });
    }

    let mut report = DeleteReport::default();

    let cleared = lesson::Entity::update_many()
        .col_expr(lesson::Column::QuizId, Expr::value(Option::<i64>::None))
        .filter(lesson::Column::QuizId.eq(quiz_id))
        .exec(txn)
        .await?;
    report.record(DeleteStep::ClearLessonQuizRefs, cleared.rows_affected);

    let attempts = quiz_attempt::Entity::delete_many()
        .filter(quiz_attempt::Column::QuizId.eq(quiz_id))
        .exec(txn)
        .await?;
    report.record(DeleteStep::DeleteQuizAttempts, attempts.rows_affected);

    let quizzes = quiz::Entity::delete_by_id(quiz_id).exec(txn).await?;
    report.record(DeleteStep::DeleteQuizzes, quizzes.rows_affected);

    Ok(report)
}

async fn delete_lesson_steps(
    txn: &DatabaseTransaction,
    lesson_id: i64,
) -> Result<DeleteReport, ContentError> {
    if lesson::Entity::find_by_id(lesson_id).one(txn).await?.is_none() {
        return Err(ContentError::NotFound { what: "lesson", id: lesson_id });
    }

    let mut report = DeleteReport::default();

    let completions = lesson_completion::Entity::delete_many()
        .filter(lesson_completion::Column::LessonId.eq(lesson_id))
        .exec(txn)
        .await?;
    report.record(DeleteStep::DeleteLessonCompletions, completions.rows_affected);

    let lessons = lesson::Entity::delete_by_id(lesson_id).exec(txn).await?;
    report.record(DeleteStep::DeleteLessons, lessons.rows_affected);

    Ok(report)
}

async fn delete_module_steps(
    txn: &DatabaseTransaction,
    module_id: i64,
) -> Result<DeleteReport, ContentError> {
    if module::Entity::find_by_id(module_id).one(txn).await?.is_none() {
        return Err(ContentError::NotFound { what: "module", id: module_id });
    }

    let quiz_ids = || {
        quiz::Entity::find()
            .select_only()
            .column(quiz::Column::Id)
            .filter(quiz::Column::ModuleId.eq(module_id))
            .as_query()
            .to_owned()
    };
    let lesson_ids = lesson::Entity::find()
        .select_only()
        .column(lesson::Column::Id)
        .filter(lesson::Column::ModuleId.eq(module_id))
        .as_query()
        .to_owned();

    let mut report = DeleteReport::default();

    let attempts = quiz_attempt::Entity::delete_many()
        .filter(quiz_attempt::Column::QuizId.in_subquery(quiz_ids()))
        .exec(txn)
        .await?;
    report.record(DeleteStep::DeleteQuizAttempts, attempts.rows_affected);

    let completions = lesson_completion::Entity::delete_many()
        .filter(lesson_completion::Column::LessonId.in_subquery(lesson_ids))
        .exec(txn)
        .await?;
    report.record(DeleteStep::DeleteLessonCompletions, completions.rows_affected);

    // Includes lessons of other modules that point at this module's quizzes.
    let cleared = lesson::Entity::update_many()
        .col_expr(lesson::Column::QuizId, Expr::value(Option::<i64>::None))
        .filter(lesson::Column::QuizId.in_subquery(quiz_ids()))
        .exec(txn)
        .await?;
    report.record(DeleteStep::ClearLessonQuizRefs, cleared.rows_affected);

    let quizzes = quiz::Entity::delete_many()
        .filter(quiz::Column::ModuleId.eq(module_id))
        .exec(txn)
        .await?;
    report.record(DeleteStep::DeleteQuizzes, quizzes.rows_affected);

    let lessons = lesson::Entity::delete_many()
        .filter(lesson::Column::ModuleId.eq(module_id))
        .exec(txn)
        .await?;
    report.record(DeleteStep::DeleteLessons, lessons.rows_affected);

    let modules = module::Entity::delete_by_id(module_id).exec(txn).await?;
    report.record(DeleteStep::DeleteModule, modules.rows_affected);

    Ok(report)
}
