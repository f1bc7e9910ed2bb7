use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::NotSet, PaginatorTrait, Set};
use serde::{Deserialize, Serialize};

/// One scored submission of a quiz by a student. Immutable once written.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "quiz_attempts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub student_id: i64,
    pub quiz_id: i64,
    /// 1-based, per (student, quiz).
    pub attempt_number: i32,
    /// Percentage 0-100. `None` for an attempt that was never scored.
    pub score: Option<i32>,
    pub correct_answers: i32,
    pub total_questions: i32,
    pub completed_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::quiz::Entity",
        from = "Column::QuizId",
        to = "super::quiz::Column::Id"
    )]
    Quiz,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::StudentId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Student,
}

impl Related<super::quiz::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Quiz.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        student_id: i64,
        quiz_id: i64,
        attempt_number: i32,
        score: Option<i32>,
        correct_answers: i32,
        total_questions: i32,
    ) -> Result<Self, DbErr> {
        ActiveModel {
            id: NotSet,
            student_id: Set(student_id),
            quiz_id: Set(quiz_id),
            attempt_number: Set(attempt_number),
            score: Set(score),
            correct_answers: Set(correct_answers),
            total_questions: Set(total_questions),
            completed_at: Set(Utc::now()),
        }
        .insert(db)
        .await
    }

    /// Number of attempts a student has made on a quiz, scored or not.
    pub async fn count_for<C: ConnectionTrait>(
        db: &C,
        student_id: i64,
        quiz_id: i64,
    ) -> Result<u64, DbErr> {
        Entity::find()
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::QuizId.eq(quiz_id))
            .count(db)
            .await
    }
}
