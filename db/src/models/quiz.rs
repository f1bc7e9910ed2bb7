use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::NotSet, FromJsonQueryResult, Set};
use serde::{Deserialize, Serialize};

/// A scored multiple-choice assessment belonging to one module.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "quizzes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub module_id: i64,
    pub title: String,
    /// Kept in step with `questions_data` on every write.
    pub total_questions: i32,
    /// Minimum best score (0-100) that counts as a pass.
    pub passing_score: i32,
    #[sea_orm(column_type = "Json")]
    pub questions_data: QuizQuestions,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One multiple-choice question: four options, one correct.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub text: String,
    pub options: Vec<String>,
    /// Index into `options`.
    pub correct_option: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Ordered question list stored as a JSON column.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct QuizQuestions(pub Vec<QuizQuestion>);

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::module::Entity",
        from = "Column::ModuleId",
        to = "super::module::Column::Id"
    )]
    Module,

    #[sea_orm(has_many = "super::quiz_attempt::Entity")]
    Attempts,
}

impl Related<super::module::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Module.def()
    }
}

impl Related<super::quiz_attempt::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attempts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        module_id: i64,
        title: &str,
        passing_score: i32,
        questions: Vec<QuizQuestion>,
    ) -> Result<Self, DbErr> {
        let now = Utc::now();
        ActiveModel {
            id: NotSet,
            module_id: Set(module_id),
            title: Set(title.to_owned()),
            total_questions: Set(questions.len() as i32),
            passing_score: Set(passing_score),
            questions_data: Set(QuizQuestions(questions)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
    }

    /// Replaces the whole question set; quizzes are never edited question by question.
    pub async fn replace_questions<C: ConnectionTrait>(
        self,
        db: &C,
        questions: Vec<QuizQuestion>,
    ) -> Result<Self, DbErr> {
        let mut active: ActiveModel = self.into();
        active.total_questions = Set(questions.len() as i32);
        active.questions_data = Set(QuizQuestions(questions));
        active.updated_at = Set(Utc::now());
        active.update(db).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{module, subject};
    use crate::test_utils::setup_test_db;

    fn question(text: &str, correct_option: u8) -> QuizQuestion {
        QuizQuestion {
            text: text.to_owned(),
            options: vec!["1".into(), "2".into(), "3".into(), "4".into()],
            correct_option,
            image_url: None,
        }
    }

    #[tokio::test]
    async fn questions_survive_the_json_column() {
        let db = setup_test_db().await;
        let maths = subject::Model::create(&db, "Mathematics").await.unwrap();
        let fractions = module::Model::create(&db, maths.id, "Fractions", None, 1)
            .await
            .unwrap();

        let quiz = Model::create(&db, fractions.id, "Check", 70, vec![question("Q1", 2)])
            .await
            .unwrap();
        assert_eq!(quiz.total_questions, 1);

        let replaced = quiz
            .replace_questions(&db, vec![question("Q1", 0), question("Q2", 3)])
            .await
            .unwrap();
        assert_eq!(replaced.total_questions, 2);

        let stored = Entity::find_by_id(replaced.id).one(&db).await.unwrap().unwrap();
        assert_eq!(stored.questions_data.0.len(), 2);
        assert_eq!(stored.questions_data.0[1].text, "Q2");
        assert_eq!(stored.questions_data.0[1].correct_option, 3);
    }
}
