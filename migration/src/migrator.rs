use sea_orm_migration::prelude::*;

use crate::migrations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(migrations::m202510010001_create_subjects::Migration),
            Box::new(migrations::m202510010002_create_sections::Migration),
            Box::new(migrations::m202510010003_create_users::Migration),
            Box::new(migrations::m202510010004_create_modules::Migration),
            Box::new(migrations::m202510010005_create_quizzes::Migration),
            Box::new(migrations::m202510010006_create_lessons::Migration),
            Box::new(migrations::m202510010007_create_lesson_completions::Migration),
            Box::new(migrations::m202510010008_create_quiz_attempts::Migration),
            Box::new(migrations::m202510010009_create_password_reset_tokens::Migration),
        ]
    }
}
