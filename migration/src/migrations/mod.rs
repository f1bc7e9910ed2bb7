pub mod m202510010001_create_subjects;
pub mod m202510010002_create_sections;
pub mod m202510010003_create_users;
pub mod m202510010004_create_modules;
pub mod m202510010005_create_quizzes;
pub mod m202510010006_create_lessons;
pub mod m202510010007_create_lesson_completions;
pub mod m202510010008_create_quiz_attempts;
pub mod m202510010009_create_password_reset_tokens;
