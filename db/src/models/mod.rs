pub mod lesson;
pub mod lesson_completion;
pub mod module;
pub mod password_reset_token;
pub mod quiz;
pub mod quiz_attempt;
pub mod section;
pub mod subject;
pub mod user;

pub use lesson::Entity as Lesson;
pub use lesson_completion::Entity as LessonCompletion;
pub use module::Entity as Module;
pub use password_reset_token::Entity as PasswordResetToken;
pub use quiz::Entity as Quiz;
pub use quiz_attempt::Entity as QuizAttempt;
pub use section::Entity as Section;
pub use subject::Entity as Subject;
pub use user::Entity as User;
