use std::time::Duration;

use db::models::{lesson, lesson_completion, module, quiz, quiz_attempt, section, subject, user};
use db::test_utils::setup_test_clients;
use db::AdminClient;
use sea_orm::ConnectionTrait;
use services::fallback::{sample_modules, ModuleSource};
use services::fetchers::StudentScope;
use services::progress_service::ProgressService;

struct Fixture {
    service: ProgressService,
    admin: AdminClient,
    module: module::Model,
    lessons: Vec<lesson::Model>,
    quiz: quiz::Model,
    section: section::Model,
    students: Vec<user::Model>,
}

async fn fixture() -> Fixture {
    let (read, admin) = setup_test_clients().await;
    let db = admin.conn();

    let maths = subject::Model::create(db, "Mathematics").await.unwrap();
    let section = section::Model::create(db, "Grade 4 Blue", None).await.unwrap();
    let module = module::Model::create(db, maths.id, "Fractions", Some("Parts of a whole"), 1)
        .await
        .unwrap();
    let quiz = quiz::Model::create(db, module.id, "Fractions quiz", 70, vec![])
        .await
        .unwrap();
    let lessons = vec![
        lesson::Model::create(db, module.id, "Halves", "", 1, None).await.unwrap(),
        lesson::Model::create(db, module.id, "Quarters", "", 2, Some(quiz.id))
            .await
            .unwrap(),
    ];

    let mut students = Vec::new();
    for n in 1..=4 {
        students.push(
            user::Model::create(
                db,
                &format!("Student {n}"),
                &format!("student{n}@example.com"),
                user::Role::Student,
                Some(section.id),
            )
            .await
            .unwrap(),
        );
    }

    Fixture {
        service: ProgressService::new(read, Duration::from_secs(2)),
        admin,
        module,
        lessons,
        quiz,
        section,
        students,
    }
}

#[tokio::test]
async fn student_module_progress_reduces_live_rows() {
    let f = fixture().await;
    let db = f.admin.conn();
    let student = &f.students[0];

    lesson_completion::Model::create(db, student.id, f.lessons[0].id).await.unwrap();
    quiz_attempt::Model::create(db, student.id, f.quiz.id, 1, Some(60), 3, 5).await.unwrap();
    quiz_attempt::Model::create(db, student.id, f.quiz.id, 2, Some(85), 4, 5).await.unwrap();

    let progress = f
        .service
        .student_module_progress(student.id, f.module.id)
        .await
        .unwrap()
        .expect("module exists");

    assert_eq!(progress.completion, 67);
    assert_eq!(progress.completed_lesson_ids, vec![f.lessons[0].id]);
    assert!(!progress.degraded);

    let quizzes = progress.quizzes.unwrap();
    assert_eq!(quizzes.best_score, Some(85));
    assert_eq!(quizzes.attempts, 2);
}

#[tokio::test]
async fn missing_module_is_none() {
    let f = fixture().await;
    let result = f.service.student_module_progress(f.students[0].id, 9_999).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn class_progress_for_a_section() {
    let f = fixture().await;
    let db = f.admin.conn();

    for student in &f.students[..3] {
        lesson_completion::Model::create(db, student.id, f.lessons[0].id).await.unwrap();
    }
    for (student, score) in f.students.iter().zip([90, 60, 70]) {
        quiz_attempt::Model::create(db, student.id, f.quiz.id, 1, Some(score), 0, 5)
            .await
            .unwrap();
    }

    let class = f
        .service
        .class_module_progress(f.module.id, StudentScope::Section(f.section.id))
        .await
        .unwrap()
        .expect("module exists");

    assert_eq!(class.total_students, 4);
    assert_eq!(class.lessons[0].completion_rate, 75);
    assert_eq!(class.lessons[1].completion_rate, 0);
    // Three of eight possible lesson completions.
    assert_eq!(class.completion, 38);

    let quiz = &class.quizzes[0];
    assert_eq!(quiz.attempted_count, 3);
    assert_eq!(quiz.passed_count, 2);
    assert_eq!(quiz.pass_rate, 67);
    assert_eq!(quiz.average_score, 73);

    assert_eq!(class.students.len(), 4);
    assert!(!class.degraded);
}

#[tokio::test]
async fn class_progress_ignores_students_outside_the_scope() {
    let f = fixture().await;
    let db = f.admin.conn();

    let outsider =
        user::Model::create(db, "Visitor", "visitor@example.com", user::Role::Student, None)
            .await
            .unwrap();
    lesson_completion::Model::create(db, outsider.id, f.lessons[0].id).await.unwrap();

    let class = f
        .service
        .class_module_progress(f.module.id, StudentScope::Section(f.section.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(class.lessons[0].completed_by, 0);

    let everyone = f
        .service
        .class_module_progress(f.module.id, StudentScope::AllStudents)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(everyone.total_students, 5);
    assert_eq!(everyone.lessons[0].completed_by, 1);
}

#[tokio::test]
async fn subject_modules_are_live_when_the_store_answers() {
    let f = fixture().await;

    let listing = f.service.subject_modules("Mathematics").await;
    assert_eq!(listing.source, ModuleSource::Live);
    assert_eq!(listing.modules.len(), 1);
    assert_eq!(listing.modules[0].lessons.len(), 2);
    assert_eq!(listing.modules[0].quizzes[0].id, f.quiz.id);

    let unknown = f.service.subject_modules("Latin").await;
    assert_eq!(unknown.source, ModuleSource::Live);
    assert!(unknown.modules.is_empty());
    assert!(!unknown.degraded);
}

#[tokio::test]
async fn empty_subject_is_not_replaced_by_samples() {
    let (read, admin) = setup_test_clients().await;
    subject::Model::create(admin.conn(), "Science").await.unwrap();

    let service = ProgressService::new(read, Duration::from_secs(2));
    let listing = service.subject_modules("Science").await;

    assert_eq!(listing.source, ModuleSource::Live);
    assert!(listing.modules.is_empty());
}

#[tokio::test]
async fn unreadable_modules_fall_back_to_samples() {
    let (read, admin) = setup_test_clients().await;
    subject::Model::create(admin.conn(), "Mathematics").await.unwrap();
    admin
        .conn()
        .execute_unprepared("DROP TABLE modules")
        .await
        .unwrap();

    let service = ProgressService::new(read, Duration::from_secs(2));
    let listing = service.subject_modules("Mathematics").await;

    assert_eq!(listing.source, ModuleSource::Sample);
    assert!(listing.degraded);
    assert_eq!(listing.modules, sample_modules("Mathematics"));

    let progress = service.student_subject_progress(1, "Mathematics").await;
    assert_eq!(progress.source, ModuleSource::Sample);
    assert!(progress.modules.iter().all(|m| m.completion == 0 && m.degraded));
}

#[tokio::test]
async fn lost_attempt_table_degrades_instead_of_failing() {
    let f = fixture().await;
    let db = f.admin.conn();
    let student = &f.students[0];

    lesson_completion::Model::create(db, student.id, f.lessons[0].id).await.unwrap();
    db.execute_unprepared("DROP TABLE quiz_attempts").await.unwrap();

    let progress = f
        .service
        .student_module_progress(student.id, f.module.id)
        .await
        .unwrap()
        .unwrap();

    assert!(progress.degraded);
    assert_eq!(progress.lessons_completed, 1);
    assert_eq!(progress.quizzes_completed, 0);
}

#[tokio::test]
async fn subject_progress_covers_every_module() {
    let f = fixture().await;
    let db = f.admin.conn();
    let student = &f.students[1];

    let second = module::Model::create(db, f.module.subject_id, "Decimals", None, 2)
        .await
        .unwrap();
    let tenths = lesson::Model::create(db, second.id, "Tenths", "", 1, None).await.unwrap();
    lesson_completion::Model::create(db, student.id, tenths.id).await.unwrap();

    let progress = f.service.student_subject_progress(student.id, "Mathematics").await;

    assert_eq!(progress.source, ModuleSource::Live);
    assert_eq!(progress.modules.len(), 2);
    assert_eq!(progress.modules[0].completion, 0);
    assert_eq!(progress.modules[1].completion, 100);
    assert!(!progress.degraded);
}
