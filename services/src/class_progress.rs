//! Class-wide module statistics.
//!
//! Everything here is computed over the students in scope only; rows that
//! belong to anyone else are dropped before counting.

use std::collections::{HashMap, HashSet};

use db::models::{lesson_completion, quiz_attempt, user};
use serde::Serialize;

use crate::progress::{
    attempt_stats, reduce_module_progress, rounded_percentage, ModuleDefinition, ModuleProgress,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonClassStats {
    pub id: i64,
    pub title: String,
    pub completed_by: usize,
    pub total_students: usize,
    pub completion_rate: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizClassStats {
    pub id: i64,
    pub title: String,
    /// Rounded mean of attempters' best scores; 0 when nobody attempted.
    pub average_score: i32,
    pub passed_count: usize,
    pub attempted_count: usize,
    pub total_students: usize,
    pub pass_rate: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentModuleProgress {
    pub student_id: i64,
    pub name: String,
    pub progress: ModuleProgress,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassModuleProgress {
    pub module_id: i64,
    pub title: String,
    pub total_students: usize,
    /// Lesson completions achieved over lesson completions possible.
    pub completion: u8,
    pub lessons: Vec<LessonClassStats>,
    pub quizzes: Vec<QuizClassStats>,
    pub students: Vec<StudentModuleProgress>,
    pub degraded: bool,
}

pub fn aggregate_class_progress(
    module: &ModuleDefinition,
    students: &[user::Model],
    completions: &[lesson_completion::Model],
    attempts: &[quiz_attempt::Model],
) -> ClassModuleProgress {
    let in_scope: HashSet<i64> = students.iter().map(|s| s.id).collect();
    let total_students = in_scope.len();

    let done: HashSet<(i64, i64)> = completions
        .iter()
        .filter(|c| in_scope.contains(&c.student_id))
        .map(|c| (c.lesson_id, c.student_id))
        .collect();

    let lessons: Vec<LessonClassStats> = module
        .lessons
        .iter()
        .map(|lesson| {
            let completed_by = in_scope
                .iter()
                .filter(|student_id| done.contains(&(lesson.id, **student_id)))
                .count();
            LessonClassStats {
                id: lesson.id,
                title: lesson.title.clone(),
                completed_by,
                total_students,
                completion_rate: rounded_percentage(completed_by, total_students),
            }
        })
        .collect();

    let stats = attempt_stats(attempts.iter().filter(|a| in_scope.contains(&a.student_id)));
    let mut best_by_quiz: HashMap<i64, Vec<i32>> = HashMap::new();
    for ((_, quiz_id), s) in &stats {
        if let Some(best) = s.best {
            best_by_quiz.entry(*quiz_id).or_default().push(best);
        }
    }

    let quizzes: Vec<QuizClassStats> = module
        .quizzes
        .iter()
        .map(|quiz| {
            let bests = best_by_quiz.get(&quiz.id).map(Vec::as_slice).unwrap_or(&[]);
            let attempted_count = bests.len();
            let passed_count = bests.iter().filter(|b| **b >= quiz.passing_score).count();
            let average_score = if attempted_count == 0 {
                0
            } else {
                let sum: i64 = bests.iter().map(|b| i64::from(*b)).sum();
                (sum as f64 / attempted_count as f64).round() as i32
            };
            QuizClassStats {
                id: quiz.id,
                title: quiz.title.clone(),
                average_score,
                passed_count,
                attempted_count,
                total_students,
                pass_rate: rounded_percentage(passed_count, attempted_count),
            }
        })
        .collect();

    let completion = if module.lessons.is_empty() {
        0
    } else {
        let achieved: usize = lessons.iter().map(|l| l.completed_by).sum();
        rounded_percentage(achieved, module.lessons.len() * total_students.max(1))
    };

    let students = students
        .iter()
        .map(|s| StudentModuleProgress {
            student_id: s.id,
            name: s.name.clone(),
            progress: reduce_module_progress(module, s.id, completions, attempts),
        })
        .collect();

    ClassModuleProgress {
        module_id: module.id,
        title: module.name.clone(),
        total_students,
        completion,
        lessons,
        quizzes,
        students,
        degraded: false,
    }
}
