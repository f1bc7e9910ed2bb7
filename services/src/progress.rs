//! Per-student module progress.
//!
//! [`reduce_module_progress`] is pure: it takes a module definition plus the
//! completion and attempt rows already fetched and derives the counts,
//! percentages and best-score summary for one student. It never fails; missing
//! rows simply count as "not done".

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use db::models::{lesson, lesson_completion, module, quiz, quiz_attempt};
use serde::Serialize;

/// `round(100 * part / whole)`, clamped to `0..=100`. Zero when `whole == 0`.
pub fn rounded_percentage(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    let pct = (part as f64 * 100.0 / whole as f64).round();
    pct.clamp(0.0, 100.0) as u8
}

/// `round(100 * correct / total)` for a single quiz submission.
pub fn attempt_score(correct: u32, total: u32) -> i32 {
    rounded_percentage(correct as usize, total as usize) as i32
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LessonDefinition {
    pub id: i64,
    pub title: String,
    pub sort_order: i32,
    pub quiz_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizDefinition {
    pub id: i64,
    pub title: String,
    pub total_questions: i32,
    pub passing_score: i32,
}

/// A module with its lessons (in display order) and quizzes resolved.
///
/// Built either from store rows or from the static sample table; sample
/// definitions have negative ids and no subject id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleDefinition {
    pub id: i64,
    pub subject_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub sort_order: i32,
    pub lessons: Vec<LessonDefinition>,
    pub quizzes: Vec<QuizDefinition>,
}

impl From<&lesson::Model> for LessonDefinition {
    fn from(row: &lesson::Model) -> Self {
        Self {
            id: row.id,
            title: row.title.clone(),
            sort_order: row.sort_order,
            quiz_id: row.quiz_id,
        }
    }
}

impl From<&quiz::Model> for QuizDefinition {
    fn from(row: &quiz::Model) -> Self {
        Self {
            id: row.id,
            title: row.title.clone(),
            total_questions: row.total_questions,
            passing_score: row.passing_score,
        }
    }
}

impl ModuleDefinition {
    /// Picks this module's lessons and quizzes out of rows fetched for many modules.
    pub fn from_rows(
        module: &module::Model,
        lessons: &[lesson::Model],
        quizzes: &[quiz::Model],
    ) -> Self {
        let mut own_lessons: Vec<&lesson::Model> =
            lessons.iter().filter(|l| l.module_id == module.id).collect();
        own_lessons.sort_by_key(|l| (l.sort_order, l.id));

        Self {
            id: module.id,
            subject_id: Some(module.subject_id),
            name: module.name.clone(),
            description: module.description.clone(),
            sort_order: module.sort_order,
            lessons: own_lessons.into_iter().map(LessonDefinition::from).collect(),
            quizzes: quizzes
                .iter()
                .filter(|q| q.module_id == module.id)
                .map(QuizDefinition::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizDetail {
    pub quiz_id: i64,
    pub quiz_title: String,
    pub best_score: Option<i32>,
    pub attempts: usize,
    pub last_attempt: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizSummary {
    pub best_score: Option<i32>,
    pub attempts: usize,
    pub quiz_count: usize,
    pub completed_count: usize,
    pub details: Vec<QuizDetail>,
}

/// One student's progress through one module.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleProgress {
    pub id: i64,
    pub title: String,
    pub completion: u8,
    pub lessons_completed: usize,
    pub total_lessons: usize,
    pub completed_lesson_ids: Vec<i64>,
    pub quizzes_completed: usize,
    pub total_quizzes: usize,
    /// `None` when the module has no quizzes.
    pub quizzes: Option<QuizSummary>,
    /// Set when any input fetch failed and was replaced by an empty set.
    pub degraded: bool,
}

/// Scored attempts of one student on one quiz, folded.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct AttemptStats {
    pub best: Option<i32>,
    pub count: usize,
    pub last: Option<DateTime<Utc>>,
}

impl AttemptStats {
    fn record(&mut self, score: i32, at: DateTime<Utc>) {
        self.best = Some(self.best.map_or(score, |best| best.max(score)));
        self.count += 1;
        self.last = Some(self.last.map_or(at, |last| last.max(at)));
    }
}

/// Folds scored attempts per `(student_id, quiz_id)`. Unscored attempts are skipped.
pub(crate) fn attempt_stats<'a, I>(attempts: I) -> HashMap<(i64, i64), AttemptStats>
where
    I: IntoIterator<Item = &'a quiz_attempt::Model>,
{
    let mut stats: HashMap<(i64, i64), AttemptStats> = HashMap::new();
    for attempt in attempts {
        if let Some(score) = attempt.score {
            stats
                .entry((attempt.student_id, attempt.quiz_id))
                .or_default()
                .record(score, attempt.completed_at);
        }
    }
    stats
}

pub fn reduce_module_progress(
    module: &ModuleDefinition,
    student_id: i64,
    completions: &[lesson_completion::Model],
    attempts: &[quiz_attempt::Model],
) -> ModuleProgress {
    let completed: BTreeSet<i64> = completions
        .iter()
        .filter(|c| c.student_id == student_id)
        .map(|c| c.lesson_id)
        .collect();

    // Display order, and only lessons that belong to this module.
    let completed_lesson_ids: Vec<i64> = module
        .lessons
        .iter()
        .filter(|l| completed.contains(&l.id))
        .map(|l| l.id)
        .collect();

    let stats = attempt_stats(attempts.iter().filter(|a| a.student_id == student_id));

    let details: Vec<QuizDetail> = module
        .quizzes
        .iter()
        .map(|q| {
            let s = stats.get(&(student_id, q.id)).copied().unwrap_or_default();
            QuizDetail {
                quiz_id: q.id,
                quiz_title: q.title.clone(),
                best_score: s.best,
                attempts: s.count,
                last_attempt: s.last,
            }
        })
        .collect();

    let quizzes_completed = details.iter().filter(|d| d.best_score.is_some()).count();
    let total_lessons = module.lessons.len();
    let total_quizzes = module.quizzes.len();

    let quizzes = (!details.is_empty()).then(|| QuizSummary {
        best_score: details.iter().filter_map(|d| d.best_score).max(),
        attempts: details.iter().map(|d| d.attempts).sum(),
        quiz_count: total_quizzes,
        completed_count: quizzes_completed,
        details,
    });

    ModuleProgress {
        id: module.id,
        title: module.name.clone(),
        completion: rounded_percentage(
            completed_lesson_ids.len() + quizzes_completed,
            total_lessons + total_quizzes,
        ),
        lessons_completed: completed_lesson_ids.len(),
        total_lessons,
        completed_lesson_ids,
        quizzes_completed,
        total_quizzes,
        quizzes,
        degraded: false,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    pub(crate) fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, minute, 0).unwrap()
    }

    pub(crate) fn lesson_def(id: i64, title: &str) -> LessonDefinition {
        LessonDefinition {
            id,
            title: title.into(),
            sort_order: id as i32,
            quiz_id: None,
        }
    }

    pub(crate) fn quiz_def(id: i64, title: &str, passing_score: i32) -> QuizDefinition {
        QuizDefinition {
            id,
            title: title.into(),
            total_questions: 10,
            passing_score,
        }
    }

    pub(crate) fn module_def(
        lessons: Vec<LessonDefinition>,
        quizzes: Vec<QuizDefinition>,
    ) -> ModuleDefinition {
        ModuleDefinition {
            id: 1,
            subject_id: Some(1),
            name: "Fractions".into(),
            description: None,
            sort_order: 1,
            lessons,
            quizzes,
        }
    }

    pub(crate) fn completion(id: i64, student_id: i64, lesson_id: i64) -> lesson_completion::Model {
        lesson_completion::Model {
            id,
            student_id,
            lesson_id,
            completed_at: at(id as u32 % 60),
        }
    }

    pub(crate) fn attempt(
        id: i64,
        student_id: i64,
        quiz_id: i64,
        score: Option<i32>,
        minute: u32,
    ) -> quiz_attempt::Model {
        quiz_attempt::Model {
            id,
            student_id,
            quiz_id,
            attempt_number: id as i32,
            score,
            correct_answers: 0,
            total_questions: 10,
            completed_at: at(minute),
        }
    }

    #[test]
    fn single_student_scenario() {
        let module = module_def(
            vec![lesson_def(10, "Halves"), lesson_def(11, "Quarters")],
            vec![quiz_def(20, "Fractions quiz", 70)],
        );
        let completions = vec![completion(1, 7, 10)];
        let attempts = vec![attempt(1, 7, 20, Some(60), 1), attempt(2, 7, 20, Some(85), 2)];

        let progress = reduce_module_progress(&module, 7, &completions, &attempts);

        assert_eq!(progress.completion, 67);
        assert_eq!(progress.lessons_completed, 1);
        assert_eq!(progress.completed_lesson_ids, vec![10]);
        assert_eq!(progress.quizzes_completed, 1);

        let quizzes = progress.quizzes.expect("module has a quiz");
        assert_eq!(quizzes.best_score, Some(85));
        assert_eq!(quizzes.attempts, 2);
        assert_eq!(quizzes.details[0].last_attempt, Some(at(2)));
    }

    #[test]
    fn empty_module_is_zero_percent_with_no_quiz_summary() {
        let progress = reduce_module_progress(&module_def(vec![], vec![]), 1, &[], &[]);
        assert_eq!(progress.completion, 0);
        assert_eq!(progress.total_lessons, 0);
        assert!(progress.quizzes.is_none());
    }

    #[test]
    fn completion_stays_within_bounds() {
        let lessons: Vec<_> = (1..=3).map(|id| lesson_def(id, "L")).collect();
        let module = module_def(lessons, vec![quiz_def(9, "Q", 50)]);

        // Rows for lessons of other modules must not push completion past 100.
        let completions: Vec<_> = (1..=8).map(|id| completion(id, 1, id)).collect();
        let attempts = vec![attempt(1, 1, 9, Some(100), 1)];

        let progress = reduce_module_progress(&module, 1, &completions, &attempts);
        assert_eq!(progress.completion, 100);
        assert_eq!(progress.lessons_completed, 3);

        let none = reduce_module_progress(&module, 2, &completions, &attempts);
        assert_eq!(none.completion, 0);
    }

    #[test]
    fn best_score_never_drops_after_a_worse_attempt() {
        let module = module_def(vec![], vec![quiz_def(5, "Q", 50)]);
        let mut attempts = vec![attempt(1, 1, 5, Some(90), 1)];
        let before = reduce_module_progress(&module, 1, &[], &attempts);

        attempts.push(attempt(2, 1, 5, Some(40), 2));
        let after = reduce_module_progress(&module, 1, &[], &attempts);

        let best = |p: &ModuleProgress| p.quizzes.as_ref().and_then(|q| q.best_score);
        assert_eq!(best(&before), Some(90));
        assert_eq!(best(&after), Some(90));
        assert_eq!(after.quizzes.unwrap().attempts, 2);
    }

    #[test]
    fn duplicate_completions_count_once() {
        let module = module_def(vec![lesson_def(1, "A"), lesson_def(2, "B")], vec![]);
        let once = reduce_module_progress(&module, 3, &[completion(1, 3, 1)], &[]);
        let twice = reduce_module_progress(
            &module,
            3,
            &[completion(1, 3, 1), completion(2, 3, 1)],
            &[],
        );
        assert_eq!(once.lessons_completed, twice.lessons_completed);
        assert_eq!(twice.completion, 50);
    }

    #[test]
    fn unattempted_and_unscored_quizzes_are_not_completed() {
        let module = module_def(vec![], vec![quiz_def(1, "Scored", 50), quiz_def(2, "Never", 50)]);
        let attempts = vec![attempt(1, 1, 1, None, 1)];

        let progress = reduce_module_progress(&module, 1, &[], &attempts);
        let quizzes = progress.quizzes.unwrap();

        assert_eq!(quizzes.completed_count, 0);
        assert_eq!(quizzes.best_score, None);
        assert_eq!(quizzes.details.len(), 2);
        assert!(quizzes.details.iter().all(|d| d.attempts == 0 && d.last_attempt.is_none()));
    }

    #[test]
    fn other_students_rows_are_ignored() {
        let module = module_def(vec![lesson_def(1, "A")], vec![quiz_def(2, "Q", 50)]);
        let progress = reduce_module_progress(
            &module,
            1,
            &[completion(1, 2, 1)],
            &[attempt(1, 2, 2, Some(100), 1)],
        );
        assert_eq!(progress.completion, 0);
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        assert_eq!(rounded_percentage(2, 3), 67);
        assert_eq!(rounded_percentage(1, 8), 13);
        assert_eq!(rounded_percentage(1, 3), 33);
        assert_eq!(rounded_percentage(5, 0), 0);
        assert_eq!(attempt_score(7, 9), 78);
    }
}
