//! Async drivers for the progress views.
//!
//! Each driver fetches what it needs (concurrently where the fetches are
//! independent), degrades failed fetches to empty sets, and hands the rows to
//! the pure reducers. Only a failed *module lookup* escapes as an error;
//! everything downstream of it degrades.

use std::time::Duration;

use db::ReadClient;
use serde::Serialize;

use crate::class_progress::{aggregate_class_progress, ClassModuleProgress};
use crate::fallback::{ModuleSource, SubjectModules};
use crate::fetchers::{Degrade, FetchResult, RecordFetcher, StudentScope};
use crate::progress::{reduce_module_progress, ModuleDefinition, ModuleProgress};

/// Every module of a subject reduced for one student.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectProgress {
    pub subject: String,
    pub student_id: i64,
    pub source: ModuleSource,
    pub modules: Vec<ModuleProgress>,
    pub degraded: bool,
}

#[derive(Debug, Clone)]
pub struct ProgressService {
    fetcher: RecordFetcher,
}

impl ProgressService {
    pub fn new(client: ReadClient, fetch_timeout: Duration) -> Self {
        Self {
            fetcher: RecordFetcher::new(client, fetch_timeout),
        }
    }

    /// Modules of `subject`, falling back to the sample set if the store is unreadable.
    ///
    /// An unknown subject or a subject without modules is a live, empty result.
    pub async fn subject_modules(&self, subject: &str) -> SubjectModules {
        let found = match self.fetcher.fetch_subject_by_name(subject).await {
            Ok(found) => found,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    subject,
                    "subject lookup failed, serving sample modules"
                );
                return SubjectModules::sample(subject);
            }
        };

        let Some(subject_row) = found else {
            tracing::debug!(subject, "unknown subject");
            return SubjectModules::live(subject, Vec::new(), false);
        };

        let modules = match self.fetcher.fetch_modules_for_subject(subject_row.id).await {
            Ok(modules) => modules,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    subject,
                    "module fetch failed, serving sample modules"
                );
                return SubjectModules::sample(subject);
            }
        };

        if modules.is_empty() {
            return SubjectModules::live(subject, Vec::new(), false);
        }

        let module_ids: Vec<i64> = modules.iter().map(|m| m.id).collect();
        let (lessons, quizzes) = tokio::join!(
            self.fetcher.fetch_lessons(&module_ids),
            self.fetcher.fetch_quizzes(&module_ids),
        );
        let lessons = lessons.degrade("lesson definitions");
        let quizzes = quizzes.degrade("quiz definitions");

        let definitions = modules
            .iter()
            .map(|m| ModuleDefinition::from_rows(m, &lessons.rows, &quizzes.rows))
            .collect();

        SubjectModules::live(subject, definitions, lessons.degraded || quizzes.degraded)
    }

    /// One student's progress in one module. `Ok(None)` when the module does not exist.
    pub async fn student_module_progress(
        &self,
        student_id: i64,
        module_id: i64,
    ) -> FetchResult<Option<ModuleProgress>> {
        let Some(module) = self.fetcher.fetch_module(module_id).await? else {
            return Ok(None);
        };

        let module_ids = [module.id];
        let student_ids = [student_id];
        let (lessons, quizzes, completions, attempts) = tokio::join!(
            self.fetcher.fetch_lessons(&module_ids),
            self.fetcher.fetch_quizzes(&module_ids),
            self.fetcher.fetch_lesson_completions(&student_ids, &module_ids),
            self.fetcher.fetch_quiz_attempts(&student_ids, &module_ids),
        );
        let lessons = lessons.degrade("lesson definitions");
        let quizzes = quizzes.degrade("quiz definitions");
        let completions = completions.degrade("lesson completions");
        let attempts = attempts.degrade("quiz attempts");

        let definition = ModuleDefinition::from_rows(&module, &lessons.rows, &quizzes.rows);
        let mut progress =
            reduce_module_progress(&definition, student_id, &completions.rows, &attempts.rows);
        progress.degraded =
            lessons.degraded || quizzes.degraded || completions.degraded || attempts.degraded;

        Ok(Some(progress))
    }

    /// Progress through every module of `subject`.
    ///
    /// Sample modules are reduced against no records at all, so they report
    /// zero progress and carry `degraded`.
    pub async fn student_subject_progress(
        &self,
        student_id: i64,
        subject: &str,
    ) -> SubjectProgress {
        let catalog = self.subject_modules(subject).await;

        if catalog.source == ModuleSource::Sample {
            let modules = catalog
                .modules
                .iter()
                .map(|m| ModuleProgress {
                    degraded: true,
                    ..reduce_module_progress(m, student_id, &[], &[])
                })
                .collect();
            return SubjectProgress {
                subject: catalog.subject,
                student_id,
                source: ModuleSource::Sample,
                modules,
                degraded: true,
            };
        }

        let module_ids: Vec<i64> = catalog.modules.iter().map(|m| m.id).collect();
        let student_ids = [student_id];
        let (completions, attempts) = tokio::join!(
            self.fetcher.fetch_lesson_completions(&student_ids, &module_ids),
            self.fetcher.fetch_quiz_attempts(&student_ids, &module_ids),
        );
        let completions = completions.degrade("lesson completions");
        let attempts = attempts.degrade("quiz attempts");
        let degraded = catalog.degraded || completions.degraded || attempts.degraded;

        let modules = catalog
            .modules
            .iter()
            .map(|m| ModuleProgress {
                degraded,
                ..reduce_module_progress(m, student_id, &completions.rows, &attempts.rows)
            })
            .collect();

        SubjectProgress {
            subject: catalog.subject,
            student_id,
            source: ModuleSource::Live,
            modules,
            degraded,
        }
    }

    /// Class-wide statistics for a module. `Ok(None)` when the module does not exist.
    pub async fn class_module_progress(
        &self,
        module_id: i64,
        scope: StudentScope,
    ) -> FetchResult<Option<ClassModuleProgress>> {
        let Some(module) = self.fetcher.fetch_module(module_id).await? else {
            return Ok(None);
        };

        let students = self.fetcher.fetch_students(&scope).await.degrade("students in scope");
        let student_ids: Vec<i64> = students.rows.iter().map(|s| s.id).collect();
        let module_ids = [module.id];

        let (lessons, quizzes, completions, attempts) = tokio::join!(
            self.fetcher.fetch_lessons(&module_ids),
            self.fetcher.fetch_quizzes(&module_ids),
            self.fetcher.fetch_lesson_completions(&student_ids, &module_ids),
            self.fetcher.fetch_quiz_attempts(&student_ids, &module_ids),
        );
        let lessons = lessons.degrade("lesson definitions");
        let quizzes = quizzes.degrade("quiz definitions");
        let completions = completions.degrade("lesson completions");
        let attempts = attempts.degrade("quiz attempts");

        let definition = ModuleDefinition::from_rows(&module, &lessons.rows, &quizzes.rows);
        let mut class = aggregate_class_progress(
            &definition,
            &students.rows,
            &completions.rows,
            &attempts.rows,
        );
        class.degraded = students.degraded
            || lessons.degraded
            || quizzes.degraded
            || completions.degraded
            || attempts.degraded;

        if class.degraded {
            for entry in &mut class.students {
                entry.progress.degraded = true;
            }
        }

        tracing::debug!(
            module_id,
            total_students = class.total_students,
            degraded = class.degraded,
            "class progress aggregated"
        );

        Ok(Some(class))
    }
}
