//! Static sample modules served when the store cannot be read.
//!
//! The table is keyed by subject name (case-insensitive). Every id in it is
//! negative: module `-(subject * 1000 + position * 100)`, its lessons count
//! down from there, and its quiz sits at module id minus 50. Nothing here is
//! ever written back.

use serde::Serialize;

use crate::progress::{LessonDefinition, ModuleDefinition, QuizDefinition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleSource {
    Live,
    Sample,
}

/// The module list for one subject and where it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectModules {
    pub subject: String,
    pub source: ModuleSource,
    pub modules: Vec<ModuleDefinition>,
    pub degraded: bool,
}

impl SubjectModules {
    pub fn live(subject: &str, modules: Vec<ModuleDefinition>, degraded: bool) -> Self {
        Self {
            subject: subject.to_owned(),
            source: ModuleSource::Live,
            modules,
            degraded,
        }
    }

    pub fn sample(subject: &str) -> Self {
        Self {
            subject: subject.to_owned(),
            source: ModuleSource::Sample,
            modules: sample_modules(subject),
            degraded: true,
        }
    }
}

struct SampleModule {
    name: &'static str,
    description: &'static str,
    lessons: &'static [&'static str],
    quiz: Option<(&'static str, i32)>,
}

const MATHEMATICS: &[SampleModule] = &[
    SampleModule {
        name: "Numbers and Place Value",
        description: "Reading, writing and comparing whole numbers.",
        lessons: &["Counting in hundreds", "Place value charts", "Comparing numbers"],
        quiz: Some(("Place value check", 70)),
    },
    SampleModule {
        name: "Fractions",
        description: "Parts of a whole and equivalent fractions.",
        lessons: &["Halves and quarters", "Equivalent fractions"],
        quiz: Some(("Fractions quiz", 60)),
    },
    SampleModule {
        name: "Geometry Basics",
        description: "Shapes, angles and symmetry.",
        lessons: &["2D shapes", "Right angles", "Lines of symmetry"],
        quiz: None,
    },
];

const SCIENCE: &[SampleModule] = &[
    SampleModule {
        name: "Living Things",
        description: "Plants, animals and their habitats.",
        lessons: &["What plants need", "Food chains"],
        quiz: Some(("Habitats quiz", 70)),
    },
    SampleModule {
        name: "Materials",
        description: "Properties of everyday materials.",
        lessons: &["Solids, liquids and gases", "Magnets", "Conductors and insulators"],
        quiz: Some(("Materials check", 60)),
    },
];

const ENGLISH: &[SampleModule] = &[
    SampleModule {
        name: "Reading Comprehension",
        description: "Finding meaning in short texts.",
        lessons: &["Main idea", "Making inferences"],
        quiz: Some(("Comprehension check", 70)),
    },
    SampleModule {
        name: "Grammar",
        description: "Sentences, nouns and verbs.",
        lessons: &["Complete sentences", "Nouns and verbs", "Punctuation"],
        quiz: Some(("Grammar quiz", 60)),
    },
];

fn table_for(subject: &str) -> Option<(i64, &'static [SampleModule])> {
    match subject.trim().to_lowercase().as_str() {
        "mathematics" | "math" | "maths" => Some((1, MATHEMATICS)),
        "science" => Some((2, SCIENCE)),
        "english" => Some((3, ENGLISH)),
        _ => None,
    }
}

fn build(subject_index: i64, position: i64, module: ModuleParts) -> ModuleDefinition {
    let id = -(subject_index * 1000 + position * 100);
    ModuleDefinition {
        id,
        subject_id: None,
        name: module.name,
        description: Some(module.description),
        sort_order: position as i32,
        lessons: module
            .lessons
            .into_iter()
            .enumerate()
            .map(|(i, title)| LessonDefinition {
                id: id - (i as i64 + 1),
                title,
                sort_order: i as i32 + 1,
                quiz_id: None,
            })
            .collect(),
        quizzes: module
            .quiz
            .map(|(title, passing_score)| QuizDefinition {
                id: id - 50,
                title,
                total_questions: 5,
                passing_score,
            })
            .into_iter()
            .collect(),
    }
}

struct ModuleParts {
    name: String,
    description: String,
    lessons: Vec<String>,
    quiz: Option<(String, i32)>,
}

impl From<&SampleModule> for ModuleParts {
    fn from(m: &SampleModule) -> Self {
        Self {
            name: m.name.to_owned(),
            description: m.description.to_owned(),
            lessons: m.lessons.iter().map(|l| (*l).to_owned()).collect(),
            quiz: m.quiz.map(|(t, p)| (t.to_owned(), p)),
        }
    }
}

/// The deterministic sample set for `subject`.
///
/// Unknown subjects get a generic two-module set named after the subject.
pub fn sample_modules(subject: &str) -> Vec<ModuleDefinition> {
    if let Some((index, table)) = table_for(subject) {
        return table
            .iter()
            .zip(1..)
            .map(|(m, position)| build(index, position, m.into()))
            .collect();
    }

    let name = subject.trim();
    let generic = [
        ModuleParts {
            name: format!("Introduction to {name}"),
            description: format!("Key ideas and vocabulary in {name}."),
            lessons: vec!["Getting started".into(), "Core concepts".into()],
            quiz: Some(("Introduction check".into(), 60)),
        },
        ModuleParts {
            name: format!("{name} in Practice"),
            description: format!("Applying {name} to everyday problems."),
            lessons: vec!["Worked examples".into(), "Practice set".into()],
            quiz: None,
        },
    ];

    generic
        .into_iter()
        .zip(1..)
        .map(|(m, position)| build(9, position, m))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_subjects_match_case_insensitively() {
        assert_eq!(sample_modules("Mathematics"), sample_modules("  mathematics "));
        assert_eq!(sample_modules("SCIENCE")[0].name, "Living Things");
        assert_eq!(sample_modules("English").len(), 2);
    }

    #[test]
    fn every_sample_id_is_negative_and_unique() {
        for subject in ["Mathematics", "Science", "English", "History"] {
            let modules = sample_modules(subject);
            let mut ids: Vec<i64> = modules
                .iter()
                .flat_map(|m| {
                    std::iter::once(m.id)
                        .chain(m.lessons.iter().map(|l| l.id))
                        .chain(m.quizzes.iter().map(|q| q.id))
                })
                .collect();
            assert!(ids.iter().all(|id| *id < 0), "{subject}: {ids:?}");

            let total = ids.len();
            ids.sort_unstable();
            ids.dedup();
            assert_eq!(ids.len(), total, "{subject} ids collide");
        }
    }

    #[test]
    fn unknown_subjects_get_the_generic_pair() {
        let modules = sample_modules("History");
        assert_eq!(modules.len(), 2);
        assert_eq!(modules[0].name, "Introduction to History");
        assert!(modules.iter().all(|m| m.subject_id.is_none()));
    }

    #[test]
    fn sample_results_are_flagged() {
        let sample = SubjectModules::sample("Science");
        assert_eq!(sample.source, ModuleSource::Sample);
        assert!(sample.degraded);
        assert_eq!(serde_json::to_value(&sample).unwrap()["source"], "sample");
    }
}
