//! Answer checking, scoring and difficulty selection.

use crate::models::{Difficulty, Question, QuestionKind, QuestionResult};
use std::collections::HashMap;

/// Scores at or above this pick hard questions next.
pub const HARD_THRESHOLD: f64 = 80.0;
/// Scores at or above this (and below hard) pick medium questions next.
pub const MEDIUM_THRESHOLD: f64 = 50.0;
/// How many recent submissions feed the difficulty recommendation.
pub const DIFFICULTY_WINDOW: usize = 3;

const ARTICLES: &[&str] = &["the", "a", "an"];

fn is_wrapping_punctuation(c: char) -> bool {
    matches!(
        c,
        '.' | ',' | ';' | ':' | '!' | '?' | '"' | '\'' | '`' | '“' | '”' | '‘' | '’'
    ) || c.is_whitespace()
}

/// Canonical form used for answer comparison.
pub fn normalize_answer(s: &str) -> String {
    let lowered = s.to_lowercase();
    let stripped = lowered.trim_matches(is_wrapping_punctuation);

    let mut words: Vec<&str> = stripped.split_whitespace().collect();
    if words.len() > 1 && ARTICLES.contains(&words[0]) {
        words.remove(0);
    }
    words.join(" ")
}

/// `a`, `B)`, `(c)` or `d.` as a zero-based option index.
fn option_letter(normalized: &str, option_count: usize) -> Option<usize> {
    let letter = normalized
        .trim_start_matches('(')
        .trim_end_matches([')', '.']);
    let mut chars = letter.chars();
    let c = chars.next()?;
    if chars.next().is_some() || !c.is_ascii_lowercase() {
        return None;
    }
    let index = (c as u8 - b'a') as usize;
    (index < option_count).then_some(index)
}

fn parse_bool(normalized: &str) -> Option<bool> {
    match normalized {
        "true" | "t" | "yes" | "y" => Some(true),
        "false" | "f" | "no" | "n" => Some(false),
        _ => None,
    }
}

fn matches_any(given: &str, question: &Question) -> bool {
    std::iter::once(&question.answer)
        .chain(question.accepted_answers.iter())
        .any(|candidate| normalize_answer(candidate) == given)
}

/// Resolve an answer to an option index, by letter or by option text.
fn option_index(raw: &str, options: &[String]) -> Option<usize> {
    let normalized = normalize_answer(raw);
    option_letter(&normalized, options.len()).or_else(|| {
        options
            .iter()
            .position(|option| normalize_answer(option) == normalized)
    })
}

/// Whether `answer` is an acceptable response to `question`.
pub fn is_correct(question: &Question, answer: &str) -> bool {
    let given = normalize_answer(answer);
    if given.is_empty() {
        return false;
    }

    match question.kind {
        QuestionKind::MultipleChoice => {
            match option_index(&question.answer, &question.options) {
                Some(expected) => option_index(answer, &question.options) == Some(expected),
                None => matches_any(&given, question),
            }
        }
        QuestionKind::TrueFalse => {
            match (parse_bool(&given), parse_bool(&normalize_answer(&question.answer))) {
                (Some(g), Some(expected)) => g == expected,
                _ => matches_any(&given, question),
            }
        }
        QuestionKind::ShortAnswer => matches_any(&given, question),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradedSubmission {
    pub results: Vec<QuestionResult>,
    pub earned_points: i32,
    pub total_points: i32,
    /// Percentage, 0-100, two decimal places.
    pub score: f64,
}

/// Grade every question; unanswered questions earn nothing.
pub fn grade(questions: &[Question], answers: &HashMap<String, String>) -> GradedSubmission {
    let mut earned_points = 0;
    let mut total_points = 0;

    let results = questions
        .iter()
        .map(|question| {
            let possible = question.points.max(0);
            let given = answers
                .get(&question.id)
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty());
            let correct = given.as_deref().is_some_and(|a| is_correct(question, a));
            let awarded = if correct { possible } else { 0 };

            earned_points += awarded;
            total_points += possible;

            QuestionResult {
                question_id: question.id.clone(),
                correct,
                points_awarded: awarded,
                points_possible: possible,
                given,
                expected: question.answer.clone(),
                explanation: question.explanation.clone(),
            }
        })
        .collect();

    GradedSubmission {
        results,
        earned_points,
        total_points,
        score: percentage(earned_points, total_points),
    }
}

fn percentage(earned: i32, total: i32) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let raw = earned as f64 / total as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}

pub fn difficulty_for_score(score: f64) -> Difficulty {
    if score >= HARD_THRESHOLD {
        Difficulty::Hard
    } else if score >= MEDIUM_THRESHOLD {
        Difficulty::Medium
    } else {
        Difficulty::Easy
    }
}

/// Next difficulty from recent scores, most recent first.
pub fn recommend_difficulty(recent_scores: &[f64]) -> Difficulty {
    let window: Vec<f64> = recent_scores
        .iter()
        .take(DIFFICULTY_WINDOW)
        .copied()
        .collect();
    if window.is_empty() {
        return Difficulty::Medium;
    }
    let average = window.iter().sum::<f64>() / window.len() as f64;
    difficulty_for_score(average)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(kind: QuestionKind, answer: &str, options: &[&str]) -> Question {
        Question {
            id: "q1".to_string(),
            kind,
            prompt: "?".to_string(),
            options: options.iter().map(|s| s.to_string()).collect(),
            answer: answer.to_string(),
            accepted_answers: vec![],
            explanation: String::new(),
            points: 1,
        }
    }

    #[test]
    fn normalization_is_forgiving() {
        assert_eq!(normalize_answer("  \"The  Mitochondria.\" "), "mitochondria");
        assert_eq!(normalize_answer("An apple!"), "apple");
        assert_eq!(normalize_answer("a"), "a");
        assert_eq!(normalize_answer("-5"), "-5");
        assert_eq!(normalize_answer("   "), "");
    }

    #[test]
    fn multiple_choice_accepts_letter_or_text() {
        let q = question(QuestionKind::MultipleChoice, "B", &["Paris", "Madrid", "Rome"]);
        assert!(is_correct(&q, "b"));
        assert!(is_correct(&q, "B)"));
        assert!(is_correct(&q, "(b)"));
        assert!(is_correct(&q, "madrid"));
        assert!(!is_correct(&q, "a"));
        assert!(!is_correct(&q, "Rome"));
        assert!(!is_correct(&q, "z"));
    }

    #[test]
    fn multiple_choice_answer_given_as_option_text() {
        let q = question(QuestionKind::MultipleChoice, "Rome", &["Paris", "Madrid", "Rome"]);
        assert!(is_correct(&q, "c"));
        assert!(is_correct(&q, "rome."));
        assert!(!is_correct(&q, "b"));
    }

    #[test]
    fn true_false_accepts_synonyms() {
        let q = question(QuestionKind::TrueFalse, "True", &[]);
        assert!(is_correct(&q, "t"));
        assert!(is_correct(&q, "YES"));
        assert!(!is_correct(&q, "false"));
        assert!(!is_correct(&q, "maybe"));
    }

    #[test]
    fn short_answer_uses_accepted_alternates() {
        let mut q = question(QuestionKind::ShortAnswer, "photosynthesis", &[]);
        q.accepted_answers = vec!["photo-synthesis".to_string()];
        assert!(is_correct(&q, "Photosynthesis"));
        assert!(is_correct(&q, "photo-synthesis"));
        assert!(!is_correct(&q, "respiration"));
        assert!(!is_correct(&q, ""));
    }

    #[test]
    fn grade_scores_and_rounds() {
        let mut questions = vec![
            question(QuestionKind::ShortAnswer, "4", &[]),
            question(QuestionKind::TrueFalse, "false", &[]),
            question(QuestionKind::ShortAnswer, "paris", &[]),
        ];
        questions[1].id = "q2".to_string();
        questions[2].id = "q3".to_string();

        let answers = HashMap::from([
            ("q1".to_string(), "4".to_string()),
            ("q2".to_string(), "true".to_string()),
        ]);

        let graded = grade(&questions, &answers);
        assert_eq!(graded.earned_points, 1);
        assert_eq!(graded.total_points, 3);
        assert_eq!(graded.score, 33.33);
        assert!(graded.results[0].correct);
        assert!(!graded.results[1].correct);
        assert_eq!(graded.results[2].given, None);
    }

    #[test]
    fn grade_with_no_points_is_zero() {
        let graded = grade(&[], &HashMap::new());
        assert_eq!(graded.score, 0.0);
        assert_eq!(graded.total_points, 0);
    }

    #[test]
    fn thresholds_pick_difficulty() {
        assert_eq!(difficulty_for_score(80.0), Difficulty::Hard);
        assert_eq!(difficulty_for_score(79.99), Difficulty::Medium);
        assert_eq!(difficulty_for_score(50.0), Difficulty::Medium);
        assert_eq!(difficulty_for_score(49.0), Difficulty::Easy);
    }

    #[test]
    fn recommendation_averages_recent_window() {
        assert_eq!(recommend_difficulty(&[]), Difficulty::Medium);
        assert_eq!(recommend_difficulty(&[90.0, 85.0, 70.0]), Difficulty::Hard);
        // Older scores beyond the window are ignored.
        assert_eq!(
            recommend_difficulty(&[40.0, 30.0, 50.0, 100.0, 100.0]),
            Difficulty::Easy
        );
    }
}
