//! Assignment and quiz generation.
//!
//! Models are loose with question JSON: answers come back as booleans or
//! numbers, options carry "A)" labels, ids collide. Everything is normalized
//! here so grading only ever sees well-formed [`Question`]s.

use super::{parse_or_fallback, AgentKind, AgentOutput};
use crate::models::{AssignmentKind, Difficulty, LessonContent, Question, QuestionKind};
use crate::services::parsing::{clean_list, clean_text, extract_json};
use crate::services::providers::GenerationParams;
use serde::Deserialize;
use serde_json::Value;

pub const MIN_QUESTIONS: usize = 1;
pub const MAX_QUESTIONS: usize = 20;

#[derive(Debug, Clone)]
pub struct AssignmentBrief {
    pub kind: AssignmentKind,
    pub subject: String,
    pub topic: String,
    pub difficulty: Difficulty,
    pub question_count: usize,
}

impl AssignmentBrief {
    pub fn agent(&self) -> AgentKind {
        match self.kind {
            AssignmentKind::Assignment => AgentKind::Assignment,
            AssignmentKind::Quiz => AgentKind::Quiz,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedAssignment {
    pub title: String,
    pub instructions: String,
    pub questions: Vec<Question>,
}

fn difficulty_guidance(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => "Focus on recall and basic understanding of definitions.",
        Difficulty::Medium => "Mix recall with straightforward application of ideas.",
        Difficulty::Hard => {
            "Emphasize multi-step application, analysis and common misconceptions."
        }
    }
}

pub fn build_prompt(brief: &AssignmentBrief, lesson: Option<&LessonContent>) -> String {
    let what = match brief.kind {
        AssignmentKind::Assignment => "a homework assignment",
        AssignmentKind::Quiz => "a short quiz",
    };

    let mut prompt = format!(
        "Create {what} with exactly {count} questions on \"{topic}\" in {subject}.\n\
         Difficulty: {difficulty}. {guidance}\n",
        count = brief.question_count,
        topic = clean_text(&brief.topic),
        subject = clean_text(&brief.subject),
        difficulty = brief.difficulty.as_str(),
        guidance = difficulty_guidance(brief.difficulty),
    );

    if let Some(lesson) = lesson {
        prompt.push_str(&format!(
            "Base the questions on this lesson.\nTitle: {}\nSummary: {}\n",
            lesson.title, lesson.summary
        ));
        if !lesson.key_points.is_empty() {
            prompt.push_str(&format!("Key points: {}\n", lesson.key_points.join("; ")));
        }
    }

    prompt.push_str(
        r#"
Respond with only a JSON object in this shape:
{
  "title": "assignment title",
  "instructions": "one or two sentences for the student",
  "questions": [
    {
      "id": "q1",
      "kind": "multiple_choice | true_false | short_answer",
      "prompt": "the question",
      "options": ["choices, multiple_choice only"],
      "answer": "correct option text, true/false, or the expected short answer",
      "accepted_answers": ["other acceptable short answers"],
      "explanation": "why the answer is correct",
      "points": 1
    }
  ]
}
Short answers must be a single word, number or short phrase so they can be checked exactly."#,
    );
    prompt
}

pub fn params() -> GenerationParams {
    GenerationParams {
        json_output: true,
        max_tokens: Some(4096),
        // Lower temperature keeps answer keys consistent.
        temperature: Some(0.4),
        ..Default::default()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAssignment {
    title: String,
    instructions: String,
    questions: Vec<RawQuestion>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawQuestion {
    #[serde(alias = "type")]
    kind: Option<String>,
    #[serde(alias = "question")]
    prompt: String,
    #[serde(alias = "choices")]
    options: Vec<String>,
    #[serde(alias = "correct_answer")]
    answer: Value,
    accepted_answers: Vec<String>,
    explanation: String,
    points: Option<i32>,
}

fn question_kind(raw: Option<&str>) -> QuestionKind {
    let normalized = raw
        .unwrap_or_default()
        .trim()
        .to_lowercase()
        .replace(['-', ' '], "_");
    match normalized.as_str() {
        "multiple_choice" | "mcq" | "choice" => QuestionKind::MultipleChoice,
        "true_false" | "truefalse" | "boolean" => QuestionKind::TrueFalse,
        _ => QuestionKind::ShortAnswer,
    }
}

fn answer_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => clean_text(s),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Drop a leading "A) " / "b. " / "(C) " label from an option.
fn strip_option_label(option: &str) -> String {
    let trimmed = option.trim();
    let bytes = trimmed.as_bytes();
    let (letter_at, close_at) = if bytes.first() == Some(&b'(') { (1, 2) } else { (0, 1) };

    let labelled = bytes.len() > close_at + 1
        && bytes[letter_at].is_ascii_alphabetic()
        && matches!(bytes[close_at], b')' | b'.' | b':')
        && bytes[close_at + 1] == b' ';

    if labelled {
        clean_text(&trimmed[close_at + 1..])
    } else {
        clean_text(trimmed)
    }
}

fn normalize_question(raw: RawQuestion) -> Option<Question> {
    let prompt = clean_text(&raw.prompt);
    let mut answer = answer_text(&raw.answer)?;
    if prompt.is_empty() {
        return None;
    }

    let mut kind = question_kind(raw.kind.as_deref());
    let mut options: Vec<String> = raw
        .options
        .iter()
        .map(|o| strip_option_label(o))
        .filter(|o| !o.is_empty())
        .collect();

    match kind {
        QuestionKind::MultipleChoice if options.len() < 2 => {
            kind = QuestionKind::ShortAnswer;
            options.clear();
        }
        QuestionKind::TrueFalse => options = vec!["True".to_string(), "False".to_string()],
        QuestionKind::ShortAnswer => options.clear(),
        // Keys sometimes echo the labelled option ("B) Madrid").
        QuestionKind::MultipleChoice => answer = strip_option_label(&answer),
    }

    Some(Question {
        id: String::new(),
        kind,
        prompt,
        options,
        answer,
        accepted_answers: clean_list(&raw.accepted_answers),
        explanation: raw.explanation.trim().to_string(),
        points: raw.points.filter(|p| *p > 0).unwrap_or(1),
    })
}

/// Keep at most `limit` usable questions and number them q1..qN.
fn normalize_questions(raw: Vec<RawQuestion>, limit: usize) -> Vec<Question> {
    raw.into_iter()
        .filter_map(normalize_question)
        .take(limit)
        .enumerate()
        .map(|(i, mut q)| {
            q.id = format!("q{}", i + 1);
            q
        })
        .collect()
}

pub fn parse(text: &str, brief: &AssignmentBrief) -> Option<GeneratedAssignment> {
    let raw: RawAssignment = extract_json(text).ok()?;
    let questions = normalize_questions(raw.questions, brief.question_count);
    if questions.is_empty() {
        return None;
    }

    let title = clean_text(&raw.title);
    let instructions = clean_text(&raw.instructions);

    Some(GeneratedAssignment {
        title: if title.is_empty() { default_title(brief) } else { title },
        instructions: if instructions.is_empty() {
            default_instructions(brief)
        } else {
            instructions
        },
        questions,
    })
}

fn default_title(brief: &AssignmentBrief) -> String {
    let label = match brief.kind {
        AssignmentKind::Assignment => "Assignment",
        AssignmentKind::Quiz => "Quiz",
    };
    format!("{}: {}", clean_text(&brief.topic), label)
}

fn default_instructions(_brief: &AssignmentBrief) -> String {
    "Answer each question. For multiple choice you can give the letter or the option text."
        .to_string()
}

/// Static question set used when generation fails. Every question can still
/// be graded.
pub fn fallback(brief: &AssignmentBrief) -> GeneratedAssignment {
    let subject = clean_text(&brief.subject);
    let topic = clean_text(&brief.topic);

    let questions = vec![
        Question {
            id: String::new(),
            kind: QuestionKind::TrueFalse,
            prompt: format!("True or false: {} is a topic within {}.", topic, subject),
            options: vec!["True".to_string(), "False".to_string()],
            answer: "True".to_string(),
            accepted_answers: vec![],
            explanation: format!("{} is studied as part of {}.", topic, subject),
            points: 1,
        },
        Question {
            id: String::new(),
            kind: QuestionKind::MultipleChoice,
            prompt: format!("Which subject does {} belong to?", topic),
            options: vec![subject.clone(), "None of these".to_string()],
            answer: "A".to_string(),
            accepted_answers: vec![],
            explanation: format!("This {} covers {}.", brief.kind.as_str(), subject),
            points: 1,
        },
        Question {
            id: String::new(),
            kind: QuestionKind::ShortAnswer,
            prompt: "Type the name of the topic this exercise covers.".to_string(),
            options: vec![],
            answer: topic.clone(),
            accepted_answers: vec![],
            explanation: format!("The topic is {}.", topic),
            points: 1,
        },
    ];

    GeneratedAssignment {
        title: default_title(brief),
        instructions: default_instructions(brief),
        questions: questions
            .into_iter()
            .take(brief.question_count.max(MIN_QUESTIONS))
            .enumerate()
            .map(|(i, mut q)| {
                q.id = format!("q{}", i + 1);
                q
            })
            .collect(),
    }
}

pub fn finalize(text: &str, brief: &AssignmentBrief) -> AgentOutput<GeneratedAssignment> {
    parse_or_fallback(brief.agent(), parse(text, brief), || fallback(brief))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::grading::is_correct;

    fn brief(count: usize) -> AssignmentBrief {
        AssignmentBrief {
            kind: AssignmentKind::Quiz,
            subject: "Geography".to_string(),
            topic: "European capitals".to_string(),
            difficulty: Difficulty::Hard,
            question_count: count,
        }
    }

    #[test]
    fn prompt_carries_count_difficulty_and_lesson() {
        let lesson = LessonContent {
            title: "Capitals".to_string(),
            summary: "Cities that host governments.".to_string(),
            key_points: vec!["Paris is in France".to_string()],
            ..Default::default()
        };
        let prompt = build_prompt(&brief(4), Some(&lesson));
        assert!(prompt.contains("a short quiz with exactly 4 questions"));
        assert!(prompt.contains("Difficulty: hard"));
        assert!(prompt.contains("Key points: Paris is in France"));
    }

    #[test]
    fn normalizes_model_questions() {
        let text = r#"Here you go:
{"title": "Capitals Quiz", "instructions": "Answer all.", "questions": [
  {"id": "x", "type": "multiple choice", "question": "Capital of Spain?",
   "options": ["A) Lisbon", "B) Madrid"], "answer": "Madrid"},
  {"id": "x", "kind": "true_false", "prompt": "Rome is in Italy.", "answer": true, "points": 0},
  {"kind": "multiple_choice", "prompt": "Capital of France?", "answer": "Paris"},
  {"kind": "short_answer", "prompt": "", "answer": "skip me"},
  {"kind": "short_answer", "prompt": "Capital of Austria?", "answer": "Vienna", "points": 3}
]}"#;
        let output = finalize(text, &brief(3));
        assert!(output.generated);

        let questions = output.value.questions;
        assert_eq!(questions.len(), 3);
        assert_eq!(
            questions.iter().map(|q| q.id.as_str()).collect::<Vec<_>>(),
            vec!["q1", "q2", "q3"]
        );

        assert_eq!(questions[0].kind, QuestionKind::MultipleChoice);
        assert_eq!(questions[0].options, vec!["Lisbon", "Madrid"]);
        assert!(is_correct(&questions[0], "b"));

        assert_eq!(questions[1].kind, QuestionKind::TrueFalse);
        assert_eq!(questions[1].answer, "true");
        assert_eq!(questions[1].points, 1);

        // Multiple choice without options becomes short answer.
        assert_eq!(questions[2].kind, QuestionKind::ShortAnswer);
        assert!(is_correct(&questions[2], "paris"));
    }

    #[test]
    fn labelled_answer_key_matches_letter_and_text() {
        let text = r#"{"questions": [
  {"kind": "multiple_choice", "prompt": "Capital of Spain?",
   "options": ["A) Lisbon", "B) Madrid"], "answer": "B) Madrid"}
]}"#;
        let output = finalize(text, &brief(1));
        let question = &output.value.questions[0];

        assert_eq!(question.answer, "Madrid");
        assert!(is_correct(question, "b"));
        assert!(is_correct(question, "Madrid"));
        assert!(!is_correct(question, "a"));
    }

    #[test]
    fn empty_question_list_falls_back() {
        let output = finalize(r#"{"title": "T", "questions": []}"#, &brief(5));
        assert!(!output.generated);
        assert_eq!(output.value.questions.len(), 3);
        assert_eq!(output.value.title, "European capitals: Quiz");
    }

    #[test]
    fn fallback_respects_requested_count_and_is_gradeable() {
        let set = fallback(&brief(2));
        assert_eq!(set.questions.len(), 2);
        assert!(is_correct(&set.questions[0], "true"));
        assert!(is_correct(&set.questions[1], "a"));
        assert!(is_correct(&set.questions[1], "geography"));

        let full = fallback(&brief(10));
        assert!(is_correct(&full.questions[2], "European Capitals"));
    }

    #[test]
    fn option_labels_are_stripped() {
        assert_eq!(strip_option_label("A) Paris"), "Paris");
        assert_eq!(strip_option_label("(c) Rome"), "Rome");
        assert_eq!(strip_option_label("d. Oslo"), "Oslo");
        assert_eq!(strip_option_label("Athens"), "Athens");
        assert_eq!(strip_option_label("A"), "A");
    }
}
