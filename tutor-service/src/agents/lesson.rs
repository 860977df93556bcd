//! Lesson generation.

use super::{parse_or_fallback, student_context, AgentKind, AgentOutput};
use crate::models::{Difficulty, LessonContent, LessonSection, Student};
use crate::services::parsing::{clean_list, clean_text, extract_json};
use crate::services::providers::GenerationParams;

/// What the student asked to learn.
#[derive(Debug, Clone)]
pub struct LessonBrief {
    pub subject: String,
    pub topic: String,
    pub difficulty: Difficulty,
    /// Free-text focus, e.g. "I keep mixing up mitosis and meiosis".
    pub focus: Option<String>,
}

pub fn build_prompt(brief: &LessonBrief, student: Option<&Student>) -> String {
    let mut prompt = format!(
        "Write a {difficulty} level lesson on \"{topic}\" for a student studying {subject}.\n",
        difficulty = brief.difficulty.as_str(),
        topic = clean_text(&brief.topic),
        subject = clean_text(&brief.subject),
    );

    if let Some(focus) = brief.focus.as_deref().map(clean_text).filter(|f| !f.is_empty()) {
        prompt.push_str(&format!("Pay particular attention to: {}\n", focus));
    }

    let context = student_context(student);
    if !context.is_empty() {
        prompt.push_str(&context);
        prompt.push('\n');
    }

    prompt.push_str(
        r#"
Respond with only a JSON object in this shape:
{
  "title": "short lesson title",
  "summary": "two or three sentence overview",
  "sections": [{"heading": "section heading", "body": "explanation with a worked example"}],
  "key_points": ["one idea per entry"],
  "practice_prompts": ["a question the student can try on their own"]
}
Use three to five sections."#,
    );
    prompt
}

pub fn params() -> GenerationParams {
    GenerationParams {
        json_output: true,
        max_tokens: Some(4096),
        ..Default::default()
    }
}

/// Parse and tidy a lesson. `None` when nothing teachable came back.
pub fn parse(text: &str) -> Option<LessonContent> {
    let raw: LessonContent = extract_json(text).ok()?;

    let sections: Vec<LessonSection> = raw
        .sections
        .into_iter()
        .map(|s| LessonSection {
            heading: clean_text(&s.heading),
            body: s.body.trim().to_string(),
        })
        .filter(|s| !s.body.is_empty())
        .collect();

    if sections.is_empty() && raw.summary.trim().is_empty() {
        return None;
    }

    Some(LessonContent {
        title: clean_text(&raw.title),
        summary: raw.summary.trim().to_string(),
        sections,
        key_points: clean_list(&raw.key_points),
        practice_prompts: clean_list(&raw.practice_prompts),
    })
}

pub fn fallback(brief: &LessonBrief) -> LessonContent {
    let subject = clean_text(&brief.subject);
    let topic = clean_text(&brief.topic);

    LessonContent {
        title: format!("Introduction to {}", topic),
        summary: format!(
            "A starting overview of {} in {}. The full lesson could not be generated \
             right now, so use this outline and ask your tutor for details.",
            topic, subject
        ),
        sections: vec![
            LessonSection {
                heading: "What it is".to_string(),
                body: format!(
                    "Write down, in your own words, what you already know about {}.",
                    topic
                ),
            },
            LessonSection {
                heading: "Why it matters".to_string(),
                body: format!(
                    "Think about where {} shows up elsewhere in {} and in everyday life.",
                    topic, subject
                ),
            },
            LessonSection {
                heading: "Next steps".to_string(),
                body: "Open a tutor session and ask for an explanation with an example."
                    .to_string(),
            },
        ],
        key_points: vec![format!("{} is a core idea in {}.", topic, subject)],
        practice_prompts: vec![format!("Explain {} to a friend in three sentences.", topic)],
    }
}

/// Model text to lesson, falling back when it is unusable. Missing titles are
/// filled from the topic.
pub fn finalize(text: &str, brief: &LessonBrief) -> AgentOutput<LessonContent> {
    let mut output = parse_or_fallback(AgentKind::Lesson, parse(text), || fallback(brief));
    if output.value.title.is_empty() {
        output.value.title = clean_text(&brief.topic);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support;

    fn brief() -> LessonBrief {
        LessonBrief {
            subject: "Biology".to_string(),
            topic: "cell division".to_string(),
            difficulty: Difficulty::Easy,
            focus: Some("mitosis vs meiosis".to_string()),
        }
    }

    #[test]
    fn prompt_mentions_brief_and_schema() {
        let prompt = build_prompt(&brief(), Some(&test_support::student()));
        assert!(prompt.contains("easy level lesson on \"cell division\""));
        assert!(prompt.contains("mitosis vs meiosis"));
        assert!(prompt.contains("\"practice_prompts\""));
        assert!(prompt.contains("Maya"));
    }

    #[test]
    fn parses_fenced_lesson_and_cleans_fields() {
        let text = r#"```json
{"title": "  Cell   Division ", "summary": "Cells split.",
 "sections": [{"heading": "Mitosis", "body": "Two identical cells."}, {"heading": "Empty", "body": "  "}],
 "key_points": ["DNA copies first", ""], "practice_prompts": ["Draw the phases."]}
```"#;
        let output = finalize(text, &brief());

        assert!(output.generated);
        assert_eq!(output.value.title, "Cell Division");
        assert_eq!(output.value.sections.len(), 1);
        assert_eq!(output.value.key_points, vec!["DNA copies first"]);
    }

    #[test]
    fn garbage_uses_fallback() {
        let output = finalize("I cannot help with that.", &brief());
        assert!(!output.generated);
        assert_eq!(output.value.title, "Introduction to cell division");
        assert_eq!(output.value.sections.len(), 3);
    }

    #[test]
    fn lesson_without_content_is_rejected() {
        assert!(parse(r#"{"title": "Only a title"}"#).is_none());
    }

    #[test]
    fn missing_title_is_filled_from_topic() {
        let output = finalize(r#"{"summary": "Cells divide."}"#, &brief());
        assert!(output.generated);
        assert_eq!(output.value.title, "cell division");
    }
}
