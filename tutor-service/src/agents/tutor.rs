//! The conversational tutor.

use super::{parse_or_fallback, student_context, AgentKind, AgentOutput};
use crate::models::{MessageRole, SessionMessage, Student};
use crate::services::parsing::{clean_text, sanitize_reply};
use crate::services::providers::GenerationParams;

pub const FALLBACK_REPLY: &str = "I'm sorry, I didn't quite catch that. Could you rephrase \
     your question or tell me which part you'd like to go over?";

const PERSONA: &str = "You are a patient, encouraging tutor. Explain ideas step by step in \
plain language suited to the student's level. Ask a short check-for-understanding question \
when it fits. Guide the student toward answers on homework-style problems instead of just \
giving the final answer. Keep replies focused and under about 300 words. Do not prefix your \
reply with a speaker label.";

/// Persona plus the student and session context, stored with the session.
pub fn system_prompt(student: Option<&Student>, subject: &str, topic: Option<&str>) -> String {
    let mut prompt = format!("{}\n\nThe session subject is {}.", PERSONA, clean_text(subject));
    if let Some(topic) = topic.map(clean_text).filter(|t| !t.is_empty()) {
        prompt.push_str(&format!(" The current topic is {}.", topic));
    }

    let context = student_context(student);
    if !context.is_empty() {
        prompt.push_str("\n\n");
        prompt.push_str(&context);
    }
    prompt
}

/// Title used when a session is created without one.
pub fn default_title(subject: &str, topic: Option<&str>) -> String {
    match topic.map(clean_text).filter(|t| !t.is_empty()) {
        Some(topic) => format!("{}: {}", clean_text(subject), topic),
        None => format!("{} tutoring", clean_text(subject)),
    }
}

/// Transcript of prior turns followed by the new student message.
pub fn build_chat_prompt(history: &[SessionMessage], message: &str) -> String {
    let mut prompt = String::new();

    if !history.is_empty() {
        prompt.push_str("Conversation so far:\n");
        for turn in history {
            let speaker = match turn.role() {
                MessageRole::User => "Student",
                MessageRole::Assistant => "Tutor",
            };
            prompt.push_str(&format!("{}: {}\n", speaker, turn.content.trim()));
        }
        prompt.push('\n');
    }

    prompt.push_str(&format!(
        "Student: {}\n\nRespond as the tutor to the student's latest message.",
        message.trim()
    ));
    prompt
}

pub fn params(system_prompt: &str) -> GenerationParams {
    GenerationParams {
        system_instruction: Some(system_prompt.to_string()),
        max_tokens: Some(1024),
        ..Default::default()
    }
}

/// Cleaned reply, or the rephrase prompt when the model said nothing usable.
pub fn finalize_reply(raw: &str) -> AgentOutput<String> {
    let reply = sanitize_reply(raw);
    let parsed = (!reply.is_empty()).then_some(reply);
    parse_or_fallback(AgentKind::Tutor, parsed, || FALLBACK_REPLY.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support;
    use chrono::Utc;
    use uuid::Uuid;

    fn message(role: MessageRole, content: &str) -> SessionMessage {
        SessionMessage {
            message_id: Uuid::new_v4(),
            session_id: Uuid::nil(),
            role: role.as_str().to_string(),
            content: content.to_string(),
            created_utc: Utc::now(),
        }
    }

    #[test]
    fn system_prompt_includes_subject_topic_and_student() {
        let student = test_support::student();
        let prompt = system_prompt(Some(&student), "Math", Some("  linear   equations "));
        assert!(prompt.contains("subject is Math"));
        assert!(prompt.contains("topic is linear equations"));
        assert!(prompt.contains("Maya"));
    }

    #[test]
    fn chat_prompt_replays_history_in_order() {
        let history = vec![
            message(MessageRole::User, "What is x in 2x = 4?"),
            message(MessageRole::Assistant, "What could you divide both sides by?"),
        ];
        let prompt = build_chat_prompt(&history, "2?");

        let student_pos = prompt.find("Student: What is x").unwrap();
        let tutor_pos = prompt.find("Tutor: What could you divide").unwrap();
        let latest_pos = prompt.find("Student: 2?").unwrap();
        assert!(student_pos < tutor_pos && tutor_pos < latest_pos);
    }

    #[test]
    fn first_turn_has_no_transcript_header() {
        let prompt = build_chat_prompt(&[], "Hi!");
        assert!(!prompt.contains("Conversation so far"));
        assert!(prompt.starts_with("Student: Hi!"));
    }

    #[test]
    fn empty_reply_falls_back() {
        let output = finalize_reply("  Tutor:   ");
        assert!(!output.generated);
        assert_eq!(output.value, FALLBACK_REPLY);

        let output = finalize_reply("Tutor: Divide both sides by 2.");
        assert!(output.generated);
        assert_eq!(output.value, "Divide both sides by 2.");
    }

    #[test]
    fn default_title_uses_topic_when_present() {
        assert_eq!(default_title("Biology", Some("cells")), "Biology: cells");
        assert_eq!(default_title("Biology", None), "Biology tutoring");
    }
}
