//! Feedback on a single submission or on overall progress.

use super::{parse_or_fallback, student_context, AgentKind, AgentOutput};
use crate::models::{Assignment, FeedbackContent, Student, SubjectProgress};
use crate::services::grading::{recommend_difficulty, GradedSubmission};
use crate::services::parsing::{clean_list, clean_text, extract_json};
use crate::services::providers::GenerationParams;

const RESPONSE_SHAPE: &str = r#"
Respond with only a JSON object in this shape:
{
  "summary": "two or three encouraging sentences addressed to the student",
  "strengths": ["specific things they did well"],
  "improvements": ["specific things to work on"],
  "next_steps": ["concrete actions for the next study session"]
}"#;

pub fn build_submission_prompt(
    assignment: &Assignment,
    graded: &GradedSubmission,
    student: Option<&Student>,
) -> String {
    let mut prompt = format!(
        "A student just completed the {kind} \"{title}\" on {topic} ({subject}, {difficulty}).\n\
         They scored {score:.0}% ({earned}/{total} points).\n",
        kind = assignment.kind().as_str(),
        title = assignment.title,
        topic = assignment.topic,
        subject = assignment.subject,
        difficulty = assignment.difficulty,
        score = graded.score,
        earned = graded.earned_points,
        total = graded.total_points,
    );

    let context = student_context(student);
    if !context.is_empty() {
        prompt.push_str(&context);
        prompt.push('\n');
    }

    prompt.push_str("\nQuestion by question:\n");
    for (question, result) in assignment.questions.0.iter().zip(&graded.results) {
        let given = result.given.as_deref().unwrap_or("(no answer)");
        let verdict = if result.correct { "correct" } else { "incorrect" };
        prompt.push_str(&format!(
            "- {}: {} | student answered \"{}\" | expected \"{}\" | {}\n",
            question.id, question.prompt, given, result.expected, verdict
        ));
    }

    prompt.push_str(RESPONSE_SHAPE);
    prompt
}

/// Prompt over per-subject aggregates and the latest scores.
pub fn build_progress_prompt(
    student: Option<&Student>,
    progress: &[SubjectProgress],
    recent_scores: &[(String, f64)],
) -> String {
    let mut prompt =
        String::from("Review this student's recent progress and give them feedback.\n");

    let context = student_context(student);
    if !context.is_empty() {
        prompt.push_str(&context);
        prompt.push('\n');
    }

    prompt.push_str("\nBy subject:\n");
    for p in progress {
        prompt.push_str(&format!(
            "- {}: {} attempts, average {:.0}%, best {:.0}%, latest {:.0}%\n",
            p.subject, p.attempts, p.average_score, p.best_score, p.latest_score
        ));
    }

    if !recent_scores.is_empty() {
        prompt.push_str("\nMost recent results, newest first:\n");
        for (title, score) in recent_scores {
            prompt.push_str(&format!("- {}: {:.0}%\n", title, score));
        }
    }

    prompt.push_str(RESPONSE_SHAPE);
    prompt
}

pub fn params() -> GenerationParams {
    GenerationParams {
        json_output: true,
        max_tokens: Some(1024),
        ..Default::default()
    }
}

pub fn parse(text: &str) -> Option<FeedbackContent> {
    let raw: FeedbackContent = extract_json(text).ok()?;
    let summary = raw.summary.trim().to_string();
    if summary.is_empty() {
        return None;
    }

    Some(FeedbackContent {
        summary,
        strengths: clean_list(&raw.strengths),
        improvements: clean_list(&raw.improvements),
        next_steps: clean_list(&raw.next_steps),
    })
}

/// Static feedback chosen by score band.
pub fn fallback_for_score(score: f64, subject: &str) -> FeedbackContent {
    let subject = clean_text(subject);

    if score >= 80.0 {
        FeedbackContent {
            summary: format!(
                "Excellent work! You scored {:.0}% and clearly understand this material.",
                score
            ),
            strengths: vec![format!("Strong command of the {} concepts tested", subject)],
            improvements: vec!["Review any question you missed to lock in the details".to_string()],
            next_steps: vec!["Try a harder quiz to stretch yourself".to_string()],
        }
    } else if score >= 50.0 {
        FeedbackContent {
            summary: format!(
                "Good effort. You scored {:.0}%, so you have the basics and there is room to grow.",
                score
            ),
            strengths: vec!["Solid grasp of the core ideas".to_string()],
            improvements: vec!["Go back over the questions you got wrong and their explanations".to_string()],
            next_steps: vec![format!(
                "Ask the tutor to walk through one of the {} problems you missed",
                subject
            )],
        }
    } else {
        FeedbackContent {
            summary: format!(
                "You scored {:.0}%. This topic is still new, and that is fine. Let's build it up step by step.",
                score
            ),
            strengths: vec!["You completed the attempt, which is the first step".to_string()],
            improvements: vec!["Revisit the lesson material before trying again".to_string()],
            next_steps: vec![
                "Start a tutor session to review the basics".to_string(),
                "Take an easier quiz to build confidence".to_string(),
            ],
        }
    }
}

/// Static progress feedback from the overall average.
pub fn fallback_for_progress(progress: &[SubjectProgress]) -> FeedbackContent {
    if progress.is_empty() {
        return FeedbackContent {
            summary: "You haven't completed any assignments yet. Take a quiz to get started!"
                .to_string(),
            strengths: vec![],
            improvements: vec![],
            next_steps: vec!["Generate a lesson and a short quiz on a topic you're studying".to_string()],
        };
    }

    let attempts: i64 = progress.iter().map(|p| p.attempts).sum();
    let weighted: f64 = progress
        .iter()
        .map(|p| p.average_score * p.attempts as f64)
        .sum();
    let average = if attempts > 0 { weighted / attempts as f64 } else { 0.0 };

    let best = progress
        .iter()
        .max_by(|a, b| a.average_score.total_cmp(&b.average_score));
    let weakest = progress
        .iter()
        .min_by(|a, b| a.average_score.total_cmp(&b.average_score));

    let focus_subject = weakest.map(|w| w.subject.as_str()).unwrap_or_default();
    let mut content = fallback_for_score(average, focus_subject);
    content.summary = format!(
        "Across {} attempts your average score is {:.0}%. {}",
        attempts, average, content.summary
    );
    if let Some(best) = best {
        content.strengths = vec![format!("{} is your strongest subject", best.subject)];
    }
    if let Some(weakest) = weakest {
        let next = recommend_difficulty(&weakest.recent_scores);
        content.next_steps.push(format!(
            "Practice {} with a quiz at {} difficulty",
            weakest.subject,
            next.as_str()
        ));
    }
    content
}

pub fn finalize(
    text: &str,
    fallback: impl FnOnce() -> FeedbackContent,
) -> AgentOutput<FeedbackContent> {
    parse_or_fallback(AgentKind::Feedback, parse(text), fallback)
}
