//! Domain models for the tutor service.

mod assignment;
mod feedback;
mod lesson;
mod progress;
mod session;
mod student;
mod usage;

pub use assignment::{
    Assignment, AssignmentKind, CreateAssignment, CreateSubmission, Difficulty, Question,
    QuestionKind, QuestionResult, Submission,
};
pub use feedback::{CreateFeedback, Feedback, FeedbackContent};
pub use lesson::{CreateLesson, Lesson, LessonContent, LessonSection};
pub use progress::SubjectProgress;
pub use session::{CreateSession, MessageRole, SessionMessage, TutorSession};
pub use student::{Student, UpsertStudent};
pub use usage::{UsageBucket, UsageRecord, UsageStats};
