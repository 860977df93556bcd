//! Database service for tutor-service.

use crate::models::{
    Assignment, CreateAssignment, CreateFeedback, CreateLesson, CreateSession, CreateSubmission,
    Feedback, Lesson, MessageRole, SessionMessage, Student, SubjectProgress, Submission,
    TutorSession, UpsertStudent, UsageRecord,
};
use crate::services::grading::DIFFICULTY_WINDOW;
use crate::services::metrics::DB_QUERY_DURATION;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::PgExecutor;
use sqlx::types::Json;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

const SESSION_COLUMNS: &str = "session_id, student_id, title, subject, topic, system_prompt, \
     message_count, total_input_tokens, total_output_tokens, created_utc, updated_utc";

const LESSON_COLUMNS: &str =
    "lesson_id, student_id, subject, topic, difficulty, title, content, generated, created_utc";

const ASSIGNMENT_COLUMNS: &str = "assignment_id, student_id, lesson_id, kind, subject, topic, \
     difficulty, title, instructions, questions, total_points, generated, created_utc";

const SUBMISSION_COLUMNS: &str = "submission_id, assignment_id, student_id, subject, answers, \
     results, earned_points, total_points, score, feedback, created_utc";

fn db_error(context: &str, e: sqlx::Error) -> AppError {
    AppError::DatabaseError(anyhow::anyhow!("{}: {}", context, e))
}

async fn insert_message<'e, E: PgExecutor<'e>>(
    executor: E,
    session_id: Uuid,
    role: MessageRole,
    content: &str,
) -> Result<SessionMessage, AppError> {
    sqlx::query_as::<_, SessionMessage>(
        r#"
        INSERT INTO session_messages (message_id, session_id, role, content, created_utc)
        VALUES ($1, $2, $3, $4, clock_timestamp())
        RETURNING message_id, session_id, role, content, created_utc
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(session_id)
    .bind(role.as_str())
    .bind(content)
    .fetch_one(executor)
    .await
    .map_err(|e| db_error("Failed to add message", e))
}

async fn bump_session<'e, E: PgExecutor<'e>>(
    executor: E,
    session_id: Uuid,
    messages: i32,
    input_tokens: i32,
    output_tokens: i32,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE tutor_sessions
        SET message_count = message_count + $2,
            total_input_tokens = total_input_tokens + $3,
            total_output_tokens = total_output_tokens + $4,
            updated_utc = NOW()
        WHERE session_id = $1
        "#,
    )
    .bind(session_id)
    .bind(messages)
    .bind(input_tokens)
    .bind(output_tokens)
    .execute(executor)
    .await
    .map_err(|e| db_error("Failed to update session", e))?;
    Ok(())
}

async fn insert_usage<'e, E: PgExecutor<'e>>(
    executor: E,
    record: &UsageRecord,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO llm_usage (usage_id, student_id, session_id, agent, model, input_tokens, output_tokens, created_utc)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(record.usage_id)
    .bind(record.student_id)
    .bind(record.session_id)
    .bind(&record.agent)
    .bind(&record.model)
    .bind(record.input_tokens)
    .bind(record.output_tokens)
    .bind(record.created_utc)
    .execute(executor)
    .await
    .map_err(|e| db_error("Failed to record usage", e))?;
    Ok(())
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "tutor-service"))]
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| db_error("Failed to connect", e))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Health check failed", e))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Student Operations
    // -------------------------------------------------------------------------

    /// Create the profile, or replace it if one exists.
    #[instrument(skip(self, input), fields(student_id = %input.student_id))]
    pub async fn upsert_student(&self, input: &UpsertStudent) -> Result<Student, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["upsert_student"])
            .start_timer();

        let student = sqlx::query_as::<_, Student>(
            r#"
            INSERT INTO students (student_id, display_name, grade_level, learning_goals, interests)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (student_id) DO UPDATE
            SET display_name = EXCLUDED.display_name,
                grade_level = EXCLUDED.grade_level,
                learning_goals = EXCLUDED.learning_goals,
                interests = EXCLUDED.interests,
                updated_utc = NOW()
            RETURNING student_id, display_name, grade_level, learning_goals, interests, created_utc, updated_utc
            "#,
        )
        .bind(input.student_id)
        .bind(&input.display_name)
        .bind(&input.grade_level)
        .bind(&input.learning_goals)
        .bind(&input.interests)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to upsert student", e))?;

        timer.observe_duration();

        Ok(student)
    }

    #[instrument(skip(self), fields(student_id = %student_id))]
    pub async fn get_student(&self, student_id: Uuid) -> Result<Option<Student>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_student"])
            .start_timer();

        let student = sqlx::query_as::<_, Student>(
            r#"
            SELECT student_id, display_name, grade_level, learning_goals, interests, created_utc, updated_utc
            FROM students
            WHERE student_id = $1
            "#,
        )
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to get student", e))?;

        timer.observe_duration();

        Ok(student)
    }

    // -------------------------------------------------------------------------
    // Session Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self, input), fields(student_id = %input.student_id))]
    pub async fn create_session(&self, input: &CreateSession) -> Result<TutorSession, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_session"])
            .start_timer();

        let session = sqlx::query_as::<_, TutorSession>(&format!(
            r#"
            INSERT INTO tutor_sessions (session_id, student_id, title, subject, topic, system_prompt)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(input.student_id)
        .bind(&input.title)
        .bind(&input.subject)
        .bind(&input.topic)
        .bind(&input.system_prompt)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to create session", e))?;

        timer.observe_duration();

        info!(session_id = %session.session_id, "Tutor session created");

        Ok(session)
    }

    /// Most recently active sessions first.
    #[instrument(skip(self), fields(student_id = %student_id))]
    pub async fn list_sessions(
        &self,
        student_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TutorSession>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_sessions"])
            .start_timer();

        let sessions = sqlx::query_as::<_, TutorSession>(&format!(
            r#"
            SELECT {SESSION_COLUMNS}
            FROM tutor_sessions
            WHERE student_id = $1
            ORDER BY updated_utc DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(student_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list sessions", e))?;

        timer.observe_duration();

        Ok(sessions)
    }

    #[instrument(skip(self), fields(student_id = %student_id, session_id = %session_id))]
    pub async fn get_session(
        &self,
        student_id: Uuid,
        session_id: Uuid,
    ) -> Result<Option<TutorSession>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_session"])
            .start_timer();

        let session = sqlx::query_as::<_, TutorSession>(&format!(
            r#"
            SELECT {SESSION_COLUMNS}
            FROM tutor_sessions
            WHERE student_id = $1 AND session_id = $2
            "#
        ))
        .bind(student_id)
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to get session", e))?;

        timer.observe_duration();

        Ok(session)
    }

    /// Returns false when no session matched. Messages cascade.
    #[instrument(skip(self), fields(student_id = %student_id, session_id = %session_id))]
    pub async fn delete_session(&self, student_id: Uuid, session_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_session"])
            .start_timer();

        let result = sqlx::query("DELETE FROM tutor_sessions WHERE student_id = $1 AND session_id = $2")
            .bind(student_id)
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete session", e))?;

        timer.observe_duration();

        Ok(result.rows_affected() > 0)
    }

    /// Store one chat exchange: both messages, the session counters and the
    /// usage row commit together or not at all.
    #[instrument(skip(self, user_content, reply_content, usage), fields(session_id = %session_id))]
    pub async fn add_turn(
        &self,
        session_id: Uuid,
        user_content: &str,
        reply_content: &str,
        usage: &UsageRecord,
    ) -> Result<(SessionMessage, SessionMessage), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["add_turn"])
            .start_timer();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        let user = insert_message(&mut *tx, session_id, MessageRole::User, user_content).await?;
        let reply =
            insert_message(&mut *tx, session_id, MessageRole::Assistant, reply_content).await?;
        bump_session(
            &mut *tx,
            session_id,
            2,
            usage.input_tokens,
            usage.output_tokens,
        )
        .await?;
        insert_usage(&mut *tx, usage).await?;

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit chat turn", e))?;

        timer.observe_duration();

        Ok((user, reply))
    }

    /// The last `limit` messages, oldest first.
    #[instrument(skip(self), fields(session_id = %session_id))]
    pub async fn recent_messages(
        &self,
        session_id: Uuid,
        limit: i64,
    ) -> Result<Vec<SessionMessage>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["recent_messages"])
            .start_timer();

        let mut messages = sqlx::query_as::<_, SessionMessage>(
            r#"
            SELECT message_id, session_id, role, content, created_utc
            FROM session_messages
            WHERE session_id = $1
            ORDER BY created_utc DESC, message_id DESC
            LIMIT $2
            "#,
        )
        .bind(session_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to load messages", e))?;

        timer.observe_duration();

        messages.reverse();
        Ok(messages)
    }

    // -------------------------------------------------------------------------
    // Lesson Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self, input), fields(student_id = %input.student_id))]
    pub async fn create_lesson(&self, input: &CreateLesson) -> Result<Lesson, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_lesson"])
            .start_timer();

        let lesson = sqlx::query_as::<_, Lesson>(&format!(
            r#"
            INSERT INTO lessons (lesson_id, student_id, subject, topic, difficulty, title, content, generated)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {LESSON_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(input.student_id)
        .bind(&input.subject)
        .bind(&input.topic)
        .bind(&input.difficulty)
        .bind(&input.content.title)
        .bind(Json(&input.content))
        .bind(input.generated)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to create lesson", e))?;

        timer.observe_duration();

        info!(lesson_id = %lesson.lesson_id, generated = lesson.generated, "Lesson stored");

        Ok(lesson)
    }

    #[instrument(skip(self), fields(student_id = %student_id, lesson_id = %lesson_id))]
    pub async fn get_lesson(
        &self,
        student_id: Uuid,
        lesson_id: Uuid,
    ) -> Result<Option<Lesson>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_lesson"])
            .start_timer();

        let lesson = sqlx::query_as::<_, Lesson>(&format!(
            "SELECT {LESSON_COLUMNS} FROM lessons WHERE student_id = $1 AND lesson_id = $2"
        ))
        .bind(student_id)
        .bind(lesson_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to get lesson", e))?;

        timer.observe_duration();

        Ok(lesson)
    }

    #[instrument(skip(self), fields(student_id = %student_id))]
    pub async fn list_lessons(
        &self,
        student_id: Uuid,
        subject: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Lesson>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_lessons"])
            .start_timer();

        let lessons = sqlx::query_as::<_, Lesson>(&format!(
            r#"
            SELECT {LESSON_COLUMNS}
            FROM lessons
            WHERE student_id = $1 AND ($2::text IS NULL OR LOWER(subject) = LOWER($2))
            ORDER BY created_utc DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(student_id)
        .bind(subject)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list lessons", e))?;

        timer.observe_duration();

        Ok(lessons)
    }

    // -------------------------------------------------------------------------
    // Assignment Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self, input), fields(student_id = %input.student_id, kind = input.kind.as_str()))]
    pub async fn create_assignment(&self, input: &CreateAssignment) -> Result<Assignment, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_assignment"])
            .start_timer();

        let total_points: i32 = input.questions.iter().map(|q| q.points.max(0)).sum();

        let assignment = sqlx::query_as::<_, Assignment>(&format!(
            r#"
            INSERT INTO assignments (
                assignment_id, student_id, lesson_id, kind, subject, topic, difficulty,
                title, instructions, questions, total_points, generated
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {ASSIGNMENT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(input.student_id)
        .bind(input.lesson_id)
        .bind(input.kind.as_str())
        .bind(&input.subject)
        .bind(&input.topic)
        .bind(input.difficulty.as_str())
        .bind(&input.title)
        .bind(&input.instructions)
        .bind(Json(&input.questions))
        .bind(total_points)
        .bind(input.generated)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to create assignment", e))?;

        timer.observe_duration();

        info!(
            assignment_id = %assignment.assignment_id,
            questions = input.questions.len(),
            "Assignment stored"
        );

        Ok(assignment)
    }

    #[instrument(skip(self), fields(student_id = %student_id, assignment_id = %assignment_id))]
    pub async fn get_assignment(
        &self,
        student_id: Uuid,
        assignment_id: Uuid,
    ) -> Result<Option<Assignment>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_assignment"])
            .start_timer();

        let assignment = sqlx::query_as::<_, Assignment>(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE student_id = $1 AND assignment_id = $2"
        ))
        .bind(student_id)
        .bind(assignment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to get assignment", e))?;

        timer.observe_duration();

        Ok(assignment)
    }

    #[instrument(skip(self), fields(student_id = %student_id))]
    pub async fn list_assignments(
        &self,
        student_id: Uuid,
        subject: Option<&str>,
        kind: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Assignment>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_assignments"])
            .start_timer();

        let assignments = sqlx::query_as::<_, Assignment>(&format!(
            r#"
            SELECT {ASSIGNMENT_COLUMNS}
            FROM assignments
            WHERE student_id = $1
              AND ($2::text IS NULL OR LOWER(subject) = LOWER($2))
              AND ($3::text IS NULL OR kind = $3)
            ORDER BY created_utc DESC
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(student_id)
        .bind(subject)
        .bind(kind)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list assignments", e))?;

        timer.observe_duration();

        Ok(assignments)
    }

    // -------------------------------------------------------------------------
    // Submission Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self, input), fields(student_id = %input.student_id, assignment_id = %input.assignment_id))]
    pub async fn create_submission(&self, input: &CreateSubmission) -> Result<Submission, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_submission"])
            .start_timer();

        let submission = sqlx::query_as::<_, Submission>(&format!(
            r#"
            INSERT INTO submissions (
                submission_id, assignment_id, student_id, subject, answers, results,
                earned_points, total_points, score, feedback
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {SUBMISSION_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(input.assignment_id)
        .bind(input.student_id)
        .bind(&input.subject)
        .bind(Json(&input.answers))
        .bind(Json(&input.results))
        .bind(input.earned_points)
        .bind(input.total_points)
        .bind(input.score)
        .bind(input.feedback.as_ref().map(Json))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to create submission", e))?;

        timer.observe_duration();

        info!(
            submission_id = %submission.submission_id,
            score = submission.score,
            "Submission graded"
        );

        Ok(submission)
    }

    /// Newest first. `assignment_id` narrows to one assignment.
    #[instrument(skip(self), fields(student_id = %student_id))]
    pub async fn list_submissions(
        &self,
        student_id: Uuid,
        assignment_id: Option<Uuid>,
        subject: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Submission>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_submissions"])
            .start_timer();

        let submissions = sqlx::query_as::<_, Submission>(&format!(
            r#"
            SELECT {SUBMISSION_COLUMNS}
            FROM submissions
            WHERE student_id = $1
              AND ($2::uuid IS NULL OR assignment_id = $2)
              AND ($3::text IS NULL OR LOWER(subject) = LOWER($3))
            ORDER BY created_utc DESC
            LIMIT $4
            "#
        ))
        .bind(student_id)
        .bind(assignment_id)
        .bind(subject)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list submissions", e))?;

        timer.observe_duration();

        Ok(submissions)
    }

    /// Scores in one subject, most recent first.
    #[instrument(skip(self), fields(student_id = %student_id, subject = %subject))]
    pub async fn recent_scores(
        &self,
        student_id: Uuid,
        subject: &str,
        limit: i64,
    ) -> Result<Vec<f64>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["recent_scores"])
            .start_timer();

        let scores = sqlx::query_scalar::<_, f64>(
            r#"
            SELECT score
            FROM submissions
            WHERE student_id = $1 AND LOWER(subject) = LOWER($2)
            ORDER BY created_utc DESC
            LIMIT $3
            "#,
        )
        .bind(student_id)
        .bind(subject)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to load recent scores", e))?;

        timer.observe_duration();

        Ok(scores)
    }

    /// One row per subject, case-insensitive, named by its latest spelling.
    #[instrument(skip(self), fields(student_id = %student_id))]
    pub async fn subject_progress(&self, student_id: Uuid) -> Result<Vec<SubjectProgress>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["subject_progress"])
            .start_timer();

        let progress = sqlx::query_as::<_, SubjectProgress>(
            r#"
            SELECT (ARRAY_AGG(subject ORDER BY created_utc DESC))[1] AS subject,
                   COUNT(*) AS attempts,
                   AVG(score) AS average_score,
                   MAX(score) AS best_score,
                   (ARRAY_AGG(score ORDER BY created_utc DESC))[1] AS latest_score,
                   (ARRAY_AGG(score ORDER BY created_utc DESC))[1:$2] AS recent_scores
            FROM submissions
            WHERE student_id = $1
            GROUP BY LOWER(subject)
            ORDER BY LOWER(subject)
            "#,
        )
        .bind(student_id)
        .bind(DIFFICULTY_WINDOW as i32)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to compute progress", e))?;

        timer.observe_duration();

        Ok(progress)
    }

    // -------------------------------------------------------------------------
    // Feedback Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self, input), fields(student_id = %input.student_id))]
    pub async fn create_feedback(&self, input: &CreateFeedback) -> Result<Feedback, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_feedback"])
            .start_timer();

        let feedback = sqlx::query_as::<_, Feedback>(
            r#"
            INSERT INTO feedback (feedback_id, student_id, subject, content, generated)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING feedback_id, student_id, subject, content, generated, created_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.student_id)
        .bind(&input.subject)
        .bind(Json(&input.content))
        .bind(input.generated)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to create feedback", e))?;

        timer.observe_duration();

        Ok(feedback)
    }

    #[instrument(skip(self), fields(student_id = %student_id))]
    pub async fn list_feedback(
        &self,
        student_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Feedback>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_feedback"])
            .start_timer();

        let feedback = sqlx::query_as::<_, Feedback>(
            r#"
            SELECT feedback_id, student_id, subject, content, generated, created_utc
            FROM feedback
            WHERE student_id = $1
            ORDER BY created_utc DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(student_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list feedback", e))?;

        timer.observe_duration();

        Ok(feedback)
    }

    // -------------------------------------------------------------------------
    // Usage Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self, record), fields(student_id = %record.student_id, agent = %record.agent))]
    pub async fn record_usage(&self, record: &UsageRecord) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["record_usage"])
            .start_timer();

        insert_usage(&self.pool, record).await?;

        timer.observe_duration();

        Ok(())
    }

    #[instrument(skip(self), fields(student_id = %student_id))]
    pub async fn usage_for_student(&self, student_id: Uuid) -> Result<Vec<UsageRecord>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["usage_for_student"])
            .start_timer();

        let records = sqlx::query_as::<_, UsageRecord>(
            r#"
            SELECT usage_id, student_id, session_id, agent, model, input_tokens, output_tokens, created_utc
            FROM llm_usage
            WHERE student_id = $1
            ORDER BY created_utc DESC
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to load usage", e))?;

        timer.observe_duration();

        Ok(records)
    }
}
