//! Study and exam sessions.
//!
//! Both sessions own their question sequence, a cursor, and an
//! [`AttemptState`]. A [`StudySession`] grades every selection as it happens;
//! an [`ExamSession`] grades once, when it finishes, and rejects selections
//! afterwards.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::SessionError;
use crate::evaluate::{evaluate_question, Outcome, Selection};
use crate::model::Question;
use crate::scoring::{outcomes, score, summarize, AttemptState, ScoreSummary};
use crate::timer::{cancellation, format_clock, CancelToken, Cancelled};
use crate::view::{option_views, OptionView};

/// Default exam length (60 minutes).
pub const DEFAULT_EXAM_DURATION: Duration = Duration::from_secs(60 * 60);

/// Remaining time below which the clock is shown as a warning (5 minutes).
pub const DEFAULT_LOW_TIME_WARNING: Duration = Duration::from_secs(5 * 60);

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

/// Current position within a question sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    position: usize,
    len: usize,
}

impl Cursor {
    pub fn new(len: usize) -> Self {
        Self { position: 0, len }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Move forward one; no-op on the last question.
    pub fn advance(&mut self) {
        if self.position + 1 < self.len {
            self.position += 1;
        }
    }

    /// Move back one; no-op on the first question.
    pub fn retreat(&mut self) {
        if self.position > 0 {
            self.position -= 1;
        }
    }

    /// Move to any position in range.
    pub fn jump_to(&mut self, position: usize) -> Result<(), SessionError> {
        check_position(position, self.len)?;
        self.position = position;
        Ok(())
    }
}

fn check_position(position: usize, len: usize) -> Result<(), SessionError> {
    if position < len {
        Ok(())
    } else {
        Err(SessionError::PositionOutOfRange { position, len })
    }
}

/// Resolve an option index and apply it to the current selection.
///
/// Multiple-choice questions toggle membership; single-choice questions
/// replace. The result may be empty, meaning "no answer".
fn apply_choice(
    questions: &[Question],
    attempt: &AttemptState,
    position: usize,
    option: usize,
) -> Result<Selection, SessionError> {
    check_position(position, questions.len())?;
    let question = &questions[position];
    let Some(value) = question.options.get(option) else {
        return Err(SessionError::OptionOutOfRange {
            position,
            option,
            len: question.options.len(),
        });
    };

    if !question.is_multiple_choice {
        return Ok(Selection::Single(value.clone()));
    }

    let mut chosen = match attempt.get(position) {
        Some(Selection::Multiple(chosen)) => chosen.clone(),
        _ => Vec::new(),
    };
    if let Some(existing) = chosen.iter().position(|o| o == value) {
        chosen.remove(existing);
    } else {
        chosen.push(value.clone());
    }
    Ok(Selection::Multiple(chosen))
}

// ---------------------------------------------------------------------------
// Study mode
// ---------------------------------------------------------------------------

/// Untimed session with immediate feedback and no terminal state.
#[derive(Debug, Clone)]
pub struct StudySession {
    questions: Vec<Question>,
    cursor: Cursor,
    attempt: AttemptState,
    status: BTreeMap<usize, Outcome>,
    answer_shown: bool,
}

impl StudySession {
    pub fn new(questions: Vec<Question>) -> Self {
        let cursor = Cursor::new(questions.len());
        Self {
            questions,
            cursor,
            attempt: AttemptState::new(),
            status: BTreeMap::new(),
            answer_shown: false,
        }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn attempt(&self) -> &AttemptState {
        &self.attempt
    }

    pub fn position(&self) -> usize {
        self.cursor.position()
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.cursor.position())
    }

    /// Select or toggle option `option` of the question at `position` and
    /// grade it straight away. Returns the question's new outcome.
    pub fn select_option(&mut self, position: usize, option: usize) -> Result<Outcome, SessionError> {
        let selection = apply_choice(&self.questions, &self.attempt, position, option)?;
        self.attempt.set(position, selection);

        let outcome = evaluate_question(&self.questions[position], self.attempt.get(position));
        if outcome == Outcome::Unanswered {
            self.status.remove(&position);
        } else {
            self.status.insert(position, outcome);
        }
        Ok(outcome)
    }

    /// Live outcome of an answered question; `None` if unanswered.
    pub fn status(&self, position: usize) -> Option<Outcome> {
        self.status.get(&position).copied()
    }

    pub fn answered_count(&self) -> usize {
        self.attempt.len()
    }

    /// Score of the answers given so far.
    pub fn score(&self) -> ScoreSummary {
        score(&self.questions, &self.attempt)
    }

    /// Reveal the correct answer for the current question.
    pub fn show_answer(&mut self) {
        self.answer_shown = true;
    }

    pub fn is_answer_shown(&self) -> bool {
        self.answer_shown
    }

    pub fn advance(&mut self) {
        self.cursor.advance();
        self.answer_shown = false;
    }

    pub fn retreat(&mut self) {
        self.cursor.retreat();
        self.answer_shown = false;
    }

    pub fn jump_to(&mut self, position: usize) -> Result<(), SessionError> {
        self.cursor.jump_to(position)?;
        self.answer_shown = false;
        Ok(())
    }

    /// Option views for a question. Correctness is shown once the question
    /// has a selection or, for the current question, once the answer has been
    /// revealed.
    pub fn option_views(&self, position: usize) -> Result<Vec<OptionView>, SessionError> {
        check_position(position, self.questions.len())?;
        let selection = self.attempt.get(position);
        let reveal =
            selection.is_some() || (self.answer_shown && position == self.cursor.position());
        Ok(option_views(&self.questions[position], selection, reveal))
    }

    /// Drop all answers and go back to the first question.
    pub fn reset(&mut self) {
        self.attempt.clear();
        self.status.clear();
        self.cursor = Cursor::new(self.questions.len());
        self.answer_shown = false;
    }
}

// ---------------------------------------------------------------------------
// Exam mode
// ---------------------------------------------------------------------------

/// Which screen a finished exam is showing. Switching does not regrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultsView {
    Results,
    Review,
}

/// Lifecycle of an exam.
///
/// Selections are only recorded while `Running`. Finishing an exam that was
/// never started starts it first, so every finished exam has a start time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExamPhase {
    NotStarted,
    Running,
    Finished(ResultsView),
}

/// Outcomes captured at the moment an exam finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grading {
    pub outcomes: Vec<Outcome>,
    pub summary: ScoreSummary,
    pub finished_at: DateTime<Utc>,
}

/// Timed session with deferred grading.
#[derive(Debug)]
pub struct ExamSession {
    id: Uuid,
    questions: Vec<Question>,
    cursor: Cursor,
    attempt: AttemptState,
    phase: ExamPhase,
    duration: Duration,
    remaining_secs: u64,
    low_time_warning: Duration,
    started_at: Option<DateTime<Utc>>,
    grading: Option<Grading>,
    timer: Option<CancelToken>,
}

impl ExamSession {
    pub fn new(questions: Vec<Question>, duration: Duration) -> Self {
        let cursor = Cursor::new(questions.len());
        Self {
            id: Uuid::new_v4(),
            questions,
            cursor,
            attempt: AttemptState::new(),
            phase: ExamPhase::NotStarted,
            duration,
            remaining_secs: duration.as_secs(),
            low_time_warning: DEFAULT_LOW_TIME_WARNING,
            started_at: None,
            grading: None,
            timer: None,
        }
    }

    pub fn with_low_time_warning(mut self, threshold: Duration) -> Self {
        self.low_time_warning = threshold;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn attempt(&self) -> &AttemptState {
        &self.attempt
    }

    pub fn phase(&self) -> ExamPhase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, ExamPhase::Finished(_))
    }

    pub fn position(&self) -> usize {
        self.cursor.position()
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.cursor.position())
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// The graded snapshot, once finished.
    pub fn grading(&self) -> Option<&Grading> {
        self.grading.as_ref()
    }

    /// Snapshot outcome of one question, once finished.
    pub fn outcome(&self, position: usize) -> Option<Outcome> {
        self.grading
            .as_ref()
            .and_then(|g| g.outcomes.get(position).copied())
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    /// Remaining time as `HH:MM:SS`.
    pub fn clock(&self) -> String {
        format_clock(self.remaining_secs)
    }

    pub fn is_low_on_time(&self) -> bool {
        self.remaining_secs < self.low_time_warning.as_secs()
    }

    pub fn answered_count(&self) -> usize {
        self.attempt.len()
    }

    /// `NotStarted → Running`. No-op in any other phase.
    pub fn start(&mut self) {
        if self.phase == ExamPhase::NotStarted {
            self.phase = ExamPhase::Running;
            self.started_at = Some(Utc::now());
            tracing::debug!(exam = %self.id, questions = self.questions.len(), "exam started");
        }
    }

    /// Hand out the countdown's cancellation signal. Any previous countdown is
    /// cancelled. `None` once the exam is finished.
    pub fn arm_timer(&mut self) -> Option<Cancelled> {
        if self.is_finished() {
            return None;
        }
        let (token, cancelled) = cancellation();
        if let Some(previous) = self.timer.replace(token) {
            previous.cancel();
        }
        Some(cancelled)
    }

    /// Select or toggle option `option` of the question at `position`.
    ///
    /// Ignored unless the exam is running.
    pub fn select_option(&mut self, position: usize, option: usize) -> Result<(), SessionError> {
        if self.phase != ExamPhase::Running {
            tracing::debug!(exam = %self.id, position, phase = ?self.phase, "selection ignored, exam is not running");
            return Ok(());
        }
        let selection = apply_choice(&self.questions, &self.attempt, position, option)?;
        self.attempt.set(position, selection);
        Ok(())
    }

    pub fn advance(&mut self) {
        self.cursor.advance();
    }

    pub fn retreat(&mut self) {
        self.cursor.retreat();
    }

    pub fn jump_to(&mut self, position: usize) -> Result<(), SessionError> {
        self.cursor.jump_to(position)
    }

    /// One countdown second. Reaching zero finishes the exam. No-op unless
    /// the exam is running.
    pub fn tick(&mut self) {
        if self.phase != ExamPhase::Running {
            return;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            tracing::debug!(exam = %self.id, "time is up");
            self.finish();
        }
    }

    /// Grade the exam and move to `Finished(Results)`, starting it first if
    /// needed.
    ///
    /// Cancels the countdown. Calling it again returns the existing summary
    /// without regrading.
    pub fn finish(&mut self) -> ScoreSummary {
        if let Some(grading) = &self.grading {
            return grading.summary;
        }
        self.start();
        if let Some(token) = self.timer.take() {
            token.cancel();
        }

        let outcomes = outcomes(&self.questions, &self.attempt);
        let summary = summarize(&outcomes);
        self.grading = Some(Grading {
            outcomes,
            summary,
            finished_at: Utc::now(),
        });
        self.phase = ExamPhase::Finished(ResultsView::Results);

        tracing::info!(
            exam = %self.id,
            correct = summary.correct,
            total = summary.total,
            percentage = summary.percentage,
            "exam finished"
        );
        summary
    }

    /// Switch a finished exam to its answer review.
    pub fn show_review(&mut self) {
        if self.is_finished() {
            self.phase = ExamPhase::Finished(ResultsView::Review);
        }
    }

    /// Switch a finished exam back to its results summary.
    pub fn show_results(&mut self) {
        if self.is_finished() {
            self.phase = ExamPhase::Finished(ResultsView::Results);
        }
    }

    /// Option views for a question; correctness is hidden until finished.
    pub fn option_views(&self, position: usize) -> Result<Vec<OptionView>, SessionError> {
        check_position(position, self.questions.len())?;
        Ok(option_views(
            &self.questions[position],
            self.attempt.get(position),
            self.is_finished(),
        ))
    }

    /// Abandon this attempt and start over with a fresh, unstarted exam over
    /// the same questions.
    pub fn restart(&mut self) {
        if let Some(token) = self.timer.take() {
            token.cancel();
        }
        self.id = Uuid::new_v4();
        self.cursor = Cursor::new(self.questions.len());
        self.attempt.clear();
        self.phase = ExamPhase::NotStarted;
        self.remaining_secs = self.duration.as_secs();
        self.started_at = None;
        self.grading = None;
    }
}
