//! Exam results report.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::evaluate::Outcome;
use crate::scoring::ScoreSummary;
use crate::session::ExamSession;
use crate::view::{answer_display, selection_display};

/// Summary and per-question review of a finished exam.
#[derive(Debug, Clone, Serialize)]
pub struct ExamReport {
    /// The exam's identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub summary: ScoreSummary,
    pub questions: Vec<QuestionReview>,
}

/// One reviewed question.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionReview {
    /// Zero-based position in the exam.
    pub position: usize,
    pub id: u32,
    pub text: String,
    pub outcome: Outcome,
    /// Selected labels, empty when unanswered.
    pub selected: String,
    /// Correct labels or `"Not specified"`.
    pub correct_answer: String,
    /// `false` when no selection could ever grade correct, e.g. the answer
    /// is unspecified or names no option.
    pub scoreable: bool,
    pub explanation: String,
}

impl ExamReport {
    /// Build the report from the exam's graded snapshot. `None` until the
    /// exam has finished.
    pub fn from_session(session: &ExamSession) -> Option<Self> {
        let grading = session.grading()?;
        let started_at = session.started_at()?;
        let questions = session
            .questions()
            .iter()
            .zip(&grading.outcomes)
            .enumerate()
            .map(|(position, (question, &outcome))| QuestionReview {
                position,
                id: question.id,
                text: question.text.clone(),
                outcome,
                selected: selection_display(question, session.attempt().get(position)),
                correct_answer: answer_display(question),
                scoreable: question.is_scoreable(),
                explanation: question.explanation.clone(),
            })
            .collect();

        Some(Self {
            id: session.id(),
            created_at: Utc::now(),
            started_at,
            finished_at: grading.finished_at,
            summary: grading.summary,
            questions,
        })
    }

    /// Questions that were not answered correctly.
    pub fn missed(&self) -> impl Iterator<Item = &QuestionReview> {
        self.questions
            .iter()
            .filter(|q| q.outcome != Outcome::Correct)
    }

    /// Questions whose correct answer no selection can match.
    pub fn unscoreable(&self) -> impl Iterator<Item = &QuestionReview> {
        self.questions.iter().filter(|q| !q.scoreable)
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let s = &self.summary;
        let mut md = String::new();

        md.push_str("## Exam Results\n\n");
        md.push_str(&format!(
            "**Score:** {}/{} ({}%)\n\n",
            s.correct, s.total, s.percentage
        ));
        md.push_str(&format!(
            "**Summary:** {} correct, {} incorrect, {} unanswered\n\n",
            s.correct, s.incorrect, s.unanswered
        ));

        if self.questions.is_empty() {
            return md;
        }

        md.push_str("### Review\n\n");
        md.push_str("| # | Id | Outcome | Selected | Correct |\n");
        md.push_str("|---|----|---------|----------|---------|\n");
        for q in &self.questions {
            let selected = if q.selected.is_empty() { "-" } else { q.selected.as_str() };
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                q.position + 1,
                q.id,
                q.outcome,
                selected,
                q.correct_answer
            ));
        }

        let unscoreable: Vec<&QuestionReview> = self.unscoreable().collect();
        if !unscoreable.is_empty() {
            md.push_str("\n### Unscoreable\n\n");
            for q in unscoreable {
                md.push_str(&format!(
                    "- **Q{}:** no selection can match the correct answer ({})\n",
                    q.position + 1,
                    q.correct_answer
                ));
            }
        }

        let explained: Vec<&QuestionReview> = self
            .missed()
            .filter(|q| !q.explanation.trim().is_empty())
            .collect();
        if !explained.is_empty() {
            md.push_str("\n### Explanations\n\n");
            for q in explained {
                md.push_str(&format!("- **Q{}:** {}\n", q.position + 1, q.explanation.trim()));
            }
        }

        md
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::model::{CanonicalAnswer, Question};

    fn question(id: u32, answer: &[&str], explanation: &str) -> Question {
        Question {
            id,
            text: format!("Question {id}"),
            options: vec!["a".into(), "b".into(), "c".into()],
            is_multiple_choice: answer.len() > 1,
            answer: CanonicalAnswer::from_labels(answer.iter().copied()),
            explanation: explanation.into(),
            source: None,
        }
    }

    fn finished_exam() -> ExamSession {
        let mut exam = ExamSession::new(
            vec![
                question(1, &["A"], ""),
                question(2, &["B", "C"], "Both b and c."),
                question(3, &[], "Source had no answer."),
            ],
            Duration::from_secs(60),
        );
        exam.start();
        exam.select_option(0, 0).unwrap();
        exam.select_option(1, 1).unwrap();
        exam.finish();
        exam
    }

    #[test]
    fn no_report_before_finish() {
        let exam = ExamSession::new(vec![question(1, &["A"], "")], Duration::from_secs(60));
        assert!(ExamReport::from_session(&exam).is_none());
    }

    #[test]
    fn report_for_exam_finished_without_start() {
        let mut exam = ExamSession::new(vec![question(1, &["A"], "")], Duration::from_secs(60));
        exam.finish();
        let report = ExamReport::from_session(&exam).unwrap();
        assert_eq!(report.summary.unanswered, 1);
        assert!(report.started_at <= report.finished_at);
    }

    #[test]
    fn report_reviews_every_question() {
        let exam = finished_exam();
        let report = ExamReport::from_session(&exam).unwrap();
        assert_eq!(report.id, exam.id());
        assert!(report.started_at <= report.finished_at);
        assert_eq!(report.summary.correct, 1);
        assert_eq!(report.summary.percentage, 33);

        let outcomes: Vec<Outcome> = report.questions.iter().map(|q| q.outcome).collect();
        assert_eq!(
            outcomes,
            vec![Outcome::Correct, Outcome::Incorrect, Outcome::Unanswered]
        );
        assert_eq!(report.questions[1].selected, "B");
        assert_eq!(report.questions[1].correct_answer, "B, C");
        assert_eq!(report.questions[2].correct_answer, "Not specified");
        assert!(report.questions[1].scoreable);
        assert!(!report.questions[2].scoreable);
        assert_eq!(report.unscoreable().count(), 1);
        assert_eq!(report.missed().count(), 2);
    }

    #[test]
    fn markdown() {
        let report = ExamReport::from_session(&finished_exam()).unwrap();
        let md = report.to_markdown();
        assert!(md.contains("**Score:** 1/3 (33%)"));
        assert!(md.contains("| 2 | 2 | incorrect | B | B, C |"));
        assert!(md.contains("| 3 | 3 | unanswered | - | Not specified |"));
        assert!(md.contains("- **Q2:** Both b and c."));
        assert!(md.contains("- **Q3:** no selection can match the correct answer (Not specified)"));
    }

    #[test]
    fn json_shape() {
        let report = ExamReport::from_session(&finished_exam()).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["summary"]["total"], 3);
        assert_eq!(json["questions"][0]["outcome"], "correct");
        assert_eq!(json["questions"][2]["scoreable"], false);
    }
}
