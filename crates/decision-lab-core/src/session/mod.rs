use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::feedback::{CoachScript, COMPLETE_MESSAGE};
use crate::rubric::{Justification, Rubric, ScoreResult};
use crate::scenario::{Choice, Meters, Resolved, Scenario, Step, StepRef};

/// Who is playing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
    pub student_name: String,
    pub student_grade: String,
    pub student_age: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileEntry {
    pub student_name: String,
    pub student_grade: String,
    pub student_age: String,
    pub scenario_id: String,
    pub start_time: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionEntry {
    pub step: String,
    pub choice: String,
    pub tool_answer: String,
    pub concept_answer: String,
    pub why_answer: String,
    pub justification: String,
    pub meters: Meters,
    pub score: ScoreResult,
}

/// One line of the play log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogEntry {
    Profile(ProfileEntry),
    Decision(DecisionEntry),
}

/// Where a session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position<'a> {
    At(&'a str, &'a Step),
    Complete,
}

/// Outcome of a submitted decision.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub step: String,
    pub choice: Choice,
    pub score: ScoreResult,
    pub meters: Meters,
}

impl Decision {
    pub fn consequence(&self) -> &str {
        &self.choice.consequence
    }
}

/// A single play-through of one scenario.
#[derive(Debug, Clone)]
pub struct Session {
    scenario: Scenario,
    profile: StudentProfile,
    current: StepRef,
    meters: Meters,
    pending: Option<StepRef>,
    log: Vec<LogEntry>,
    coach: CoachScript,
}

fn current_step<'a>(
    scenario: &'a Scenario,
    current: &'a StepRef,
) -> Result<Position<'a>, SessionError> {
    match scenario.resolve(current) {
        Resolved::Step(id, step) => Ok(Position::At(id, step)),
        Resolved::End => Ok(Position::Complete),
        Resolved::Missing(id) => Err(SessionError::UnknownStep(id.to_string())),
    }
}

impl Session {
    pub fn start(
        scenario: Scenario,
        profile: StudentProfile,
        now: NaiveDateTime,
    ) -> Result<Self, SessionError> {
        let student_name = profile.student_name.trim();
        if student_name.is_empty() {
            return Err(SessionError::MissingStudentName);
        }

        let entry = LogEntry::Profile(ProfileEntry {
            student_name: student_name.to_string(),
            student_grade: profile.student_grade.trim().to_string(),
            student_age: profile.student_age.trim().to_string(),
            scenario_id: scenario.id.clone(),
            start_time: now,
        });
        tracing::debug!(scenario = %scenario.id, "session started");

        Ok(Self {
            current: scenario.start_step.clone(),
            meters: scenario.meters,
            pending: None,
            log: vec![entry],
            coach: CoachScript::default(),
            profile,
            scenario,
        })
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn profile(&self) -> &StudentProfile {
        &self.profile
    }

    pub fn position(&self) -> Result<Position<'_>, SessionError> {
        current_step(&self.scenario, &self.current)
    }

    pub fn is_complete(&self) -> bool {
        self.current.is_end()
    }

    /// Raw meter values; these may leave `[0, 100]`.
    pub fn meters(&self) -> Meters {
        self.meters
    }

    pub fn display_meters(&self) -> Meters {
        self.meters.clamped()
    }

    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    pub fn log_json(&self) -> Result<String, SessionError> {
        serde_json::to_string_pretty(&self.log).map_err(|e| SessionError::Serialize(e.to_string()))
    }

    /// Record a decision at the current step. Call [`Session::advance`] to move on.
    pub fn submit(
        &mut self,
        choice_id: &str,
        justification: Justification,
        rubric: &Rubric,
    ) -> Result<Decision, SessionError> {
        if self.pending.is_some() {
            return Err(SessionError::AlreadySubmitted);
        }

        let (step_id, choice) = match self.position()? {
            Position::Complete => return Err(SessionError::Complete),
            Position::At(id, step) => {
                let choice = step
                    .choice(choice_id)
                    .ok_or_else(|| SessionError::UnknownChoice(choice_id.to_string()))?;
                (id.to_string(), choice.clone())
            }
        };
        if !justification.is_complete() {
            return Err(SessionError::IncompleteJustification);
        }

        let text = justification.render();
        let score = rubric.score(&text);
        self.meters.apply(&choice.meter_impact);

        self.log.push(LogEntry::Decision(DecisionEntry {
            step: step_id.clone(),
            choice: choice.id.clone(),
            tool_answer: justification.tool,
            concept_answer: justification.concept,
            why_answer: justification.why,
            justification: text,
            meters: self.meters,
            score: score.clone(),
        }));
        self.pending = Some(choice.next_step.clone());
        tracing::debug!(step = %step_id, choice = %choice.id, total = score.total(), "decision recorded");

        Ok(Decision {
            step: step_id,
            choice,
            score,
            meters: self.meters,
        })
    }

    /// Move to the step chosen by the last submission.
    pub fn advance(&mut self) -> Result<Position<'_>, SessionError> {
        let next = self.pending.take().ok_or(SessionError::NothingSubmitted)?;
        self.current = next;
        self.coach.reset();
        self.position()
    }

    pub fn coach_intro(&mut self) -> Result<String, SessionError> {
        match current_step(&self.scenario, &self.current)? {
            Position::At(_, step) => Ok(self.coach.intro(step)),
            Position::Complete => Ok(COMPLETE_MESSAGE.to_string()),
        }
    }

    pub fn coach_reply(&mut self) -> Result<String, SessionError> {
        match current_step(&self.scenario, &self.current)? {
            Position::At(_, step) => Ok(self.coach.reply(step)),
            Position::Complete => Ok(COMPLETE_MESSAGE.to_string()),
        }
    }
}

/// Errors from a play session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("student name is required")]
    MissingStudentName,
    #[error("tool, concept and why must all be answered")]
    IncompleteJustification,
    #[error("unknown step: {0}")]
    UnknownStep(String),
    #[error("unknown choice: {0}")]
    UnknownChoice(String),
    #[error("a decision was already submitted for this step")]
    AlreadySubmitted,
    #[error("no decision submitted")]
    NothingSubmitted,
    #[error("scenario is complete")]
    Complete,
    #[error("failed to serialize log: {0}")]
    Serialize(String),
}
