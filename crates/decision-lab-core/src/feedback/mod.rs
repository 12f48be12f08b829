//! Coaching feedback after a decision.
//!
//! A remote service may be plugged in through [`FeedbackProvider`]; whenever
//! it is absent or fails, the local fallback answers instead.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::rubric::{Justification, Rubric};
use crate::scenario::{Choice, Scenario, Step};

pub const DEFAULT_FEEDBACK: &str = "Thanks for your response. Reflect on your next step.";

const DEFAULT_OPTIONS: [&str; 3] = [
    "Pause and gather one more fact before deciding.",
    "Ask a trusted adult or peer for a second perspective.",
    "Set a clear boundary and explain your long-term goal.",
];

const MAX_OPTIONS: usize = 3;

const FOLLOW_UPS: [&str; 5] = [
    "What trade-off are you seeing here?",
    "Which boundary or value matters most right now?",
    "What is your best next step and why?",
    "What is the biggest risk if you choose that?",
    "How does this affect trust or long-term reputation?",
];

const EMPTY_PROMPT_REPLY: &str = "I hear you. Tell me more.";

pub const COMPLETE_MESSAGE: &str = "Scenario complete. Reflect on your choices before leaving.";

/// Topic library for resource searches, checked in order.
const VIDEO_TOPICS: [(&[&str], &str); 8] = [
    (
        &["online", "rumor", "reputation", "digital"],
        "digital citizenship online reputation decision making",
    ),
    (
        &["job", "employment", "manager", "workplace"],
        "workplace communication boundaries decision making",
    ),
    (
        &["peer pressure", "safety", "ride", "driving"],
        "peer pressure safety decision making teens",
    ),
    (
        &["group", "project", "team", "conflict"],
        "conflict resolution teamwork accountability students",
    ),
    (
        &["health", "injury", "sports"],
        "sports injury decision making athlete health",
    ),
    (
        &["budget", "money", "finances", "family"],
        "teen budgeting priorities trade-offs decision making",
    ),
    (
        &["self-regulation", "impulse", "stress"],
        "self regulation impulse control teens",
    ),
    (
        &["boundary", "boundaries"],
        "setting boundaries teens respectful communication",
    ),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioBrief {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub stakes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionBrief {
    pub choice: String,
    pub consequence: String,
    pub tool: String,
    pub concept: String,
    pub why: String,
}

/// Payload sent to a remote feedback service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub scenario: ScenarioBrief,
    pub decision: DecisionBrief,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rubric: Option<Rubric>,
}

impl FeedbackRequest {
    pub fn new(scenario: &Scenario, choice: &Choice, justification: &Justification) -> Self {
        Self {
            model: None,
            kind: "decision_feedback".to_string(),
            scenario: ScenarioBrief {
                id: scenario.id.clone(),
                title: scenario.title.clone(),
                summary: scenario.summary.clone(),
                stakes: scenario.stakes.clone(),
            },
            decision: DecisionBrief {
                choice: choice.text.clone(),
                consequence: choice.consequence.clone(),
                tool: justification.tool.clone(),
                concept: justification.concept.clone(),
                why: justification.why.clone(),
            },
            rubric: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_rubric(mut self, rubric: Rubric) -> Self {
        self.rubric = Some(rubric);
        self
    }

    pub fn to_json(&self) -> Result<String, FeedbackError> {
        serde_json::to_string(self).map_err(|e| FeedbackError::InvalidResponse(e.to_string()))
    }
}

/// Coaching text shown after a decision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub feedback: String,
    pub options: Vec<String>,
    pub video_query: String,
    pub video_url: String,
}

/// Loose shape of a remote reply; several key spellings are accepted.
#[derive(Debug, Default, Deserialize)]
struct RemoteFeedback {
    feedback: Option<String>,
    response: Option<String>,
    options: Option<Vec<String>>,
    next_steps: Option<Vec<String>>,
    video_query: Option<String>,
    #[serde(rename = "videoQuery")]
    video_query_camel: Option<String>,
    video_url: Option<String>,
    #[serde(rename = "videoUrl")]
    video_url_camel: Option<String>,
}

fn first_non_empty(values: [Option<String>; 2]) -> String {
    values
        .into_iter()
        .flatten()
        .find(|v| !v.is_empty())
        .unwrap_or_default()
}

impl Feedback {
    /// Parse a remote service reply.
    pub fn from_remote_json(json: &str) -> Result<Self, FeedbackError> {
        let raw: RemoteFeedback =
            serde_json::from_str(json).map_err(|e| FeedbackError::InvalidResponse(e.to_string()))?;
        let options = raw
            .options
            .filter(|o| !o.is_empty())
            .or(raw.next_steps)
            .unwrap_or_default();
        Ok(Self {
            feedback: first_non_empty([raw.feedback, raw.response]),
            options,
            video_query: first_non_empty([raw.video_query, raw.video_query_camel]),
            video_url: first_non_empty([raw.video_url, raw.video_url_camel]),
        })
    }

    /// Fill empty fields from local defaults and cap the option list.
    pub fn complete(mut self, request: &FeedbackRequest) -> Self {
        if self.feedback.is_empty() {
            self.feedback = DEFAULT_FEEDBACK.to_string();
        }
        if self.options.is_empty() {
            self.options = default_options();
        }
        self.options.truncate(MAX_OPTIONS);
        if self.video_query.is_empty() {
            self.video_query = video_query(&request.scenario);
        }
        if self.video_url.is_empty() {
            self.video_url = video_search_url(&self.video_query);
        }
        self
    }
}

pub fn default_options() -> Vec<String> {
    DEFAULT_OPTIONS.iter().map(|o| o.to_string()).collect()
}

/// Search phrase for a related resource video.
pub fn video_query(scenario: &ScenarioBrief) -> String {
    let haystack = format!(
        "{} {} {}",
        scenario.id,
        scenario.title.to_lowercase(),
        scenario.stakes.join(" ").to_lowercase()
    );
    VIDEO_TOPICS
        .iter()
        .find(|(terms, _)| terms.iter().any(|term| haystack.contains(term)))
        .map(|(_, query)| query.to_string())
        .unwrap_or_else(|| {
            format!(
                "{} decision-making {}",
                scenario.title,
                scenario.stakes.join(" ")
            )
        })
}

pub fn video_search_url(query: &str) -> String {
    format!(
        "https://www.youtube.com/results?search_query={}",
        urlencoding::encode(query)
    )
}

/// A source of decision feedback.
pub trait FeedbackProvider {
    fn name(&self) -> &str;
    fn feedback(&self, request: &FeedbackRequest) -> Result<Feedback, FeedbackError>;
}

/// Local feedback that needs no service.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackFeedback;

impl FallbackFeedback {
    pub fn build(&self, request: &FeedbackRequest) -> Feedback {
        Feedback {
            feedback: format!(
                "You chose: {} This protects you in the short term, but consider how it affects trust and long-term goals.",
                request.decision.choice
            ),
            options: default_options(),
            video_query: video_query(&request.scenario),
            video_url: String::new(),
        }
        .complete(request)
    }
}

impl FeedbackProvider for FallbackFeedback {
    fn name(&self) -> &str {
        "fallback"
    }

    fn feedback(&self, request: &FeedbackRequest) -> Result<Feedback, FeedbackError> {
        Ok(self.build(request))
    }
}

/// Ask `provider`, falling back to local feedback on any error.
pub fn feedback_with_fallback(provider: &dyn FeedbackProvider, request: &FeedbackRequest) -> Feedback {
    match provider.feedback(request) {
        Ok(feedback) => feedback.complete(request),
        Err(e) => {
            warn!(provider = provider.name(), error = %e, "feedback provider failed, using fallback");
            FallbackFeedback.build(request)
        }
    }
}

/// Scripted stakeholder replies used when no chat service is configured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoachScript {
    prompt_index: usize,
    follow_up_index: usize,
}

impl CoachScript {
    pub fn reset(&mut self) {
        self.prompt_index = 0;
        self.follow_up_index = 0;
    }

    /// Opening line for a step: the stakeholder's first prompt.
    pub fn intro(&mut self, step: &Step) -> String {
        self.reset();
        let opening = step
            .ai_prompts
            .first()
            .map(String::as_str)
            .unwrap_or(EMPTY_PROMPT_REPLY);
        self.prompt_index = 1;
        format!("{}: {opening}", step.stakeholder)
    }

    /// Next prompt for the step, paired with a rotating follow-up question.
    pub fn reply(&mut self, step: &Step) -> String {
        let prompt = if step.ai_prompts.is_empty() {
            EMPTY_PROMPT_REPLY
        } else {
            step.ai_prompts[self.prompt_index % step.ai_prompts.len()].as_str()
        };
        let follow_up = FOLLOW_UPS[self.follow_up_index % FOLLOW_UPS.len()];
        self.prompt_index += 1;
        self.follow_up_index += 1;
        format!("{prompt} {follow_up}")
    }
}

/// Errors from feedback providers.
#[derive(Debug, thiserror::Error)]
pub enum FeedbackError {
    #[error("feedback request failed: {0}")]
    RequestFailed(String),
    #[error("feedback service returned invalid response: {0}")]
    InvalidResponse(String),
    #[error("feedback service unavailable")]
    Unavailable,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Context, StakeholderPair};
    use crate::scenario::Flavor;

    struct FailingProvider;

    impl FeedbackProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        fn feedback(&self, _request: &FeedbackRequest) -> Result<Feedback, FeedbackError> {
            Err(FeedbackError::Unavailable)
        }
    }

    struct CannedProvider(&'static str);

    impl FeedbackProvider for CannedProvider {
        fn name(&self) -> &str {
            "canned"
        }

        fn feedback(&self, _request: &FeedbackRequest) -> Result<Feedback, FeedbackError> {
            Feedback::from_remote_json(self.0)
        }
    }

    fn scenario(stakes: [&str; 3]) -> Scenario {
        let context = Context {
            setting: "library".to_string(),
            stakeholder: StakeholderPair::new("Peer", "Teacher"),
            stakes: stakes.map(|s| s.to_string()),
        };
        Flavor::Response.build(&context, 0, 2)
    }

    fn request(stakes: [&str; 3]) -> FeedbackRequest {
        let scenario = scenario(stakes);
        let choice = scenario.steps["step1"].choices[1].clone();
        FeedbackRequest::new(
            &scenario,
            &choice,
            &Justification::new("pause", "trade-off", "it keeps trust"),
        )
    }

    #[test]
    fn test_request_payload_shape() {
        let value = serde_json::to_value(request(["Health", "Values", "Grades"]).with_model("m1")).unwrap();
        assert_eq!(value["type"], "decision_feedback");
        assert_eq!(value["model"], "m1");
        assert_eq!(value["decision"]["choice"], "Pause, ask for information, and plan.");
        assert_eq!(value["decision"]["why"], "it keeps trust");
        assert!(value.get("rubric").is_none());
    }

    #[test]
    fn test_fallback_feedback() {
        let feedback = FallbackFeedback.build(&request(["Health", "Values", "Grades"]));
        assert!(feedback
            .feedback
            .starts_with("You chose: Pause, ask for information, and plan."));
        assert_eq!(feedback.options.len(), 3);
        assert_eq!(feedback.video_query, "sports injury decision making athlete health");
        assert_eq!(
            feedback.video_url,
            "https://www.youtube.com/results?search_query=sports%20injury%20decision%20making%20athlete%20health"
        );
    }

    #[test]
    fn test_video_query_library_order() {
        // "reputation" hits the first topic even though "family" is also present
        let brief = request(["Reputation", "Family stability", "Values"]).scenario;
        assert_eq!(
            video_query(&brief),
            "digital citizenship online reputation decision making"
        );
    }

    #[test]
    fn test_video_query_default() {
        let brief = ScenarioBrief {
            id: "week1-scenario5".to_string(),
            title: "Pressure to Respond".to_string(),
            summary: String::new(),
            stakes: vec!["Grades".to_string(), "Accountability".to_string()],
        };
        assert_eq!(
            video_query(&brief),
            "Pressure to Respond decision-making Grades Accountability"
        );
    }

    #[test]
    fn test_provider_error_falls_back() {
        let req = request(["Time pressure", "Grades", "Accountability"]);
        let feedback = feedback_with_fallback(&FailingProvider, &req);
        assert_eq!(feedback, FallbackFeedback.build(&req));
    }

    #[test]
    fn test_remote_reply_aliases_and_completion() {
        let req = request(["Time pressure", "Grades", "Accountability"]);
        let provider = CannedProvider(
            r#"{"response": "Nice reasoning.", "next_steps": ["a", "b", "c", "d"], "video_query": "study habits"}"#,
        );
        let feedback = feedback_with_fallback(&provider, &req);
        assert_eq!(feedback.feedback, "Nice reasoning.");
        assert_eq!(feedback.options, vec!["a", "b", "c"]);
        assert_eq!(feedback.video_query, "study habits");
        assert!(feedback.video_url.ends_with("search_query=study%20habits"));
    }

    #[test]
    fn test_remote_reply_empty_object() {
        let req = request(["Time pressure", "Grades", "Accountability"]);
        let feedback = feedback_with_fallback(&CannedProvider("{}"), &req);
        assert_eq!(feedback.feedback, DEFAULT_FEEDBACK);
        assert_eq!(feedback.options, default_options());
    }

    #[test]
    fn test_remote_reply_invalid_json_falls_back() {
        let req = request(["Time pressure", "Grades", "Accountability"]);
        let feedback = feedback_with_fallback(&CannedProvider("<html>"), &req);
        assert!(feedback.feedback.starts_with("You chose:"));
    }

    #[test]
    fn test_coach_script_rotation() {
        let scenario = scenario(["Health", "Values", "Grades"]);
        let step = &scenario.steps["step1"];
        let mut coach = CoachScript::default();
        assert_eq!(
            coach.intro(step),
            "Peer: I need your answer now. What are you going to do?"
        );
        assert_eq!(
            coach.reply(step),
            "You can decide fast or slow down. What's your plan? What trade-off are you seeing here?"
        );
        assert_eq!(
            coach.reply(step),
            "I need your answer now. What are you going to do? Which boundary or value matters most right now?"
        );
    }

    #[test]
    fn test_coach_script_without_prompts() {
        let mut step = scenario(["Health", "Values", "Grades"]).steps["step2"].clone();
        step.ai_prompts.clear();
        let mut coach = CoachScript::default();
        assert_eq!(coach.intro(&step), "Teacher: I hear you. Tell me more.");
        assert!(coach.reply(&step).starts_with("I hear you. Tell me more."));
    }
}
