//! Scenario definitions and the seven weekly templates that produce them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::context::Context;

/// Sentinel `nextStep` value marking the end of a scenario.
pub const END_STEP: &str = "end";

/// Number of templates, and so the number of scenarios in a week.
pub const SCENARIOS_PER_WEEK: usize = TEMPLATES.len();

/// Budget, time and trust counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meters {
    pub budget: i32,
    pub time: i32,
    pub trust: i32,
}

impl Meters {
    pub const fn new(budget: i32, time: i32, trust: i32) -> Self {
        Self {
            budget,
            time,
            trust,
        }
    }

    pub fn apply(&mut self, impact: &Meters) {
        self.budget += impact.budget;
        self.time += impact.time;
        self.trust += impact.trust;
    }

    /// Copy clamped to `[0, 100]` for display.
    pub fn clamped(&self) -> Meters {
        Meters {
            budget: self.budget.clamp(0, 100),
            time: self.time.clamp(0, 100),
            trust: self.trust.clamp(0, 100),
        }
    }
}

/// Pointer to the next node: a step id or the terminal sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StepRef {
    Step(String),
    End,
}

impl StepRef {
    pub fn step(id: impl Into<String>) -> Self {
        StepRef::Step(id.into())
    }

    pub fn is_end(&self) -> bool {
        matches!(self, StepRef::End)
    }
}

impl From<String> for StepRef {
    fn from(value: String) -> Self {
        if value == END_STEP {
            StepRef::End
        } else {
            StepRef::Step(value)
        }
    }
}

impl From<StepRef> for String {
    fn from(value: StepRef) -> Self {
        match value {
            StepRef::Step(id) => id,
            StepRef::End => END_STEP.to_string(),
        }
    }
}

impl std::fmt::Display for StepRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepRef::Step(id) => write!(f, "{id}"),
            StepRef::End => write!(f, "{END_STEP}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    pub id: String,
    pub text: String,
    pub consequence: String,
    pub meter_impact: Meters,
    pub next_step: StepRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub prompt: String,
    pub stakeholder: String,
    pub ai_prompts: Vec<String>,
    pub choices: Vec<Choice>,
}

impl Step {
    pub fn choice(&self, id: &str) -> Option<&Choice> {
        self.choices.iter().find(|c| c.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub stakes: Vec<String>,
    pub roles: [String; 3],
    pub start_step: StepRef,
    pub meters: Meters,
    pub steps: BTreeMap<String, Step>,
}

/// Result of resolving a [`StepRef`] inside a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved<'a> {
    Step(&'a str, &'a Step),
    End,
    /// The reference names a step the scenario does not contain.
    Missing(&'a str),
}

impl Scenario {
    pub fn resolve<'a>(&'a self, step: &'a StepRef) -> Resolved<'a> {
        match step {
            StepRef::End => Resolved::End,
            StepRef::Step(id) => match self.steps.get_key_value(id) {
                Some((key, step)) => Resolved::Step(key.as_str(), step),
                None => Resolved::Missing(id.as_str()),
            },
        }
    }

    /// First dangling step reference, if any.
    pub fn dangling_ref(&self) -> Option<&str> {
        if let Resolved::Missing(id) = self.resolve(&self.start_step) {
            return Some(id);
        }
        self.steps
            .values()
            .flat_map(|step| step.choices.iter())
            .find_map(|choice| match self.resolve(&choice.next_step) {
                Resolved::Missing(id) => Some(id),
                _ => None,
            })
    }
}

/// Prompt flavor of a template. Only changes text, never branch topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flavor {
    Pressure,
    Repair,
    Response,
    Boundary,
    Risk,
    Support,
    Longview,
}

/// Template order within a week.
pub const TEMPLATES: [Flavor; 7] = [
    Flavor::Pressure,
    Flavor::Repair,
    Flavor::Response,
    Flavor::Boundary,
    Flavor::Risk,
    Flavor::Support,
    Flavor::Longview,
];

impl Flavor {
    /// 1-based position among the templates; also the id offset.
    pub fn position(self) -> usize {
        match self {
            Flavor::Pressure => 1,
            Flavor::Repair => 2,
            Flavor::Response => 3,
            Flavor::Boundary => 4,
            Flavor::Risk => 5,
            Flavor::Support => 6,
            Flavor::Longview => 7,
        }
    }

    pub fn title(self, context: &Context) -> String {
        match self {
            Flavor::Pressure => format!("Split Decision at the {}", capitalize(&context.setting)),
            Flavor::Repair => "Conflict and Repair".to_string(),
            Flavor::Response => "Pressure to Respond".to_string(),
            Flavor::Boundary => "Boundary Test".to_string(),
            Flavor::Risk => "Risk vs Reward Choice".to_string(),
            Flavor::Support => "Support System Decision".to_string(),
            Flavor::Longview => "Long View".to_string(),
        }
    }

    pub fn summary(self, context: &Context) -> String {
        let setting = &context.setting;
        match self {
            Flavor::Pressure => format!(
                "You face a fast decision in the {setting} that affects {}.",
                context.stakes[0].to_lowercase()
            ),
            Flavor::Repair => format!(
                "A conflict in the {setting} requires a decision about accountability and trust."
            ),
            Flavor::Response => "Someone wants an immediate response. You must decide between short-term relief and long-term outcomes.".to_string(),
            Flavor::Boundary => format!("Your boundary is challenged in the {setting}."),
            Flavor::Risk => "You must weigh risk vs reward with limited time and information.".to_string(),
            Flavor::Support => "A decision requires asking for help or handling it alone.".to_string(),
            Flavor::Longview => "Your choice now will impact long-term reputation and opportunities.".to_string(),
        }
    }

    pub fn start_meters(self) -> Meters {
        match self {
            Flavor::Pressure => Meters::new(50, 50, 50),
            Flavor::Repair => Meters::new(45, 55, 45),
            Flavor::Response => Meters::new(55, 40, 50),
            Flavor::Boundary => Meters::new(50, 45, 55),
            Flavor::Risk => Meters::new(40, 50, 60),
            Flavor::Support => Meters::new(55, 45, 50),
            Flavor::Longview => Meters::new(50, 50, 50),
        }
    }

    fn opening_prompt(self, context: &Context) -> String {
        let setting = &context.setting;
        let stakeholder = &context.stakeholder.primary;
        match self {
            Flavor::Pressure => format!(
                "In the {setting}, {} pushes you to decide quickly.",
                stakeholder.to_lowercase()
            ),
            Flavor::Repair => format!(
                "A mistake happened in the {setting}. {stakeholder} wants to know what you will do."
            ),
            Flavor::Response => {
                format!("{stakeholder} expects an immediate response in the {setting}.")
            }
            Flavor::Boundary => {
                format!("{stakeholder} asks you to do something that crosses a boundary.")
            }
            Flavor::Risk => {
                format!("You must choose a risky option or a safer option in the {setting}.")
            }
            Flavor::Support => format!(
                "You can ask for help in the {setting}, but it may feel uncomfortable."
            ),
            Flavor::Longview => format!(
                "You have a chance for short-term gain in the {setting}, but it could hurt long-term trust."
            ),
        }
    }

    /// Build this template's scenario for one week.
    pub fn build(self, context: &Context, week_index: usize, template_index: usize) -> Scenario {
        Scenario {
            id: format!(
                "week{}-scenario{}",
                week_index + 1,
                template_index + self.position()
            ),
            title: self.title(context),
            summary: self.summary(context),
            stakes: context.stakes.to_vec(),
            roles: [
                "Student".to_string(),
                context.stakeholder.primary.clone(),
                context.stakeholder.secondary.clone(),
            ],
            start_step: StepRef::step("step1"),
            meters: self.start_meters(),
            steps: build_three_step_flow(context, self),
        }
    }
}

impl std::fmt::Display for Flavor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Flavor::Pressure => "pressure",
            Flavor::Repair => "repair",
            Flavor::Response => "response",
            Flavor::Boundary => "boundary",
            Flavor::Risk => "risk",
            Flavor::Support => "support",
            Flavor::Longview => "longview",
        };
        write!(f, "{name}")
    }
}

fn choice(
    id: &str,
    text: &str,
    consequence: &str,
    (budget, time, trust): (i32, i32, i32),
    next_step: StepRef,
) -> Choice {
    Choice {
        id: id.to_string(),
        text: text.to_string(),
        consequence: consequence.to_string(),
        meter_impact: Meters::new(budget, time, trust),
        next_step,
    }
}

fn prompts(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|line| line.to_string()).collect()
}

/// The shared step1 -> step2 -> step3 -> end tree.
pub fn build_three_step_flow(context: &Context, flavor: Flavor) -> BTreeMap<String, Step> {
    let primary = &context.stakeholder.primary;
    let secondary = &context.stakeholder.secondary;

    let step1 = Step {
        prompt: flavor.opening_prompt(context),
        stakeholder: primary.clone(),
        ai_prompts: prompts(&[
            "I need your answer now. What are you going to do?",
            "You can decide fast or slow down. What's your plan?",
        ]),
        choices: vec![
            choice(
                "fast",
                "Respond fast to reduce pressure.",
                "Short-term relief, but risk increases.",
                (0, 6, -6),
                StepRef::step("step2"),
            ),
            choice(
                "pause",
                "Pause, ask for information, and plan.",
                "You gain clarity and control, but lose time.",
                (0, -6, 6),
                StepRef::step("step2"),
            ),
            choice(
                "boundary",
                "Set a boundary and explain your values.",
                "Trust may rise, but pressure increases.",
                (0, -4, 4),
                StepRef::step("step2"),
            ),
        ],
    };

    let step2 = Step {
        prompt: format!(
            "{secondary} asks how your decision affects others and the long-term outcome."
        ),
        stakeholder: secondary.clone(),
        ai_prompts: prompts(&[
            "Think about the long view. What are the consequences?",
            "What trade-off are you making here?",
        ]),
        choices: vec![
            choice(
                "explain",
                "Explain your trade-offs and long-term plan.",
                "You build credibility and trust.",
                (0, -2, 8),
                StepRef::step("step3"),
            ),
            choice(
                "minimize",
                "Minimize the impact to avoid conflict.",
                "Short-term comfort, but trust drops.",
                (0, 2, -6),
                StepRef::step("step3"),
            ),
        ],
    };

    let step3 = Step {
        prompt: format!("{primary} follows up and asks what you will do if this happens again."),
        stakeholder: primary.clone(),
        ai_prompts: prompts(&["What is your Plan A and Plan B?", "How will you follow through?"]),
        choices: vec![
            choice(
                "plan",
                "Describe a plan and how you will follow through.",
                "You show accountability and growth.",
                (0, 2, 8),
                StepRef::End,
            ),
            choice(
                "avoid",
                "Give a vague answer to move on.",
                "You miss a chance to show responsibility.",
                (0, 2, -4),
                StepRef::End,
            ),
        ],
    };

    BTreeMap::from([
        ("step1".to_string(), step1),
        ("step2".to_string(), step2),
        ("step3".to_string(), step3),
    ])
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
