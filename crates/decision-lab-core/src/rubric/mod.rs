//! Keyword rubric scoring for written justifications.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// One weighted keyword criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub name: String,
    pub keywords: Vec<String>,
    pub max: u32,
    /// Descriptive fields carried through to score results untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Criterion {
    pub fn new(name: impl Into<String>, keywords: &[&str], max: u32) -> Self {
        Self {
            name: name.into(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            max,
            extra: serde_json::Map::new(),
        }
    }

    /// Score against already lower-cased text.
    ///
    /// The doubling lets a partial keyword match reach the cap: with two
    /// keywords and `max = 4`, one hit already scores 4.
    fn score_lower(&self, lower: &str) -> u32 {
        let matches = self
            .keywords
            .iter()
            .filter(|keyword| lower.contains(&keyword.to_lowercase()))
            .count();
        if matches == 0 {
            return 0;
        }
        let raw = (matches as f64 / self.keywords.len() as f64) * f64::from(self.max) * 2.0;
        (raw.ceil() as u32).min(self.max)
    }
}

/// Vocabulary for the three parts of a justification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredGroups {
    pub tools: Vec<String>,
    pub concepts: Vec<String>,
    pub why: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Group {
    Tools,
    Concepts,
    Why,
}

impl Group {
    pub const ALL: [Group; 3] = [Group::Tools, Group::Concepts, Group::Why];

    pub fn name(self) -> &'static str {
        match self {
            Group::Tools => "tools",
            Group::Concepts => "concepts",
            Group::Why => "why",
        }
    }

    fn label(self) -> &'static Regex {
        match self {
            Group::Tools => &TOOL_LABEL,
            Group::Concepts => &CONCEPT_LABEL,
            Group::Why => &WHY_LABEL,
        }
    }
}

// "Tool: ..." style prefix followed by some content.
static TOOL_LABEL: LazyLock<Regex> = LazyLock::new(|| label_pattern("tool"));
static CONCEPT_LABEL: LazyLock<Regex> = LazyLock::new(|| label_pattern("concept"));
static WHY_LABEL: LazyLock<Regex> = LazyLock::new(|| label_pattern("why"));

fn label_pattern(label: &str) -> Regex {
    Regex::new(&format!(r"(?i)\b{label}\s*:\s*\b")).expect("label pattern is a valid regex")
}

impl RequiredGroups {
    pub fn keywords(&self, group: Group) -> &[String] {
        match group {
            Group::Tools => &self.tools,
            Group::Concepts => &self.concepts,
            Group::Why => &self.why,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rubric {
    pub criteria: Vec<Criterion>,
    pub minimum_length: usize,
    pub length_score: u32,
    pub required_groups: RequiredGroups,
}

impl Rubric {
    /// Parse and validate a rubric document.
    pub fn from_json(json: &str) -> Result<Self, RubricError> {
        let rubric: Rubric =
            serde_json::from_str(json).map_err(|e| RubricError::Invalid(e.to_string()))?;
        rubric.validate()?;
        Ok(rubric)
    }

    pub fn to_json(&self) -> Result<String, RubricError> {
        serde_json::to_string_pretty(self).map_err(|e| RubricError::Serialize(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), RubricError> {
        if self.criteria.is_empty() {
            return Err(RubricError::Invalid("rubric has no criteria".to_string()));
        }
        for criterion in &self.criteria {
            if criterion.name.trim().is_empty() {
                return Err(RubricError::Invalid("criterion without a name".to_string()));
            }
            if criterion.max == 0 {
                return Err(RubricError::Invalid(format!(
                    "criterion {} has max 0",
                    criterion.name
                )));
            }
            if criterion.keywords.is_empty() {
                return Err(RubricError::Invalid(format!(
                    "criterion {} has no keywords",
                    criterion.name
                )));
            }
        }
        Ok(())
    }

    /// Score a justification. Pure; the same text always scores the same.
    pub fn score(&self, justification: &str) -> ScoreResult {
        let lower = justification.to_lowercase();

        let scores = self
            .criteria
            .iter()
            .map(|criterion| CriterionScore {
                criterion: criterion.clone(),
                score: criterion.score_lower(&lower),
            })
            .collect();

        let length_bonus = if lower.encode_utf16().count() >= self.minimum_length {
            self.length_score
        } else {
            0
        };

        let matched = |group: Group| {
            self.required_groups
                .keywords(group)
                .iter()
                .any(|keyword| lower.contains(&keyword.to_lowercase()))
                || group.label().is_match(&lower)
        };
        let group_matches = GroupMatches {
            tools: matched(Group::Tools),
            concepts: matched(Group::Concepts),
            why: matched(Group::Why),
        };

        ScoreResult {
            scores,
            length_bonus,
            matched_group_count: group_matches.count(),
            missing_groups: group_matches
                .missing()
                .map(|group| group.name().to_string())
                .collect(),
            group_matches,
        }
    }
}

/// Free function form of [`Rubric::score`].
pub fn score(justification: &str, rubric: &Rubric) -> ScoreResult {
    rubric.score(justification)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionScore {
    #[serde(flatten)]
    pub criterion: Criterion,
    pub score: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMatches {
    pub tools: bool,
    pub concepts: bool,
    pub why: bool,
}

impl GroupMatches {
    pub fn get(&self, group: Group) -> bool {
        match group {
            Group::Tools => self.tools,
            Group::Concepts => self.concepts,
            Group::Why => self.why,
        }
    }

    pub fn count(&self) -> usize {
        Group::ALL.iter().filter(|g| self.get(**g)).count()
    }

    pub fn missing(&self) -> impl Iterator<Item = Group> + '_ {
        Group::ALL.into_iter().filter(|g| !self.get(*g))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    pub scores: Vec<CriterionScore>,
    pub length_bonus: u32,
    pub group_matches: GroupMatches,
    pub matched_group_count: usize,
    pub missing_groups: Vec<String>,
}

impl ScoreResult {
    /// Sum of criterion scores plus the length bonus.
    pub fn total(&self) -> u32 {
        self.scores.iter().map(|s| s.score).sum::<u32>() + self.length_bonus
    }
}

/// The three answer boxes of a decision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Justification {
    pub tool: String,
    pub concept: String,
    pub why: String,
}

impl Justification {
    pub fn new(tool: &str, concept: &str, why: &str) -> Self {
        Self {
            tool: tool.trim().to_string(),
            concept: concept.trim().to_string(),
            why: why.trim().to_string(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !(self.tool.is_empty() || self.concept.is_empty() || self.why.is_empty())
    }

    /// Canonical submission text.
    pub fn render(&self) -> String {
        format!(
            "Tool: {} Concept: {} Why: {}",
            self.tool, self.concept, self.why
        )
    }
}

/// Errors from rubric loading.
#[derive(Debug, thiserror::Error)]
pub enum RubricError {
    #[error("invalid rubric: {0}")]
    Invalid(String),
    #[error("failed to serialize rubric: {0}")]
    Serialize(String),
}
