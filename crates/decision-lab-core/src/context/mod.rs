use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::rng::{pick, Mulberry32};

const SETTINGS: [&str; 20] = [
    "school hallway",
    "cafeteria",
    "bus stop",
    "after-school program",
    "practice field",
    "group chat",
    "library",
    "community center",
    "part-time job",
    "family living room",
    "neighborhood park",
    "student council",
    "club meeting",
    "classroom presentation",
    "online forum",
    "school event",
    "volunteer site",
    "tutoring session",
    "workplace shift",
    "team meeting",
];

const STAKEHOLDERS: [(&str, &str); 8] = [
    ("Peer", "Teacher"),
    ("Coach", "Parent"),
    ("Manager", "Guardian"),
    ("Friend", "Sibling"),
    ("Team lead", "Advisor"),
    ("Group partner", "Teacher"),
    ("Supervisor", "Parent"),
    ("Roommate", "Mentor"),
];

const STAKE_SETS: [[&str; 3]; 8] = [
    ["Reputation", "Trust", "Long-term goals"],
    ["Safety", "Peer pressure", "Decision ownership"],
    ["Time pressure", "Grades", "Accountability"],
    ["Family stability", "Finances", "Responsibility"],
    ["Health", "Team impact", "Future opportunities"],
    ["Digital behavior", "Respect", "Credibility"],
    ["Employment", "Reliability", "School performance"],
    ["Conflict resolution", "Relationships", "Values"],
];

/// The two people a student deals with during a week's scenarios.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StakeholderPair {
    pub primary: String,
    pub secondary: String,
}

impl StakeholderPair {
    pub fn new(primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            secondary: secondary.into(),
        }
    }
}

/// Setting, stakeholders and stakes shared by one week of scenarios.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    pub setting: String,
    pub stakeholder: StakeholderPair,
    pub stakes: [String; 3],
}

impl Context {
    /// Composite key used for de-duplication within a year.
    pub fn key(&self) -> ContextKey {
        ContextKey {
            setting: self.setting.clone(),
            primary: self.stakeholder.primary.clone(),
            first_stake: self.stakes[0].clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContextKey {
    pub setting: String,
    pub primary: String,
    pub first_stake: String,
}

/// Pools the sampler draws from.
#[derive(Debug, Clone)]
pub struct ContextCorpus {
    pub settings: Vec<String>,
    pub stakeholders: Vec<StakeholderPair>,
    pub stake_sets: Vec<[String; 3]>,
}

impl ContextCorpus {
    pub fn builtin() -> Self {
        Self {
            settings: SETTINGS.iter().map(|s| s.to_string()).collect(),
            stakeholders: STAKEHOLDERS
                .iter()
                .map(|(primary, secondary)| StakeholderPair::new(*primary, *secondary))
                .collect(),
            stake_sets: STAKE_SETS
                .iter()
                .map(|set| set.map(|stake| stake.to_string()))
                .collect(),
        }
    }

    /// Number of distinct de-duplication keys this corpus can produce.
    pub fn distinct_keys(&self) -> usize {
        let settings: HashSet<&str> = self.settings.iter().map(String::as_str).collect();
        let primaries: HashSet<&str> = self
            .stakeholders
            .iter()
            .map(|pair| pair.primary.as_str())
            .collect();
        let first_stakes: HashSet<&str> =
            self.stake_sets.iter().map(|set| set[0].as_str()).collect();
        settings.len() * primaries.len() * first_stakes.len()
    }
}

impl Default for ContextCorpus {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Errors from curriculum generation.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("could only sample {found} of {wanted} unique contexts after {attempts} draws")]
    Exhausted {
        wanted: usize,
        found: usize,
        attempts: usize,
    },
}

/// Draws unique contexts from a corpus.
pub struct ContextSampler<'a> {
    corpus: &'a ContextCorpus,
    max_attempts: usize,
}

impl<'a> ContextSampler<'a> {
    pub fn new(corpus: &'a ContextCorpus, max_attempts: usize) -> Self {
        Self {
            corpus,
            max_attempts,
        }
    }

    /// Sample `count` contexts, pairwise distinct on their key.
    ///
    /// Each draw consumes three values from `rng` (setting, stakeholders,
    /// stakes), including draws that are discarded as duplicates.
    pub fn sample(&self, rng: &mut Mulberry32, count: usize) -> Result<Vec<Context>, GenerationError> {
        let available = self.corpus.distinct_keys();
        if available < count {
            return Err(GenerationError::Exhausted {
                wanted: count,
                found: available,
                attempts: 0,
            });
        }

        let mut contexts = Vec::with_capacity(count);
        let mut seen = HashSet::with_capacity(count);
        let mut attempts = 0;

        while contexts.len() < count {
            if attempts >= self.max_attempts {
                return Err(GenerationError::Exhausted {
                    wanted: count,
                    found: contexts.len(),
                    attempts,
                });
            }
            attempts += 1;

            let (Some(setting), Some(stakeholder), Some(stakes)) = (
                pick(&self.corpus.settings, rng),
                pick(&self.corpus.stakeholders, rng),
                pick(&self.corpus.stake_sets, rng),
            ) else {
                // An empty pool has no keys and already failed the capacity check.
                break;
            };

            let context = Context {
                setting: setting.clone(),
                stakeholder: stakeholder.clone(),
                stakes: stakes.clone(),
            };
            if !seen.insert(context.key()) {
                continue;
            }
            contexts.push(context);
        }

        debug!(count = contexts.len(), attempts, "sampled contexts");
        Ok(contexts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_corpus_sizes() {
        let corpus = ContextCorpus::builtin();
        assert_eq!(corpus.settings.len(), 20);
        assert_eq!(corpus.stakeholders.len(), 8);
        assert_eq!(corpus.stake_sets.len(), 8);
        assert_eq!(corpus.distinct_keys(), 1280);
    }

    #[test]
    fn test_sample_reference_contexts() {
        let corpus = ContextCorpus::builtin();
        let mut rng = Mulberry32::from_seed_str("20260202");
        let contexts = ContextSampler::new(&corpus, 10_000)
            .sample(&mut rng, 40)
            .unwrap();
        assert_eq!(contexts.len(), 40);

        assert_eq!(contexts[0].setting, "school event");
        assert_eq!(contexts[0].stakeholder.primary, "Manager");
        assert_eq!(contexts[0].stakes[0], "Reputation");
        assert_eq!(contexts[1].setting, "practice field");
        assert_eq!(contexts[1].stakeholder.primary, "Group partner");
        assert_eq!(contexts[2].setting, "workplace shift");
        assert_eq!(contexts[2].stakes[0], "Family stability");
    }

    #[test]
    fn test_sample_keys_unique() {
        let corpus = ContextCorpus::builtin();
        let mut rng = Mulberry32::from_seed_str("uniqueness");
        let contexts = ContextSampler::new(&corpus, 10_000)
            .sample(&mut rng, 200)
            .unwrap();
        let keys: HashSet<ContextKey> = contexts.iter().map(Context::key).collect();
        assert_eq!(keys.len(), 200);
    }

    #[test]
    fn test_small_corpus_fails_fast() {
        let corpus = ContextCorpus {
            settings: vec!["library".to_string(), "library".to_string()],
            stakeholders: vec![StakeholderPair::new("Peer", "Teacher")],
            stake_sets: vec![[
                "Trust".to_string(),
                "Grades".to_string(),
                "Values".to_string(),
            ]],
        };
        assert_eq!(corpus.distinct_keys(), 1);

        let mut rng = Mulberry32::new(1);
        let err = ContextSampler::new(&corpus, 10_000)
            .sample(&mut rng, 2)
            .unwrap_err();
        assert!(matches!(
            err,
            GenerationError::Exhausted {
                wanted: 2,
                found: 1,
                attempts: 0
            }
        ));
    }

    #[test]
    fn test_attempt_bound() {
        let corpus = ContextCorpus::builtin();
        let mut rng = Mulberry32::new(42);
        let err = ContextSampler::new(&corpus, 5)
            .sample(&mut rng, 40)
            .unwrap_err();
        match err {
            GenerationError::Exhausted {
                wanted, attempts, ..
            } => {
                assert_eq!(wanted, 40);
                assert_eq!(attempts, 5);
            }
        }
    }

    #[test]
    fn test_empty_corpus() {
        let corpus = ContextCorpus {
            settings: Vec::new(),
            stakeholders: Vec::new(),
            stake_sets: Vec::new(),
        };
        let mut rng = Mulberry32::new(1);
        assert!(ContextSampler::new(&corpus, 10).sample(&mut rng, 1).is_err());
        assert!(ContextSampler::new(&corpus, 10)
            .sample(&mut rng, 0)
            .unwrap()
            .is_empty());
    }
}
