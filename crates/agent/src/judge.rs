//! Decides whether an evaluation accepts the drafted answer.

/// Classifies the evaluator's free-text verdict.
pub trait CompletionJudge: Send + Sync {
    /// True when the evaluation says the answer is complete.
    fn is_complete(&self, evaluation: &str) -> bool;
}

/// Accepts when the evaluation contains one of a set of phrases, ignoring case.
#[derive(Debug, Clone)]
pub struct KeywordJudge {
    phrases: Vec<String>,
}

impl KeywordJudge {
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            phrases: phrases
                .into_iter()
                .map(|p| p.into().to_lowercase())
                .collect(),
        }
    }
}

impl Default for KeywordJudge {
    fn default() -> Self {
        Self::new(["fully answers", "fully addresses"])
    }
}

impl CompletionJudge for KeywordJudge {
    fn is_complete(&self, evaluation: &str) -> bool {
        let lower = evaluation.to_lowercase();
        self.phrases.iter().any(|p| lower.contains(p.as_str()))
    }
}
