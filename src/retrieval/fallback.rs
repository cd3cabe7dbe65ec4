//! Alternate spellings tried when a query returns nothing

use serde::Serialize;

/// A pure transform of the original query.
///
/// Every strategy works on the lowercased query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackStrategy {
    Lowercase,
    FirstToken,
    StripNonAlphanumeric,
    FirstTwoTokens,
}

impl FallbackStrategy {
    pub fn apply(&self, query: &str) -> String {
        let lowered = query.to_lowercase();
        match self {
            FallbackStrategy::Lowercase => lowered,
            FallbackStrategy::FirstToken => tokens(&lowered).next().unwrap_or_default().to_string(),
            FallbackStrategy::StripNonAlphanumeric => {
                lowered.chars().filter(|c| c.is_alphanumeric()).collect()
            }
            FallbackStrategy::FirstTwoTokens => {
                tokens(&lowered).take(2).collect::<Vec<_>>().join(" ")
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FallbackStrategy::Lowercase => "lowercase",
            FallbackStrategy::FirstToken => "first_token",
            FallbackStrategy::StripNonAlphanumeric => "strip_non_alphanumeric",
            FallbackStrategy::FirstTwoTokens => "first_two_tokens",
        }
    }
}

/// Split on whitespace and hyphens, dropping empty pieces
fn tokens(query: &str) -> impl Iterator<Item = &str> {
    query
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|token| !token.is_empty())
}

/// Progress through the chain for one original query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FallbackState {
    /// Index of the next strategy to try
    pub index: usize,
    /// Every query already sent, the original included
    attempted: Vec<String>,
}

impl FallbackState {
    pub fn new(original: &str) -> Self {
        Self {
            index: 0,
            attempted: vec![original.to_string()],
        }
    }

    pub fn attempted(&self) -> &[String] {
        &self.attempted
    }
}

/// A query produced by the chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackCandidate {
    pub query: String,
    pub strategy: FallbackStrategy,
    /// 1-based position of the strategy in the chain
    pub position: usize,
}

/// Ordered list of strategies
#[derive(Debug, Clone)]
pub struct FallbackChain {
    strategies: Vec<FallbackStrategy>,
}

impl Default for FallbackChain {
    fn default() -> Self {
        Self::new(vec![
            FallbackStrategy::Lowercase,
            FallbackStrategy::FirstToken,
            FallbackStrategy::StripNonAlphanumeric,
            FallbackStrategy::FirstTwoTokens,
        ])
    }
}

impl FallbackChain {
    pub fn new(strategies: Vec<FallbackStrategy>) -> Self {
        Self { strategies }
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Next candidate for `original`, or `None` once the chain is exhausted.
    ///
    /// Strategies whose output is empty or was already attempted are skipped
    /// without being returned.
    pub fn try_next(&self, original: &str, state: &mut FallbackState) -> Option<FallbackCandidate> {
        while let Some(strategy) = self.strategies.get(state.index) {
            state.index += 1;

            let candidate = strategy.apply(original).trim().to_string();
            if candidate.is_empty() || state.attempted.contains(&candidate) {
                tracing::debug!(
                    "Skipping fallback strategy {} for {:?}: no new query",
                    strategy.name(),
                    original
                );
                continue;
            }

            state.attempted.push(candidate.clone());
            return Some(FallbackCandidate {
                query: candidate,
                strategy: *strategy,
                position: state.index,
            });
        }

        None
    }
}
