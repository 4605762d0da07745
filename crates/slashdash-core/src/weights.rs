use crate::synonyms::AliasMap;

/// Multiplier applied to prefix-containment matches.
pub const PREFIX_DISCOUNT: f64 = 0.7;
/// Multiplier applied to edit-distance matches.
pub const DISTANCE_DISCOUNT: f64 = 0.6;
/// Edit-distance similarity must be strictly above this to count.
pub const MIN_SIMILARITY: f64 = 0.7;

// ---------------------------------------------------------------------------
// WeightCalculator
// ---------------------------------------------------------------------------

/// Scores an input verb against a set of weighted aliases.
///
/// An exact alias hit returns the alias weight unchanged. Otherwise every
/// alias is tried as a prefix match (discounted by [`PREFIX_DISCOUNT`]) and as
/// an edit-distance match (discounted by [`DISTANCE_DISCOUNT`]), and the best
/// qualifying score wins. Because both discounts are below 1.0, an exact match
/// always outranks any fuzzy match on the same alias, and at equal similarity
/// a prefix match outranks an edit-distance match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightCalculator {
    fuzzy_match: bool,
}

impl Default for WeightCalculator {
    fn default() -> Self {
        Self { fuzzy_match: true }
    }
}

impl WeightCalculator {
    pub fn new(fuzzy_match: bool) -> Self {
        Self { fuzzy_match }
    }

    pub fn fuzzy_match_enabled(&self) -> bool {
        self.fuzzy_match
    }

    /// Confidence in `[0, 100]` that `input` means one of `aliases`.
    pub fn calculate(&self, input: &str, aliases: &AliasMap) -> f64 {
        let input = input.trim().to_lowercase();

        if let Some(weight) = aliases.get(&input) {
            return *weight;
        }

        if self.fuzzy_match {
            return fuzzy_score(&input, aliases);
        }

        0.0
    }

    /// Score `input` against several command groups. Only positive scores are
    /// returned, best first; equal scores keep the iteration order of `groups`.
    pub fn calculate_multi<'a, I>(&self, input: &str, groups: I) -> Vec<(String, f64)>
    where
        I: IntoIterator<Item = (&'a str, &'a AliasMap)>,
    {
        let mut results: Vec<(String, f64)> = groups
            .into_iter()
            .map(|(command, aliases)| (command.to_string(), self.calculate(input, aliases)))
            .filter(|(_, score)| *score > 0.0)
            .collect();
        results.sort_by(|a, b| b.1.total_cmp(&a.1));
        results
    }
}

fn fuzzy_score(input: &str, aliases: &AliasMap) -> f64 {
    let input_len = input.chars().count();
    let mut best = 0.0_f64;

    for (alias, weight) in aliases {
        let alias_len = alias.chars().count();
        let max_len = input_len.max(alias_len);
        if max_len == 0 {
            continue;
        }

        if alias.starts_with(input) || input.starts_with(alias.as_str()) {
            let ratio = input_len.min(alias_len) as f64 / max_len as f64;
            best = best.max(weight * ratio * PREFIX_DISCOUNT);
        }

        let similarity = 1.0 - levenshtein(input, alias) as f64 / max_len as f64;
        if similarity > MIN_SIMILARITY {
            best = best.max(weight * similarity * DISTANCE_DISCOUNT);
        }
    }

    best
}

// ---------------------------------------------------------------------------
// Levenshtein
// ---------------------------------------------------------------------------

/// Classic edit distance with unit-cost insertion, deletion and substitution,
/// measured in Unicode scalar values.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
