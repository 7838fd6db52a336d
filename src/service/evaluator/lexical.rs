//! Deterministic rule-based response evaluator
//!
//! Scores raw response text for brand/domain mentions, in-context sentiment
//! and list position without any external call. Zero cost, always available;
//! also serves as the fallback when delegate-AI scoring fails.

use regex::Regex;

use crate::model::TurnMetrics;

/// Signed word-count ceiling before mapping to the 0-100 sentiment scale
const SENTIMENT_CLAMP: i64 = 5;

/// Base recommendation once a brand mention exists
const RECOMMENDATION_BASE: f64 = 30.0;

const POSITIVE_WORDS: &[&str] = &[
    "best",
    "great",
    "excellent",
    "recommend",
    "recommended",
    "popular",
    "leading",
    "top",
    "reliable",
    "powerful",
    "intuitive",
    "favorite",
    "outstanding",
    "skvělý",
    "nejlepší",
    "doporučuji",
    "oblíbený",
];

const NEGATIVE_WORDS: &[&str] = &[
    "worst",
    "bad",
    "poor",
    "avoid",
    "unreliable",
    "expensive",
    "limited",
    "outdated",
    "clunky",
    "lacking",
    "špatný",
    "nedoporučuji",
    "drahý",
];

/// Words that introduce a comma/semicolon-delimited enumeration
const LIST_CONNECTORS: &[&str] = &[
    "include",
    "includes",
    "including",
    "such as",
    "like",
    "are",
    "jsou",
    "například",
    "patří",
];

fn position_score(position: usize) -> f64 {
    match position {
        1 => 100.0,
        2 => 80.0,
        3 => 60.0,
        4 => 40.0,
        5 => 20.0,
        _ => 0.0,
    }
}

fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

pub struct LexicalEvaluator {
    numbered_item: Regex,
    sentence_boundary: Regex,
}

impl LexicalEvaluator {
    pub fn new() -> Self {
        Self {
            // `1. item` or `2) item` at the start of a line
            numbered_item: Regex::new(r"(?m)^\s*(\d+)[.)]\s*(.+)$").expect("static regex"),
            // Punctuation ends a sentence only before whitespace or the end
            // of input, so dots embedded in domains do not split.
            sentence_boundary: Regex::new(r"[.!?]+(?:\s+|\z)").expect("static regex"),
        }
    }

    /// Score one response. Deterministic; identical input always yields
    /// identical metrics.
    pub fn evaluate(&self, response: &str, brand_terms: &[String], domain: &str) -> TurnMetrics {
        let lowered = response.to_lowercase();

        let brand_mentioned = brand_terms
            .iter()
            .any(|term| !term.is_empty() && lowered.contains(&term.to_lowercase()));
        let domain_mentioned = !domain.is_empty() && lowered.contains(&domain.to_lowercase());

        let visibility =
            if brand_mentioned { 50.0 } else { 0.0 } + if domain_mentioned { 50.0 } else { 0.0 };

        let sentiment = if brand_mentioned || domain_mentioned {
            Some(self.score_sentiment(response, brand_terms, domain))
        } else {
            None
        };

        // Ranking scans brand terms only, never the domain string.
        let ranking = if brand_mentioned {
            self.score_ranking(response, brand_terms)
        } else {
            0.0
        };

        // The composite requires brand presence, not just the domain.
        let recommendation = if brand_mentioned {
            let sentiment_term = sentiment.unwrap_or(50.0) - 50.0;
            clamp_score(
                RECOMMENDATION_BASE + visibility * 0.35 + sentiment_term * 0.35 + ranking * 0.3,
            )
        } else {
            0.0
        };

        TurnMetrics {
            visibility,
            sentiment,
            ranking,
            recommendation,
        }
    }

    /// Sentiment over sentences containing a brand or domain mention only;
    /// content unrelated to the brand must never contribute.
    fn score_sentiment(&self, response: &str, brand_terms: &[String], domain: &str) -> f64 {
        let mut terms: Vec<String> = brand_terms
            .iter()
            .filter(|t| !t.is_empty())
            .map(|t| t.to_lowercase())
            .collect();
        if !domain.is_empty() {
            terms.push(domain.to_lowercase());
        }

        let mut count: i64 = 0;
        for sentence in self.sentence_boundary.split(response) {
            let sentence = sentence.to_lowercase();
            if !terms.iter().any(|t| sentence.contains(t)) {
                continue;
            }
            for word in POSITIVE_WORDS {
                count += sentence.matches(word).count() as i64;
            }
            for word in NEGATIVE_WORDS {
                count -= sentence.matches(word).count() as i64;
            }
        }

        let clamped = count.clamp(-SENTIMENT_CLAMP, SENTIMENT_CLAMP);
        50.0 + clamped as f64 * 10.0
    }

    /// Detect the brand's position in numbered lists, colon-prefixed list
    /// lines, and connector-introduced delimited lists. The first strategy
    /// that finds a mention wins.
    fn score_ranking(&self, response: &str, brand_terms: &[String]) -> f64 {
        let terms: Vec<String> = brand_terms
            .iter()
            .filter(|t| !t.is_empty())
            .map(|t| t.to_lowercase())
            .collect();

        if let Some(score) = self.rank_in_numbered_list(response, &terms) {
            return score;
        }
        if let Some(score) = self.rank_in_colon_lines(response, &terms) {
            return score;
        }
        if let Some(score) = self.rank_in_connector_lists(response, &terms) {
            return score;
        }
        0.0
    }

    fn rank_in_numbered_list(&self, response: &str, terms: &[String]) -> Option<f64> {
        // First matching item wins; later occurrences never override it.
        for captures in self.numbered_item.captures_iter(response) {
            let position: usize = captures.get(1)?.as_str().parse().ok()?;
            let item = captures.get(2)?.as_str().to_lowercase();
            if terms.iter().any(|t| item.contains(t)) {
                return Some(position_score(position));
            }
        }
        None
    }

    fn rank_in_colon_lines(&self, response: &str, terms: &[String]) -> Option<f64> {
        for line in response.lines() {
            let Some((_, items)) = line.split_once(':') else {
                continue;
            };
            if let Some(score) = rank_in_items(items, terms) {
                return Some(score);
            }
        }
        None
    }

    fn rank_in_connector_lists(&self, response: &str, terms: &[String]) -> Option<f64> {
        for sentence in self.sentence_boundary.split(response) {
            let lowered = sentence.to_lowercase();
            let Some(connector_end) = LIST_CONNECTORS
                .iter()
                .filter_map(|c| lowered.find(c).map(|i| i + c.len()))
                .min()
            else {
                continue;
            };
            // connector_end indexes the lowercased copy; case folding can
            // change byte lengths, so slice the same copy.
            if let Some(score) = rank_in_items(&lowered[connector_end..], terms) {
                return Some(score);
            }
        }
        None
    }
}

impl Default for LexicalEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

/// Position of the first term match within the first 5 delimited items
fn rank_in_items(items: &str, terms: &[String]) -> Option<f64> {
    for (index, item) in items.split([',', ';']).take(5).enumerate() {
        let item = item.to_lowercase();
        if terms.iter().any(|t| item.contains(t)) {
            return Some(position_score(index + 1));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brands() -> Vec<String> {
        vec!["Acme".to_string()]
    }

    fn eval(response: &str) -> TurnMetrics {
        LexicalEvaluator::new().evaluate(response, &brands(), "acme.com")
    }

    // Brand term that is not a substring of the domain, for domain-only cases
    fn eval_corp(response: &str) -> TurnMetrics {
        LexicalEvaluator::new().evaluate(response, &[
            "Acme Corp".to_string()
        ], "acme.com")
    }

    #[test]
    fn visibility_is_additive_over_brand_and_domain() {
        assert_eq!(eval_corp("Nothing relevant here.").visibility, 0.0);
        assert_eq!(eval_corp("Acme Corp is a tool.").visibility, 50.0);
        assert_eq!(eval_corp("See acme.com for details.").visibility, 50.0);
        assert_eq!(eval_corp("Acme Corp lives at acme.com.").visibility, 100.0);
    }

    #[test]
    fn sentiment_is_undefined_without_any_mention() {
        let metrics = eval("The best project tools are widely known.");
        assert_eq!(metrics.sentiment, None);
        assert_eq!(metrics.visibility, 0.0);
    }

    #[test]
    fn sentiment_counts_only_mention_sentences() {
        // "best" appears in a sentence without a mention and must not count
        let metrics = eval("Many tools are the best ever. Acme is reliable.");
        assert_eq!(metrics.sentiment, Some(60.0));
    }

    #[test]
    fn sentiment_clamps_extreme_counts() {
        let praise =
            "Acme is the best, great, excellent, reliable, powerful, outstanding, popular tool.";
        assert_eq!(eval(praise).sentiment, Some(100.0));

        let scorn = "Acme is the worst, bad, poor, unreliable, outdated, clunky, limited tool.";
        assert_eq!(eval(scorn).sentiment, Some(0.0));
    }

    #[test]
    fn negative_words_pull_sentiment_down() {
        let metrics = eval("Acme is expensive.");
        assert_eq!(metrics.sentiment, Some(40.0));
    }

    #[test]
    fn ranking_from_numbered_list() {
        let metrics = eval("Top picks:\n1. Acme\n2. Rival\n3. Other");
        assert_eq!(metrics.ranking, 100.0);

        let metrics = eval("Top picks:\n1. Rival\n2) Acme\n3. Other");
        assert_eq!(metrics.ranking, 80.0);
    }

    #[test]
    fn ranking_from_colon_line() {
        let metrics = eval("Recommended tools: Rival, Acme, Other");
        assert_eq!(metrics.ranking, 80.0);
    }

    #[test]
    fn ranking_from_connector_list() {
        let metrics = eval("Popular options include Rival, Other, Acme and more!");
        assert_eq!(metrics.ranking, 60.0);
    }

    #[test]
    fn ranking_beyond_fifth_position_scores_zero() {
        let metrics = eval("1. A\n2. B\n3. C\n4. D\n5. E\n6. Acme");
        assert_eq!(metrics.ranking, 0.0);
    }

    #[test]
    fn ranking_never_triggers_on_domain_alone() {
        // Brand mentioned in prose, only the domain sits in the list
        let metrics = eval_corp("Acme Corp is okay.\n1. acme.com\n2. Rival");
        assert_eq!(metrics.visibility, 100.0);
        assert_eq!(metrics.ranking, 0.0);
    }

    #[test]
    fn recommendation_zero_gate_without_brand() {
        // Domain mention alone yields visibility but no recommendation
        let metrics = eval_corp("Check acme.com, a great site.");
        assert_eq!(metrics.visibility, 50.0);
        assert_eq!(metrics.recommendation, 0.0);
        assert_eq!(metrics.sentiment, Some(60.0));
    }

    #[test]
    fn recommendation_composite_and_clamp() {
        let metrics = eval("1. Acme (acme.com) is the best and most reliable choice!");
        assert_eq!(metrics.visibility, 100.0);
        assert_eq!(metrics.ranking, 100.0);
        // 30 + 100*0.35 + (70-50)*0.35 + 100*0.3 = 102 -> clamped
        assert_eq!(metrics.recommendation, 100.0);
    }

    #[test]
    fn brand_matching_is_case_insensitive() {
        let metrics = eval("ACME is decent.");
        assert_eq!(metrics.visibility, 50.0);
    }

    #[test]
    fn connector_ranking_survives_multibyte_case_folding() {
        // 'İ' lowercases to a longer byte sequence, shifting every offset
        // after it relative to the original string
        let metrics = eval("İİtems such as Čival, Acme");
        assert_eq!(metrics.ranking, 80.0);
    }

    #[test]
    fn sentence_split_keeps_embedded_domain_dots() {
        // The dot inside acme.com is not a sentence boundary, and the
        // negative word in the unrelated sentence must not count
        let metrics = eval_corp("Visit acme.com for a great overview. Rival tools are bad.");
        assert_eq!(metrics.sentiment, Some(60.0));
    }

    #[test]
    fn numbered_list_first_match_wins() {
        // A later position-1 occurrence must not override the first match
        let metrics = eval("1. Rival\n2. Other\n3. Acme\nAlternatives:\n1. Acme again");
        assert_eq!(metrics.ranking, 60.0);
    }
}
