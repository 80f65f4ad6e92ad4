//! Fuzzy scoring of headers against known keys and synonyms.
//!
//! Uses Jaro-Winkler similarity on compact forms, which rewards shared
//! prefixes and tolerates the dropped letters typical of abbreviations
//! ("qty" against "qnty").

use std::collections::BTreeMap;

use rapidfuzz::distance::jaro_winkler;

use dqf_common::compact;
use dqf_schema::KnownTerm;

/// Best fuzzy candidate for a header.
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyMatch<'a> {
    pub key: &'a str,
    /// Compact term that produced the best score.
    pub term: String,
    pub similarity: f64,
}

pub fn similarity(a: &str, b: &str) -> f64 {
    jaro_winkler::similarity(a.chars(), b.chars())
}

/// Scores `header` against every term and returns the best column at or
/// above `threshold`.
///
/// Each column keeps its best term. Equal scores resolve to the lexically
/// smallest key.
pub fn best_fuzzy_match<'a>(
    header: &str,
    terms: &[KnownTerm<'a>],
    threshold: f64,
) -> Option<FuzzyMatch<'a>> {
    let needle = compact(header);
    if needle.is_empty() {
        return None;
    }

    let mut per_column: BTreeMap<&'a str, (f64, &str)> = BTreeMap::new();
    for term in terms {
        let score = similarity(&needle, &term.compact);
        let best = per_column.entry(term.key).or_insert((score, term.compact.as_str()));
        if score > best.0 {
            *best = (score, term.compact.as_str());
        }
    }

    let mut winner: Option<FuzzyMatch<'a>> = None;
    for (key, (score, term)) in per_column {
        if winner.as_ref().is_none_or(|current| score > current.similarity) {
            winner = Some(FuzzyMatch {
                key,
                term: term.to_string(),
                similarity: score,
            });
        }
    }
    winner.filter(|found| found.similarity >= threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms() -> Vec<KnownTerm<'static>> {
        vec![
            KnownTerm {
                compact: "quantity".to_string(),
                key: "quantity",
            },
            KnownTerm {
                compact: "qnty".to_string(),
                key: "quantity",
            },
            KnownTerm {
                compact: "currency".to_string(),
                key: "currency",
            },
        ]
    }

    #[test]
    fn abbreviation_matches_synonym() {
        let found = best_fuzzy_match("Qty", &terms(), 0.85).expect("fuzzy match");
        assert_eq!(found.key, "quantity");
        assert_eq!(found.term, "qnty");
        assert!(found.similarity > 0.9 && found.similarity < 1.0);
    }

    #[test]
    fn below_threshold_is_rejected() {
        assert!(best_fuzzy_match("shipping", &terms(), 0.85).is_none());
        assert!(best_fuzzy_match("%%", &[], 0.85).is_none());
    }

    #[test]
    fn ties_prefer_smaller_key() {
        let terms = vec![
            KnownTerm {
                compact: "abcx".to_string(),
                key: "zeta",
            },
            KnownTerm {
                compact: "abcx".to_string(),
                key: "alpha",
            },
        ];
        let found = best_fuzzy_match("abcy", &terms, 0.5).expect("match");
        assert_eq!(found.key, "alpha");
    }
}
