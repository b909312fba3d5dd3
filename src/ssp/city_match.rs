use crate::ssp::config::CityMatchConfig;
use std::collections::BTreeSet;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Connector words that never identify a place on their own.
const CONNECTOR_WORDS: [&str; 5] = ["dos", "das", "do", "da", "de"];
const MIN_WORD_CHARS: usize = 2;

/// Lowercase, fold diacritics, and split on non-alphanumeric boundaries,
/// rejoining tokens with single spaces.
pub fn normalize(name: &str) -> String {
    let folded: String = name.nfd().filter(|c| !is_combining_mark(*c)).collect();
    let lowered = folded.to_lowercase();

    let mut out = String::with_capacity(lowered.len());
    for token in lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(token);
    }
    out
}

fn significant_words(normalized: &str) -> BTreeSet<&str> {
    normalized
        .split(' ')
        .filter(|w| w.chars().count() > MIN_WORD_CHARS && !CONNECTOR_WORDS.contains(w))
        .collect()
}

/// Global similarity path: normalized Levenshtein ratio over the full
/// normalized strings. Tolerates minor spelling drift.
pub fn similarity_match(candidate_norm: &str, target_norm: &str, threshold: f64) -> bool {
    strsim::normalized_levenshtein(candidate_norm, target_norm) >= threshold
}

/// Significant-word-overlap path. Tolerates reordered or abbreviated
/// multi-word names. A target whose significant-word set is empty (single
/// short token) never passes here; only the similarity path can accept it.
pub fn significant_word_match(
    candidate_norm: &str,
    target_norm: &str,
    min_count: usize,
    min_ratio: f64,
) -> bool {
    let target_words = significant_words(target_norm);
    if target_words.is_empty() {
        return false;
    }
    let candidate_words = significant_words(candidate_norm);
    let overlap = target_words.intersection(&candidate_words).count();

    overlap >= min_count && (overlap as f64 / target_words.len().max(1) as f64) >= min_ratio
}

/// Does `candidate_raw` designate the same place as `target_city`?
/// Either acceptance path suffices.
pub fn matches(candidate_raw: &str, target_city: &str, cfg: &CityMatchConfig) -> bool {
    let candidate = normalize(candidate_raw);
    let target = normalize(target_city);
    if candidate.is_empty() || target.is_empty() {
        return false;
    }

    similarity_match(&candidate, &target, cfg.similarity_threshold)
        || significant_word_match(
            &candidate,
            &target,
            cfg.min_significant_words_count,
            cfg.min_significant_words_ratio,
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> CityMatchConfig {
        CityMatchConfig::default()
    }

    #[test]
    fn normalize_folds_case_diacritics_and_punctuation() {
        assert_eq!(normalize("São José dos Campos"), "sao jose dos campos");
        assert_eq!(normalize("S.JOSE  DOS CAMPOS"), "s jose dos campos");
        assert_eq!(normalize("  Santos!  "), "santos");
    }

    #[test]
    fn significant_words_drop_connectors_and_short_tokens() {
        let norm = normalize("São José dos Campos");
        let words = significant_words(&norm);
        assert_eq!(
            words.into_iter().collect::<Vec<_>>(),
            vec!["campos", "jose", "sao"]
        );
    }

    #[test]
    fn upper_case_unaccented_spelling_matches() {
        assert!(matches("SAO JOSE DOS CAMPOS", "São José dos Campos", &cfg()));
    }

    #[test]
    fn different_city_does_not_match() {
        assert!(!matches("Santos", "São José dos Campos", &cfg()));
    }

    #[test]
    fn reordered_words_match_through_word_overlap() {
        let candidate = "CAMPOS, SAO JOSE DOS";
        let target = "São José dos Campos";
        assert!(matches(candidate, target, &cfg()));
        assert!(significant_word_match(
            &normalize(candidate),
            &normalize(target),
            2,
            0.6
        ));
    }

    #[test]
    fn short_target_relies_on_similarity_path_only() {
        // "rio" is a single 3-letter significant word; overlap can never
        // reach the minimum count of 2.
        assert!(!significant_word_match(
            &normalize("Rio"),
            &normalize("Rio"),
            2,
            0.6
        ));
        assert!(matches("RIO", "Rio", &cfg()));
    }

    #[test]
    fn empty_significant_set_fails_the_overlap_path() {
        // A target reduced to one short token has no significant words at all.
        let target = normalize("Sé");
        assert!(significant_words(&target).is_empty());
        assert!(!significant_word_match(&normalize("se"), &target, 2, 0.6));
        assert!(matches("SE", "Sé", &cfg()));
    }

    #[test]
    fn small_spelling_drift_matches_through_similarity() {
        assert!(matches("Sao Jose dos Campoz", "São José dos Campos", &cfg()));
    }
}
