use std::collections::HashMap;

use crate::models::ThemeEntry;

pub const DEFAULT_TOP_N: usize = 10;

/// Tokens this short carry no topic signal ("and", "the", "was").
const MIN_TOKEN_CHARS: usize = 4;

/// ASCII letters, digits and `_`. Accented letters split words, as in the web client.
fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Ranks words across all `texts` by frequency. Ties keep first-seen order.
pub fn extract_themes<S: AsRef<str>>(texts: &[S], top_n: usize) -> Vec<ThemeEntry> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<ThemeEntry> = Vec::new();

    for text in texts {
        let lowered = text.as_ref().to_lowercase();
        for token in lowered.split(|c: char| !is_word_char(c)) {
            if token.chars().count() < MIN_TOKEN_CHARS {
                continue;
            }
            match index.get(token) {
                Some(&position) => counts[position].count += 1,
                None => {
                    index.insert(token.to_string(), counts.len());
                    counts.push(ThemeEntry {
                        word: token.to_string(),
                        count: 1,
                    });
                }
            }
        }
    }

    // sort_by is stable, which preserves first-seen order within equal counts
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(top_n);
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(word: &str, count: usize) -> ThemeEntry {
        ThemeEntry {
            word: word.to_string(),
            count,
        }
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let themes = extract_themes(
            &["Great communication skills.", "Great teamwork and communication."],
            2,
        );
        assert_eq!(themes, vec![entry("great", 2), entry("communication", 2)]);
    }

    #[test]
    fn short_tokens_are_dropped() {
        let themes = extract_themes(&["The team and the plan was good"], DEFAULT_TOP_N);
        assert_eq!(
            themes,
            vec![entry("team", 1), entry("plan", 1), entry("good", 1)]
        );
    }

    #[test]
    fn higher_counts_rank_first() {
        let themes = extract_themes(
            &[
                "Helpful reviewer, helpful notes",
                "Always helpful; deadlines slipped",
                "deadlines again",
            ],
            3,
        );
        assert_eq!(
            themes,
            vec![entry("helpful", 3), entry("deadlines", 2), entry("reviewer", 1)]
        );
    }

    #[test]
    fn empty_corpus_yields_nothing() {
        let texts: Vec<String> = Vec::new();
        assert!(extract_themes(&texts, DEFAULT_TOP_N).is_empty());
        assert!(extract_themes(&[""], DEFAULT_TOP_N).is_empty());
        assert!(extract_themes(&["great great"], 0).is_empty());
    }

    #[test]
    fn non_ascii_letters_split_words() {
        assert!(extract_themes(&["Café résumé naïve"], DEFAULT_TOP_N).is_empty());
        assert_eq!(
            extract_themes(&["Élan and teamwork: équipe teamwork"], DEFAULT_TOP_N),
            vec![entry("teamwork", 2), entry("quipe", 1)]
        );
    }

    #[test]
    fn underscores_stay_inside_words() {
        let themes = extract_themes(&["snake_case naming, snake_case again"], 1);
        assert_eq!(themes, vec![entry("snake_case", 2)]);
    }
}
