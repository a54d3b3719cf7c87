//! Keyword-overlap fragment selection.
//!
//! A deliberately crude heuristic: keywords are the question's whitespace-separated tokens
//! longer than [`MIN_KEYWORD_CHARS`] characters, and a fragment scores one point per
//! keyword found anywhere in it (case-insensitive substring match). The highest score wins,
//! the earliest fragment wins ties, and with no match at all the first fragment is used.

use crate::document::Fragment;

/// Tokens must be strictly longer than this to count as keywords.
pub const MIN_KEYWORD_CHARS: usize = 3;

/// Lowercased keywords of `question`, in order, repeats kept.
pub fn keywords(question: &str) -> Vec<String> {
    question
        .to_lowercase()
        .split_whitespace()
        .filter(|word| word.chars().count() > MIN_KEYWORD_CHARS)
        .map(str::to_string)
        .collect()
}

/// Number of `keywords` occurring in `text`.
pub fn score(keywords: &[String], text: &str) -> usize {
    let text = text.to_lowercase();
    keywords.iter().filter(|k| text.contains(k.as_str())).count()
}

/// Picks the fragment most relevant to `question`. `None` only if `fragments` is empty.
pub fn select_fragment<'a>(question: &str, fragments: &'a [Fragment]) -> Option<&'a Fragment> {
    let keywords = keywords(question);
    let mut best = fragments.first()?;
    let mut best_score = 0;

    for fragment in fragments {
        let s = score(&keywords, &fragment.text);
        if s > best_score {
            best_score = s;
            best = fragment;
        }
    }

    tracing::debug!(
        "Selected fragment {} with score {} for {} keywords",
        best.index,
        best_score,
        keywords.len()
    );
    Some(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragments(texts: &[&str]) -> Vec<Fragment> {
        texts
            .iter()
            .enumerate()
            .map(|(index, text)| Fragment {
                index,
                text: text.to_string(),
            })
            .collect()
    }

    #[test]
    fn short_tokens_are_not_keywords() {
        assert_eq!(
            keywords("What is the Rust borrow checker?"),
            vec!["what", "rust", "borrow", "checker?"]
        );
        assert!(keywords("is it an ox").is_empty());
    }

    #[test]
    fn no_keywords_returns_first_fragment() {
        let frags = fragments(&["alpha", "beta", "gamma"]);
        let chosen = select_fragment("is it so?", &frags).unwrap();
        assert_eq!(chosen.index, 0);
    }

    #[test]
    fn no_match_returns_first_fragment() {
        let frags = fragments(&["alpha", "beta", "gamma"]);
        let chosen = select_fragment("unrelated question words", &frags).unwrap();
        assert_eq!(chosen.index, 0);
    }

    #[test]
    fn fragment_with_all_keywords_wins_anywhere() {
        for position in 0..4 {
            let mut texts = vec!["The invoice total", "payment due", "nothing here", "late fee"];
            texts[position] = "The invoice payment is due with a late fee";
            let frags = fragments(&texts);
            let chosen = select_fragment("When is invoice payment with late fee", &frags).unwrap();
            assert_eq!(chosen.index, position);
        }
    }

    #[test]
    fn ties_go_to_first() {
        let frags = fragments(&["nothing", "contains apple", "also apple"]);
        let chosen = select_fragment("apple", &frags).unwrap();
        assert_eq!(chosen.index, 1);
    }

    #[test]
    fn matching_is_case_insensitive_substring() {
        let frags = fragments(&["nothing", "PHOTOSYNTHESIS in plants"]);
        let chosen = select_fragment("Explain Synthesis", &frags).unwrap();
        assert_eq!(chosen.index, 1);
    }

    #[test]
    fn empty_slice_is_none() {
        assert!(select_fragment("anything", &[]).is_none());
    }
}
