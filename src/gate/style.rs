/// Banned punctuation and stock phrases found in `text`, one entry per
/// configured item that appears (not per occurrence).
pub fn violations(
    text: &str,
    banned_punctuation: &[String],
    banned_phrases: &[String],
) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut found = Vec::new();

    for mark in banned_punctuation {
        if text.contains(mark.as_str()) {
            found.push(format!("banned punctuation {mark:?}"));
        }
    }
    for phrase in banned_phrases {
        if lowered.contains(&phrase.to_lowercase()) {
            found.push(format!("banned phrase {phrase:?}"));
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_em_dash() {
        let punct = vec!["\u{2014}".to_string()];
        let hits = violations("one \u{2014} two", &punct, &[]);
        assert_eq!(hits.len(), 1);
        assert!(hits[0].contains("punctuation"));
    }

    #[test]
    fn detects_stock_phrases_case_insensitively() {
        let phrases = vec!["delve into".to_string()];
        let hits = violations("Let us Delve Into the topic.", &[], &phrases);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn clean_text_passes() {
        let punct = vec!["\u{2014}".to_string()];
        let phrases = vec!["delve into".to_string()];
        assert!(violations("Plain prose, nothing fancy.", &punct, &phrases).is_empty());
    }

    #[test]
    fn one_entry_per_configured_item() {
        let phrases = vec!["game changer".to_string()];
        let hits = violations(
            "A game changer. Truly a game changer.",
            &[],
            &phrases,
        );
        assert_eq!(hits.len(), 1);
    }
}
