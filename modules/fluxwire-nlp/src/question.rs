//! Question-side filter detection used by the retriever: country codes via
//! word-boundary keyword search, topics via positive-keyword scan.

use crate::country_data::COUNTRY_KEYWORDS;
use crate::topic_data::TOPICS;

/// True when `needle` occurs in `haystack` bounded by non-word characters.
/// Avoids catching "India" inside "Indiana".
fn contains_word(haystack: &str, needle: &str) -> bool {
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(needle) {
        let begin = start + pos;
        let end = begin + needle.len();

        let ok_before = begin == 0
            || haystack[..begin]
                .chars()
                .next_back()
                .map(|c| !c.is_alphanumeric() && c != '_')
                .unwrap_or(true);
        let ok_after = end == haystack.len()
            || haystack[end..]
                .chars()
                .next()
                .map(|c| !c.is_alphanumeric() && c != '_')
                .unwrap_or(true);

        if ok_before && ok_after {
            return true;
        }
        start = begin + needle.len().max(1);
    }
    false
}

/// Detect country codes mentioned in free text (e.g. a user question).
/// Returns sorted, deduplicated ISO alpha-2 codes.
pub fn detect_countries_in_text(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let text_lower = text.to_lowercase();
    let mut detected: Vec<String> = Vec::new();

    for (code, keywords) in COUNTRY_KEYWORDS {
        for keyword in *keywords {
            if contains_word(&text_lower, keyword) {
                detected.push(code.to_string());
                break;
            }
        }
    }

    detected.sort();
    detected.dedup();
    detected
}

/// Detect topic ids whose positive keywords occur in the question.
/// Returns ids in taxonomy order.
pub fn topics_in_question(question: &str) -> Vec<String> {
    if question.is_empty() {
        return Vec::new();
    }

    let question_lower = question.to_lowercase();
    TOPICS
        .iter()
        .filter(|topic| {
            topic
                .positive
                .iter()
                .any(|kw| contains_word(&question_lower, kw))
        })
        .map(|topic| topic.id.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_country_by_name() {
        assert_eq!(detect_countries_in_text("solar in Germany"), vec!["DE"]);
    }

    #[test]
    fn word_boundaries_prevent_substring_hits() {
        // "Indiana" must not produce IN.
        let detected = detect_countries_in_text("utilities in Indiana");
        assert!(!detected.contains(&"IN".to_string()), "got {detected:?}");
    }

    #[test]
    fn empty_text_detects_nothing() {
        assert!(detect_countries_in_text("").is_empty());
        assert!(topics_in_question("").is_empty());
    }

    #[test]
    fn detects_multiple_countries_sorted() {
        let detected = detect_countries_in_text("compare wind in the UK and France");
        assert_eq!(detected, vec!["FR", "GB"]);
    }

    #[test]
    fn question_topics_from_keywords() {
        let topics = topics_in_question("what's new in offshore wind?");
        assert!(topics.contains(&"renewables_wind".to_string()));
    }

    #[test]
    fn demonym_detection() {
        let detected = detect_countries_in_text("the French grid operator");
        assert!(detected.contains(&"FR".to_string()));
    }
}
