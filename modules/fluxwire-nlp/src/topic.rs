use std::collections::{HashMap, HashSet};

use regex::Regex;

use crate::topic_data::TOPICS;

/// Tags articles with energy-transition topics using positive/negative
/// keyword scoring over word n-grams. Pure and deterministic.
pub struct TopicTagger {
    max_topics: usize,
    word_re: Regex,
}

impl TopicTagger {
    pub fn new(max_topics: usize) -> Self {
        Self {
            max_topics,
            word_re: Regex::new(r"\w+").expect("valid regex"),
        }
    }

    /// Tokenize into lowercased word n-grams for n in [1, 5].
    fn tokenize(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        let lower = text.to_lowercase();
        let words: Vec<&str> = self.word_re.find_iter(&lower).map(|m| m.as_str()).collect();

        let mut tokens: Vec<String> = words.iter().map(|w| w.to_string()).collect();
        for n in 2..=5usize {
            for window in words.windows(n) {
                tokens.push(window.join(" "));
            }
        }
        tokens
    }

    fn score(&self, tokens: &[String], title_tokens: &HashSet<String>) -> HashMap<&'static str, i64> {
        let mut scores: HashMap<&'static str, i64> = HashMap::new();

        for topic in TOPICS {
            let positive: HashSet<&str> = topic.positive.iter().copied().collect();
            let negative: HashSet<&str> = topic.negative.iter().copied().collect();

            let mut score: i64 = 0;
            for token in tokens {
                if positive.contains(token.as_str()) {
                    let mut weight: i64 = if title_tokens.contains(token) { 3 } else { 1 };
                    weight *= token.split(' ').count() as i64;
                    score += weight;
                }
                if negative.contains(token.as_str()) {
                    // Demote, never blacklist: a "battery" mention in an EV
                    // article still leaves ev_transport positive.
                    score -= if title_tokens.contains(token) { 2 } else { 1 };
                }
            }

            if score != 0 {
                scores.insert(topic.id, score);
            }
        }

        scores
    }

    /// Tag an article with up to `max_topics` topic ids, strictly positive
    /// final scores only, ordered score desc then id asc.
    pub fn tag_article(&self, title: &str, content: Option<&str>) -> Vec<String> {
        let mut full_text = title.to_string();
        if let Some(content) = content {
            full_text.push(' ');
            full_text.push_str(content);
        }

        if full_text.trim().is_empty() {
            return Vec::new();
        }

        let title_tokens: HashSet<String> = self.tokenize(title).into_iter().collect();
        let full_tokens = self.tokenize(&full_text);

        let scores = self.score(&full_tokens, &title_tokens);

        let mut ranked: Vec<(&str, i64)> = scores.into_iter().filter(|(_, s)| *s > 0).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        ranked
            .into_iter()
            .take(self.max_topics)
            .map(|(id, _)| id.to_string())
            .collect()
    }

    /// Convenience: tag a bare text.
    pub fn tag_text(&self, text: &str) -> Vec<String> {
        self.tag_article(text, None)
    }
}

impl Default for TopicTagger {
    fn default() -> Self {
        Self::new(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_nothing() {
        let tagger = TopicTagger::default();
        assert!(tagger.tag_article("", None).is_empty());
        assert!(tagger.tag_article("", Some("")).is_empty());
    }

    #[test]
    fn offshore_wind_article_tags_wind() {
        let tagger = TopicTagger::default();
        let topics = tagger.tag_article(
            "Germany approves 2GW offshore wind auction",
            Some("The tender covers offshore wind turbines and grid connection work."),
        );
        assert!(topics.contains(&"renewables_wind".to_string()), "got {topics:?}");
    }

    #[test]
    fn negative_keywords_demote_but_do_not_blacklist() {
        let tagger = TopicTagger::default();
        // An EV story mentioning batteries keeps ev_transport on top; the
        // battery mention alone must not hand the article to storage_batteries.
        let topics = tagger.tag_article(
            "EV sales surge as charging infrastructure expands",
            Some("Electric vehicle makers reported record ev adoption. The battery supply held up."),
        );
        assert_eq!(topics.first(), Some(&"ev_transport".to_string()), "got {topics:?}");
    }

    #[test]
    fn at_most_three_topics() {
        let tagger = TopicTagger::default();
        let topics = tagger.tag_article(
            "Energy week in review",
            Some(
                "Solar capacity grew. Wind capacity grew. Hydrogen electrolyzer orders grew. \
                 Carbon capture projects advanced. Lithium mining expanded. Investment increased.",
            ),
        );
        assert!(topics.len() <= 3, "got {topics:?}");
    }

    #[test]
    fn deterministic_output() {
        let tagger = TopicTagger::default();
        let a = tagger.tag_article("Solar and wind growth", Some("solar wind"));
        let b = tagger.tag_article("Solar and wind growth", Some("solar wind"));
        assert_eq!(a, b);
    }

    #[test]
    fn title_match_outweighs_body_match() {
        let tagger = TopicTagger::default();
        let topics = tagger.tag_article(
            "Green hydrogen strategy announced",
            Some("The plan also touches solar."),
        );
        assert_eq!(topics.first(), Some(&"hydrogen".to_string()), "got {topics:?}");
    }
}
