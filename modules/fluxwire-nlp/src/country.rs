use std::collections::{HashMap, HashSet};

use regex::Regex;

use crate::country_data::{COUNTRY_KEYWORDS, DISAMBIGUATION_RULES, REGION_KEYWORDS};

/// Tags articles with ISO-3166 alpha-2 codes using weighted keyword matching.
/// Pure: output depends only on the input text and the compiled-in data.
pub struct CountryTagger {
    max_countries: usize,
    keyword_to_country: HashMap<&'static str, &'static str>,
    keyword_to_region: HashMap<&'static str, &'static str>,
    word_re: Regex,
}

impl CountryTagger {
    pub fn new(max_countries: usize) -> Self {
        let mut keyword_to_country = HashMap::new();
        for (code, keywords) in COUNTRY_KEYWORDS {
            for keyword in *keywords {
                keyword_to_country.insert(*keyword, *code);
            }
        }

        let mut keyword_to_region = HashMap::new();
        for (region, keywords) in REGION_KEYWORDS {
            for keyword in *keywords {
                keyword_to_region.insert(*keyword, *region);
            }
        }

        Self {
            max_countries,
            keyword_to_country,
            keyword_to_region,
            // Words plus sentence punctuation. Punctuation tokens never match
            // a keyword but stop n-grams from spanning sentence boundaries.
            word_re: Regex::new(r"\w+|[.,!?;]").expect("valid regex"),
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

    fn score(
        &self,
        tokens: &[String],
        title_tokens: &HashSet<String>,
    ) -> (HashMap<&'static str, i64>, Vec<&'static str>) {
        let mut scores: HashMap<&'static str, i64> = HashMap::new();
        let mut regions: Vec<&'static str> = Vec::new();

        for token in tokens {
            if let Some(&code) = self.keyword_to_country.get(token.as_str()) {
                // Title mentions dominate; longer phrases beat their parts
                // ("south korea" over "korea").
                let mut weight: i64 = if title_tokens.contains(token) { 3 } else { 1 };
                weight *= token.split(' ').count() as i64;
                *scores.entry(code).or_insert(0) += weight;
            }

            if let Some(&region) = self.keyword_to_region.get(token.as_str()) {
                if !regions.contains(&region) {
                    regions.push(region);
                }
            }
        }

        (scores, regions)
    }

    fn apply_disambiguation(&self, full_text: &str, scores: &mut HashMap<&'static str, i64>) {
        let text_lower = full_text.to_lowercase();
        for rule in DISAMBIGUATION_RULES {
            if scores.contains_key(rule.trigger_country)
                && rule.evidence_terms.iter().any(|t| text_lower.contains(t))
            {
                scores.insert(rule.trigger_country, 0);
            }
        }
    }

    /// Tag an article. Returns at most `max_countries` codes ordered by score
    /// descending (ties broken by code) plus any detected regions.
    pub fn tag_article(&self, title: &str, content: Option<&str>) -> (Vec<String>, Vec<String>) {
        let mut full_text = title.to_string();
        if let Some(content) = content {
            full_text.push(' ');
            full_text.push_str(content);
        }

        if full_text.trim().is_empty() {
            return (Vec::new(), Vec::new());
        }

        let title_tokens: HashSet<String> = self.tokenize(title).into_iter().collect();
        let full_tokens = self.tokenize(&full_text);

        let (mut scores, regions) = self.score(&full_tokens, &title_tokens);
        self.apply_disambiguation(&full_text, &mut scores);

        let mut ranked: Vec<(&str, i64)> = scores.into_iter().filter(|(_, s)| *s > 0).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        let countries = ranked
            .into_iter()
            .take(self.max_countries)
            .map(|(code, _)| code.to_string())
            .collect();

        (countries, regions.into_iter().map(|r| r.to_string()).collect())
    }

    /// Convenience: tag a bare text without region metadata.
    pub fn tag_text(&self, text: &str) -> Vec<String> {
        self.tag_article(text, None).0
    }
}

impl Default for CountryTagger {
    fn default() -> Self {
        Self::new(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_nothing() {
        let tagger = CountryTagger::default();
        let (countries, regions) = tagger.tag_article("", None);
        assert!(countries.is_empty());
        assert!(regions.is_empty());
    }

    #[test]
    fn tags_germany_from_title_and_body() {
        let tagger = CountryTagger::default();
        let (countries, _) = tagger.tag_article(
            "Germany approves 2GW offshore wind auction",
            Some("The German government confirmed the tender for offshore wind turbines near Hamburg."),
        );
        assert!(countries.contains(&"DE".to_string()), "got {countries:?}");
    }

    #[test]
    fn multi_word_phrase_beats_component_word() {
        let tagger = CountryTagger::default();
        // "south korea" must outrank the bare "korea" hit that also maps to KR,
        // and must not produce KP.
        let (countries, _) =
            tagger.tag_article("South Korea expands battery exports", Some("Seoul announced it."));
        assert_eq!(countries.first(), Some(&"KR".to_string()));
        assert!(!countries.contains(&"KP".to_string()));
    }

    #[test]
    fn georgia_with_us_state_evidence_is_suppressed() {
        let tagger = CountryTagger::default();
        let (countries, _) = tagger.tag_article(
            "Georgia Power breaks ground in Atlanta",
            Some("The Atlanta-based utility starts construction."),
        );
        assert!(!countries.contains(&"GE".to_string()), "got {countries:?}");
    }

    #[test]
    fn georgia_without_evidence_tags_country() {
        let tagger = CountryTagger::default();
        let (countries, _) = tagger.tag_article(
            "Georgia opens hydropower tender",
            Some("Tbilisi confirmed the auction."),
        );
        assert!(countries.contains(&"GE".to_string()), "got {countries:?}");
    }

    #[test]
    fn region_goes_to_metadata_not_countries() {
        let tagger = CountryTagger::default();
        let (countries, regions) = tagger.tag_article(
            "European Union directive on grid interconnection",
            Some("The European Commission published the directive."),
        );
        assert!(countries.is_empty(), "got {countries:?}");
        assert!(regions.contains(&"EU".to_string()));
    }

    #[test]
    fn at_most_three_countries() {
        let tagger = CountryTagger::default();
        let (countries, _) = tagger.tag_article(
            "Solar growth in review",
            Some("Germany France Spain Italy Poland Sweden all expanded capacity."),
        );
        assert!(countries.len() <= 3);
    }

    #[test]
    fn deterministic_ordering_on_ties() {
        let tagger = CountryTagger::default();
        let (a, _) = tagger.tag_article("x", Some("france spain italy"));
        let (b, _) = tagger.tag_article("x", Some("france spain italy"));
        assert_eq!(a, b);
        // Equal single-hit scores resolve alphabetically.
        assert_eq!(a, vec!["ES", "FR", "IT"]);
    }

    #[test]
    fn title_hits_outweigh_body_hits() {
        let tagger = CountryTagger::default();
        let (countries, _) = tagger.tag_article(
            "Japan announces offshore plan",
            Some("Analysts in france commented on the plan."),
        );
        assert_eq!(countries.first(), Some(&"JP".to_string()));
    }

    #[test]
    fn sentence_punctuation_blocks_ngrams() {
        let tagger = CountryTagger::default();
        // "south. korea" must not form the "south korea" bigram.
        let (countries, _) = tagger.tag_article("x", Some("heading south. Korea reported growth"));
        assert_eq!(countries.first(), Some(&"KR".to_string()));
    }
}
