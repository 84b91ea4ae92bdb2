//! Main-content recovery, language detection, and lead-image selection.

use scraper::{ElementRef, Html, Selector};
use spider_transformations::transformation::content::{
    transform_content_input, ReturnFormat, TransformConfig, TransformInput,
};
use thiserror::Error;
use tracing::debug;
use whatlang::Lang;

use crate::fetcher::{FetchError, Fetcher};

/// Extracted text below this length is treated as a failed extraction.
const MIN_CONTENT_CHARS: usize = 100;
/// Paragraphs shorter than this are ignored by the fallback collector.
const MIN_PARAGRAPH_CHARS: usize = 20;
/// Language detection sample size and floor.
const LANG_SAMPLE_CHARS: usize = 1000;
const MIN_LANG_CHARS: usize = 20;

/// Image URLs containing these fragments are never lead images.
const IMAGE_BLOCKLIST: &[&str] = &["logo", "icon", "avatar", "ad"];

/// Elements skipped by both text strategies.
const SKIP_CONTAINERS: &[&str] = &["script", "style", "nav", "footer", "header", "aside"];

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
}

#[derive(Debug, Clone, Default)]
pub struct Extracted {
    pub text: Option<String>,
    /// ISO-639-1 code, None when detection failed or text was too short.
    pub language: Option<String>,
    pub image_url: Option<String>,
}

pub struct ContentExtractor;

impl ContentExtractor {
    /// Extract article text, language and lead image from raw HTML.
    /// Extraction that yields nothing returns an all-None record, never an
    /// error; only fetch failures raise.
    pub fn extract(html: &str, base_url: Option<&str>) -> Extracted {
        let text = readability_text(html, base_url).or_else(|| paragraph_fallback(html));
        let language = text.as_deref().and_then(detect_language);
        let image_url = select_lead_image(html, base_url);

        Extracted {
            text,
            language,
            image_url,
        }
    }

    /// Fetch (resolving aggregator redirects first) then extract.
    pub async fn extract_article(
        fetcher: &Fetcher,
        url: &str,
    ) -> Result<Extracted, ExtractError> {
        let resolved = fetcher.resolve(url).await?;
        let bytes = fetcher.fetch(&resolved).await?;
        let html = String::from_utf8_lossy(&bytes);
        let extracted = Self::extract(&html, Some(&resolved));
        debug!(
            url,
            resolved = resolved.as_str(),
            has_text = extracted.text.is_some(),
            language = extracted.language.as_deref().unwrap_or("-"),
            "article extracted"
        );
        Ok(extracted)
    }
}

/// Primary strategy: Readability main-content selection via
/// spider_transformations, whitespace-collapsed.
fn readability_text(html: &str, base_url: Option<&str>) -> Option<String> {
    let parsed_url = base_url.and_then(|u| url::Url::parse(u).ok());
    let config = TransformConfig {
        readability: true,
        main_content: true,
        return_format: ReturnFormat::Markdown,
        filter_images: true,
        filter_svg: true,
        clean_html: true,
    };
    let input = TransformInput {
        url: parsed_url.as_ref(),
        content: html.as_bytes(),
        screenshot_bytes: None,
        encoding: None,
        selector_config: None,
        ignore_tags: None,
    };

    let raw = transform_content_input(input, &config);
    let text = collapse_whitespace(&raw);
    (text.chars().count() >= MIN_CONTENT_CHARS).then_some(text)
}

/// Fallback strategy: join substantial `<p>` texts, skipping chrome
/// containers.
fn paragraph_fallback(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("p").ok()?;

    let mut paragraphs = Vec::new();
    for element in document.select(&selector) {
        if inside_skipped_container(&element) {
            continue;
        }
        let text = element.text().collect::<String>().trim().to_string();
        if text.chars().count() > MIN_PARAGRAPH_CHARS {
            paragraphs.push(text);
        }
    }

    if paragraphs.is_empty() {
        return None;
    }

    let content = paragraphs.join("\n\n");
    (content.chars().count() >= MIN_CONTENT_CHARS).then_some(content)
}

fn inside_skipped_container(element: &ElementRef) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| SKIP_CONTAINERS.contains(&a.value().name()))
}

fn collapse_whitespace(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Detect language on the first 1000 chars; needs at least 20 chars.
/// Returns an ISO-639-1 code or None.
fn detect_language(text: &str) -> Option<String> {
    if text.chars().count() < MIN_LANG_CHARS {
        return None;
    }
    let sample: String = text.chars().take(LANG_SAMPLE_CHARS).collect();
    let info = whatlang::detect(&sample)?;
    iso_639_1(info.lang()).map(|code| code.to_string())
}

fn iso_639_1(lang: Lang) -> Option<&'static str> {
    match lang {
        Lang::Eng => Some("en"),
        Lang::Spa => Some("es"),
        Lang::Fra => Some("fr"),
        Lang::Deu => Some("de"),
        Lang::Ita => Some("it"),
        Lang::Por => Some("pt"),
        Lang::Nld => Some("nl"),
        Lang::Rus => Some("ru"),
        Lang::Ukr => Some("uk"),
        Lang::Pol => Some("pl"),
        Lang::Swe => Some("sv"),
        Lang::Dan => Some("da"),
        Lang::Fin => Some("fi"),
        Lang::Nob => Some("no"),
        Lang::Tur => Some("tr"),
        Lang::Ara => Some("ar"),
        Lang::Heb => Some("he"),
        Lang::Hin => Some("hi"),
        Lang::Jpn => Some("ja"),
        Lang::Kor => Some("ko"),
        Lang::Cmn => Some("zh"),
        Lang::Vie => Some("vi"),
        Lang::Tha => Some("th"),
        Lang::Ind => Some("id"),
        Lang::Ell => Some("el"),
        Lang::Ces => Some("cs"),
        Lang::Hun => Some("hu"),
        Lang::Ron => Some("ro"),
        _ => None,
    }
}

/// Lead image: og:image, then twitter:image, then article:image, then the
/// first in-body <img> with an absolute src/data-src that is not obviously
/// chrome (logo, icon, avatar, ad).
fn select_lead_image(html: &str, base_url: Option<&str>) -> Option<String> {
    let document = Html::parse_document(html);
    let base = base_url.and_then(|u| url::Url::parse(u).ok());

    let meta_selectors = [
        r#"meta[property="og:image"]"#,
        r#"meta[name="twitter:image"]"#,
        r#"meta[property="twitter:image"]"#,
        r#"meta[property="article:image"]"#,
    ];

    for raw in meta_selectors {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        if let Some(content) = document
            .select(&selector)
            .next()
            .and_then(|e| e.value().attr("content"))
            .map(str::trim)
            .filter(|c| !c.is_empty())
        {
            return absolutize(content, base.as_ref());
        }
    }

    let img_selector = Selector::parse("img").ok()?;
    for img in document.select(&img_selector) {
        let Some(src) = img
            .value()
            .attr("src")
            .or_else(|| img.value().attr("data-src"))
        else {
            continue;
        };
        let src = src.trim();
        if !src.starts_with("http://") && !src.starts_with("https://") {
            continue;
        }
        let lower = src.to_lowercase();
        if IMAGE_BLOCKLIST.iter().any(|b| lower.contains(b)) {
            continue;
        }
        return Some(src.to_string());
    }

    None
}

fn absolutize(src: &str, base: Option<&url::Url>) -> Option<String> {
    if src.starts_with("http://") || src.starts_with("https://") {
        return Some(src.to_string());
    }
    base.and_then(|b| b.join(src).ok()).map(|u| u.to_string())
}
