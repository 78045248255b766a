//! HTML parser for extracting page content
//!
//! This module turns a fetched HTML document into a [`PageRecord`]:
//! - Page title (first `<h1>`)
//! - Lead paragraph (first `<p>` in `<main>`, else first `<p>`)
//! - Outgoing links and image URLs, resolved against the page URL

use crate::ExtractionError;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Structured content extracted from one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    /// The URL the page was fetched from, as encountered
    pub url: String,

    /// Text of the first `<h1>`, empty if none
    pub title: String,

    /// Text of the lead paragraph, empty if none
    pub first_paragraph: String,

    /// Absolute link targets in document order, duplicates kept
    pub outgoing_links: Vec<String>,

    /// Absolute image sources in document order, duplicates kept
    pub image_urls: Vec<String>,
}

/// Parses HTML content and extracts the page record
///
/// # Link Extraction Rules
///
/// **Include:** every non-empty `<a href="...">` resolved against `page_url`,
/// whatever its scheme. Deciding which links to follow is left to the
/// scheduler's host check.
///
/// **Exclude:** empty hrefs and hrefs that do not resolve to an absolute URL
///
/// Images come from `<img src="...">` with the same resolution rules.
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `page_url` - The page URL as encountered, also the base for relative links
///
/// # Example
///
/// ```
/// use sitewalk::crawler::extract_page_data;
///
/// let html = r#"<html><body><h1>Test</h1><a href="/page">Link</a></body></html>"#;
/// let page = extract_page_data(html, "https://example.com").unwrap();
/// assert_eq!(page.title, "Test");
/// assert_eq!(page.outgoing_links, vec!["https://example.com/page"]);
/// ```
pub fn extract_page_data(html: &str, page_url: &str) -> Result<PageRecord, ExtractionError> {
    let base_url = Url::parse(page_url).map_err(|source| ExtractionError::BaseUrl {
        url: page_url.to_string(),
        source,
    })?;
    let document = Html::parse_document(html);

    Ok(PageRecord {
        url: page_url.to_string(),
        title: extract_title(&document)?,
        first_paragraph: extract_first_paragraph(&document)?,
        outgoing_links: extract_links(&document, &base_url)?,
        image_urls: extract_images(&document, &base_url)?,
    })
}

fn selector(css: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(css).map_err(|e| ExtractionError::Selector {
        selector: css.to_string(),
        message: e.to_string(),
    })
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Extracts the text of the first `<h1>`
fn extract_title(document: &Html) -> Result<String, ExtractionError> {
    let h1 = selector("h1")?;
    Ok(document.select(&h1).next().map(element_text).unwrap_or_default())
}

/// Extracts the lead paragraph, preferring the main content region
fn extract_first_paragraph(document: &Html) -> Result<String, ExtractionError> {
    let main_p = selector("main p")?;
    if let Some(p) = document.select(&main_p).next() {
        return Ok(element_text(p));
    }

    let any_p = selector("p")?;
    Ok(document.select(&any_p).next().map(element_text).unwrap_or_default())
}

/// Extracts all followable links from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Result<Vec<String>, ExtractionError> {
    let a = selector("a[href]")?;
    let links = document
        .select(&a)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .collect();
    Ok(links)
}

/// Extracts all image sources from the HTML document
fn extract_images(document: &Html, base_url: &Url) -> Result<Vec<String>, ExtractionError> {
    let img = selector("img[src]")?;
    let images = document
        .select(&img)
        .filter_map(|element| element.value().attr("src"))
        .filter_map(|src| resolve_link(src, base_url))
        .collect();
    Ok(images)
}

/// Resolves an attribute value to an absolute URL
///
/// Returns None for empty values and references that cannot be joined.
fn resolve_link(reference: &str, base_url: &Url) -> Option<String> {
    let reference = reference.trim();

    if reference.is_empty() {
        return None;
    }

    match base_url.join(reference) {
        Ok(absolute_url) => Some(absolute_url.to_string()),
        Err(e) => {
            tracing::debug!("Skipping unresolvable reference '{}': {}", reference, e);
            None
        }
    }
}
