use scraper::Html;

/// Every non-empty text node of the document, trimmed, in document order.
pub fn flatten(markup: &str) -> Vec<String> {
    let document = Html::parse_document(markup);
    document
        .root_element()
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
