//! Markup stripping for listing descriptions

use scraper::Html;

/// Converts an HTML fragment into its text content
///
/// Text nodes are concatenated as they appear, entities are decoded, and
/// `<script>`/`<style>` bodies are dropped. Plain text passes through unchanged.
pub fn strip_markup(html: &str) -> String {
    if !html.contains('<') && !html.contains('&') {
        return html.to_string();
    }

    let fragment = Html::parse_fragment(html);
    fragment
        .root_element()
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let parent_is_code = node
                .parent()
                .and_then(|p| p.value().as_element())
                .is_some_and(|e| matches!(e.name(), "script" | "style"));
            (!parent_is_code).then(|| text.to_string())
        })
        .collect()
}
