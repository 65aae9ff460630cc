// HTML → visible text. Script-like subtrees are dropped, whitespace-only lines collapsed.

use profile_common::text::collapse_blank_lines;
use scraper::{Html, Node};

const HIDDEN_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Visible text of an HTML document, one text node per line.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut out = String::new();

    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| match ancestor.value() {
            Node::Element(el) => HIDDEN_ELEMENTS.contains(&el.name()),
            _ => false,
        });
        if hidden {
            continue;
        }
        out.push_str(text);
        out.push('\n');
    }

    collapse_blank_lines(&out)
}
