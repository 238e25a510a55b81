//! Build a headless [`Document`] from served HTML.

use super::{Document, Element};

impl Document {
    /// Parse HTML with tl and flatten every tag into document order.
    ///
    /// Text and comments are dropped. Unparseable input yields an empty document.
    pub fn parse_html(html: &str) -> Self {
        let mut doc = Document::new();
        let Ok(dom) = tl::parse(html, tl::ParserOptions::default()) else {
            crate::debug!("page"; "html parse failed, using empty document");
            return doc;
        };

        let parser = dom.parser();
        for handle in dom.children() {
            collect(*handle, parser, &mut doc);
        }
        doc
    }
}

/// Push a tl node and its descendants (pre-order).
fn collect(handle: tl::NodeHandle, parser: &tl::Parser, doc: &mut Document) {
    let Some(tl::Node::Tag(tag)) = handle.get(parser) else {
        return;
    };

    let mut element = Element::new(tag.name().as_utf8_str().to_string());
    for (key, value) in tag.attributes().iter() {
        let key_str: &str = key.as_ref();
        let value_str = value.map(|v| v.to_string()).unwrap_or_default();
        element.set_attr(key_str, value_str);
    }
    doc.push(element);

    for child in tag.children().top().iter() {
        collect(*child, parser, doc);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{ATTR_NOTIFY_FILE, REL_IGNORE};

    #[test]
    fn test_parse_html_flattens_in_order() {
        let html = r#"<!doctype html>
<html>
  <head>
    <link rel="stylesheet" href="/styles/site.css">
    <link rel="x-reserve-ignore" data-expr="\.map$">
  </head>
  <body>
    <div data-reserve-notify-file="http://127.0.0.1:8080/data.json"><span>hi</span></div>
  </body>
</html>"#;
        let doc = Document::parse_html(html);

        let links = doc.by_tag("link");
        assert_eq!(links.len(), 2);
        let first = doc.get(links[0]).unwrap();
        assert_eq!(first.attr("href"), Some("/styles/site.css"));
        let second = doc.get(links[1]).unwrap();
        assert_eq!(second.attr("rel"), Some(REL_IGNORE));
        assert_eq!(second.attr("data-expr"), Some(r"\.map$"));

        let watchers = doc.by_attr(ATTR_NOTIFY_FILE, "http://127.0.0.1:8080/data.json");
        assert_eq!(watchers.len(), 1);
        // div comes after both links, span after div
        assert!(watchers[0] > links[1]);
        assert_eq!(doc.by_tag("span").len(), 1);
    }

    #[test]
    fn test_parse_empty() {
        assert!(Document::parse_html("").is_empty());
    }
}
