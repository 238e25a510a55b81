//! Fallback handler: re-point `link` elements at the fresh URL.

use regex::Regex;
use url::Url;

use crate::core::TargetId;
use crate::page::{ATTR_HREF, ATTR_IGNORE_EXPR, ATTR_ORIGINAL_HREF, ATTR_REL, Page, REL_IGNORE};

/// Rewrite every `link` referring to `target` so it loads `new_target`.
///
/// A link matches when its resolved `href`, or the original reference
/// recorded in `data-ohref` on a previous rewrite, equals the target. Links
/// with `rel="x-reserve-ignore"` carry a pattern in `data-expr` instead: a
/// matching pattern counts the change as handled without touching anything.
///
/// Returns whether any link matched.
pub fn patch_links(page: &mut Page, target: &TargetId, new_target: &Url) -> bool {
    let mut handled = false;

    for id in page.document().by_tag("link") {
        let (current, original) = {
            let Some(el) = page.document().get(id) else {
                continue;
            };

            if el.attr(ATTR_REL) == Some(REL_IGNORE) {
                let expr = el.attr(ATTR_IGNORE_EXPR).unwrap_or_default();
                match Regex::new(expr) {
                    Ok(re) => handled |= re.is_match(target.as_str()),
                    Err(e) => crate::log!("error"; "bad ignore expression `{}`: {}", expr, e),
                }
                continue;
            }

            let current = el.attr(ATTR_HREF).and_then(|href| page.resolve(href));
            let original = el
                .attr(ATTR_ORIGINAL_HREF)
                .filter(|o| !o.is_empty())
                .map(str::to_string);
            (current, original)
        };

        let is_target = current.as_ref().is_some_and(|u| u.as_str() == target.as_str())
            || original.as_deref() == Some(target.as_str());
        if !is_target {
            continue;
        }

        if let Some(el) = page.document_mut().get_mut(id) {
            if original.is_none()
                && let Some(current) = &current
            {
                el.set_attr(ATTR_ORIGINAL_HREF, current.as_str());
            }
            el.set_attr(ATTR_HREF, new_target.as_str());
            handled = true;
        }
    }

    if handled {
        crate::debug!("change"; "patched links for {}", target.decoded_path());
    }
    handled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{Document, Element};

    const BASE: &str = "http://127.0.0.1:8080/index.html";

    fn page(elements: Vec<Element>) -> Page {
        let mut doc = Document::new();
        for el in elements {
            doc.push(el);
        }
        Page::new(Url::parse(BASE).unwrap(), doc)
    }

    fn stylesheet(href: &str) -> Element {
        Element::new("link")
            .with_attr("rel", "stylesheet")
            .with_attr("href", href)
    }

    fn target(path: &str) -> TargetId {
        TargetId::resolve(&Url::parse(BASE).unwrap(), path).unwrap()
    }

    fn href(page: &Page, index: usize) -> (Option<String>, Option<String>) {
        let (_, el) = page.document().iter().nth(index).unwrap();
        (
            el.attr(ATTR_HREF).map(str::to_string),
            el.attr(ATTR_ORIGINAL_HREF).map(str::to_string),
        )
    }

    #[test]
    fn test_rewrites_matching_link_and_records_original() {
        let mut page = page(vec![stylesheet("styles/site.css"), stylesheet("other.css")]);
        let t = target("styles/site.css");
        let fresh = Url::parse("http://127.0.0.1:8080/styles/site.css?cache_bust=1").unwrap();

        assert!(patch_links(&mut page, &t, &fresh));
        assert_eq!(
            href(&page, 0),
            (Some(fresh.to_string()), Some(t.as_str().to_string()))
        );
        assert_eq!(href(&page, 1), (Some("other.css".into()), None));
    }

    #[test]
    fn test_second_rewrite_matches_through_original() {
        let mut page = page(vec![stylesheet("/styles/site.css")]);
        let t = target("styles/site.css");
        let first = Url::parse("http://127.0.0.1:8080/styles/site.css?cache_bust=1").unwrap();
        let second = Url::parse("http://127.0.0.1:8080/styles/site.css?cache_bust=2").unwrap();

        assert!(patch_links(&mut page, &t, &first));
        assert!(patch_links(&mut page, &t, &second));
        // original reference is recorded once and kept
        assert_eq!(
            href(&page, 0),
            (Some(second.to_string()), Some(t.as_str().to_string()))
        );
    }

    #[test]
    fn test_ignore_expression_counts_as_handled() {
        let mut page = page(vec![
            Element::new("link")
                .with_attr(ATTR_REL, REL_IGNORE)
                .with_attr(ATTR_IGNORE_EXPR, r"\.map$"),
            stylesheet("site.css"),
        ]);
        let fresh = Url::parse("http://127.0.0.1:8080/site.css.map?cache_bust=1").unwrap();

        assert!(patch_links(&mut page, &target("site.css.map"), &fresh));
        assert_eq!(href(&page, 1), (Some("site.css".into()), None));
        assert!(!patch_links(&mut page, &target("app.ts"), &fresh));
    }

    #[test]
    fn test_invalid_expression_is_skipped() {
        let mut page = page(vec![
            Element::new("link")
                .with_attr(ATTR_REL, REL_IGNORE)
                .with_attr(ATTR_IGNORE_EXPR, "(unclosed"),
            stylesheet("site.css"),
        ]);
        let t = target("site.css");
        let fresh = t.cache_busted();
        assert!(patch_links(&mut page, &t, &fresh));
    }

    #[test]
    fn test_no_match() {
        let mut page = page(vec![
            stylesheet("site.css"),
            Element::new("a").with_attr("href", "data.json"),
        ]);
        let t = target("data.json");
        assert!(!patch_links(&mut page, &t, &t.cache_busted()));
    }
}
