//! Flat element store for the headless page.
//!
//! Only attributes matter to live updates, so the document keeps elements in
//! document order without a tree.

/// Reference attribute rewritten on stylesheet refresh.
pub const ATTR_HREF: &str = "href";
/// Link relation.
pub const ATTR_REL: &str = "rel";
/// Original reference, recorded on the first rewrite.
pub const ATTR_ORIGINAL_HREF: &str = "data-ohref";
/// Regular expression held by an ignore-expression link.
pub const ATTR_IGNORE_EXPR: &str = "data-expr";
/// Target identity an element wants change notifications for.
pub const ATTR_NOTIFY_FILE: &str = "data-reserve-notify-file";
/// `rel` value marking an ignore-expression holder.
pub const REL_IGNORE: &str = "x-reserve-ignore";

/// Index of an element inside its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

impl ElementId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A single element: tag name plus ordered attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            attrs: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    #[inline]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .attrs
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&name))
        {
            Some((_, slot)) => *slot = value,
            None => self.attrs.push((name, value)),
        }
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Elements of a page in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    elements: Vec<Element>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, element: Element) -> ElementId {
        self.elements.push(element);
        ElementId(self.elements.len() - 1)
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id.0)
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ElementId, &Element)> {
        self.elements
            .iter()
            .enumerate()
            .map(|(i, e)| (ElementId(i), e))
    }

    /// Ids of all elements with the given tag.
    pub fn by_tag(&self, tag: &str) -> Vec<ElementId> {
        self.iter()
            .filter(|(_, e)| e.tag.eq_ignore_ascii_case(tag))
            .map(|(id, _)| id)
            .collect()
    }

    /// Ids of all elements whose attribute equals `value` exactly.
    pub fn by_attr(&self, name: &str, value: &str) -> Vec<ElementId> {
        self.iter()
            .filter(|(_, e)| e.attr(name) == Some(value))
            .map(|(id, _)| id)
            .collect()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attr_set_replaces_existing() {
        let mut el = Element::new("LINK").with_attr("href", "/a.css");
        el.set_attr("HREF", "/b.css");
        assert_eq!(el.tag(), "link");
        assert_eq!(el.attr("href"), Some("/b.css"));
        assert_eq!(el.attrs().count(), 1);
    }

    #[test]
    fn test_queries() {
        let mut doc = Document::new();
        let a = doc.push(Element::new("link").with_attr("href", "/a.css"));
        let _ = doc.push(Element::new("div").with_attr(ATTR_NOTIFY_FILE, "http://h/a.css"));
        let c = doc.push(Element::new("link").with_attr("rel", REL_IGNORE));

        assert_eq!(doc.by_tag("link"), vec![a, c]);
        assert_eq!(doc.by_attr(ATTR_NOTIFY_FILE, "http://h/a.css").len(), 1);
        assert!(doc.by_attr(ATTR_NOTIFY_FILE, "http://h/b.css").is_empty());
    }
}
