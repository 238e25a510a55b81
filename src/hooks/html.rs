//! `html` hook: soft reload when the page's own document changed.

use async_trait::async_trait;
use url::Url;

use super::{HandlerContext, HandlerError, Handling, TargetHandler};
use crate::core::{TargetId, without_query};
use crate::page::ReloadKind;

pub struct HtmlHandler {
    target: TargetId,
}

impl HtmlHandler {
    pub fn new(target: &TargetId) -> Self {
        Self {
            target: target.clone(),
        }
    }
}

#[async_trait]
impl TargetHandler for HtmlHandler {
    async fn handle(
        &mut self,
        cx: &HandlerContext<'_>,
        _: &Url,
    ) -> Result<Handling, HandlerError> {
        let mut page = cx.page.lock();
        if same_page(page.location(), &self.target) {
            page.reload(ReloadKind::Soft);
            return Ok(Handling::Reloaded);
        }
        // Other pages' documents are of no interest, but still count as handled
        Ok(Handling::Handled)
    }
}

/// Whether `target` is the document `location` shows.
///
/// Query and fragment are ignored, and `/dir/index.html` equals `/dir/`.
pub fn same_page(location: &Url, target: &TargetId) -> bool {
    let page = without_query(location);
    let target = without_query(target.url());
    strip_index(page.as_str()) == strip_index(target.as_str())
}

fn strip_index(href: &str) -> &str {
    href.strip_suffix("index.html").unwrap_or(href)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{Document, Page};
    use crate::swap::{ModuleCache, SwapEngine};
    use std::sync::Arc;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn target(s: &str) -> TargetId {
        TargetId::parse(s).unwrap()
    }

    #[test]
    fn test_same_page() {
        let root = url("http://h:8080/");
        assert!(same_page(&root, &target("http://h:8080/index.html")));
        assert!(same_page(&url("http://h:8080/index.html?x=1#top"), &target("http://h:8080/")));
        assert!(same_page(&url("http://h:8080/docs/"), &target("http://h:8080/docs/index.html")));
        assert!(!same_page(&root, &target("http://h:8080/about.html")));
        assert!(!same_page(&root, &target("http://other:8080/index.html")));
    }

    async fn run(location: &str, changed: &str) -> (Handling, Vec<ReloadKind>) {
        let page = Page::new(url(location), Document::new()).shared();
        let swap = SwapEngine::new(Arc::new(ModuleCache::default()));
        let cx = HandlerContext {
            page: &page,
            swap: &swap,
        };
        let t = target(changed);
        let handled = HtmlHandler::new(&t)
            .handle(&cx, &t.cache_busted())
            .await
            .unwrap();
        let reloads = page.lock().reloads().to_vec();
        (handled, reloads)
    }

    #[tokio::test]
    async fn test_own_document_soft_reloads() {
        let (handled, reloads) = run("http://h:8080/", "http://h:8080/index.html").await;
        assert_eq!(handled, Handling::Reloaded);
        assert_eq!(reloads, vec![ReloadKind::Soft]);
    }

    #[tokio::test]
    async fn test_other_document_is_handled_without_reload() {
        let (handled, reloads) = run("http://h:8080/", "http://h:8080/about.html").await;
        assert_eq!(handled, Handling::Handled);
        assert!(reloads.is_empty());
    }
}
