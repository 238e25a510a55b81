//! `reserve-live` main loop.
//!
//! Builds a headless page from the served HTML, attaches a [`LiveClient`] to
//! it and reports what happens on the page until Ctrl-C.

use std::io::BufRead;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::sync::broadcast::{self, error::RecvError};
use url::Url;

use crate::cli::Cli;
use crate::client::{ClientHandle, LiveClient};
use crate::config::ClientConfig;
use crate::net::{HttpFetcher, ResourceFetcher};
use crate::page::{Document, Page, PageEvent, SharedPage};
use crate::{debug, log};

/// Attach to the configured page and run until interrupted.
pub fn watch(cli: &Cli, config: ClientConfig) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(run(Arc::new(config), cli.stdin_broadcast))
}

async fn run(config: Arc<ClientConfig>, stdin_broadcast: bool) -> Result<()> {
    let location = config.page_url()?;
    let fetcher: Arc<dyn ResourceFetcher> = Arc::new(HttpFetcher::new());

    let document = load_document(fetcher.as_ref(), &location).await;
    debug!("page"; "{} element(s) in {}", document.len(), location);
    let page = Page::new(location.clone(), document).shared();
    let events = page.lock().subscribe();

    let (client, handle) = LiveClient::builder(config, Arc::clone(&page))
        .fetcher(Arc::clone(&fetcher))
        .build()?;

    setup_shutdown_handler(handle.clone())?;
    if stdin_broadcast {
        forward_stdin(handle)?;
    }
    tokio::spawn(report_events(events, page, fetcher));

    log!("channel"; "attaching to {}", location);
    client.run().await;
    Ok(())
}

/// Ctrl-C stops the client loop.
fn setup_shutdown_handler(handle: ClientHandle) -> Result<()> {
    ctrlc::set_handler(move || {
        log!("channel"; "shutting down...");
        handle.shutdown();
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Send every line read from stdin as a broadcast.
fn forward_stdin(handle: ClientHandle) -> Result<()> {
    std::thread::Builder::new()
        .name("reserve-stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if !handle.send_broadcast(Value::String(line)) {
                    break; // Client stopped
                }
            }
        })
        .context("failed to start stdin reader")?;
    Ok(())
}

/// Print stdin lines, log broadcasts and refresh the document after reloads.
async fn report_events(
    mut events: broadcast::Receiver<PageEvent>,
    page: SharedPage,
    fetcher: Arc<dyn ResourceFetcher>,
) {
    loop {
        match events.recv().await {
            Ok(PageEvent::Stdin(line)) => println!("{line}"),
            Ok(PageEvent::Broadcast(message)) => log!("channel"; "broadcast: {}", message),
            Ok(PageEvent::ElementSourceChange { element, target }) => {
                debug!("page"; "element #{} notified of {}", element.index(), target.decoded_path())
            }
            Ok(PageEvent::Reload(kind)) => {
                let location = page.lock().location().clone();
                let document = load_document(fetcher.as_ref(), &location).await;
                page.lock().replace_document(document);
                log!("page"; "reloaded ({:?})", kind);
            }
            Err(RecvError::Lagged(missed)) => debug!("page"; "missed {} event(s)", missed),
            Err(RecvError::Closed) => break,
        }
    }
}

/// Fetch and parse the page; an unreachable page starts out empty.
async fn load_document(fetcher: &dyn ResourceFetcher, location: &Url) -> Document {
    match fetcher.fetch_text(location).await {
        Ok(html) => Document::parse_html(&html),
        Err(e) => {
            log!("error"; "cannot load page: {}", e);
            Document::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::FetchError;
    use crate::page::ReloadKind;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves `<link>` documents, one more link per fetch.
    struct GrowingPage(AtomicUsize);

    #[async_trait]
    impl ResourceFetcher for GrowingPage {
        async fn fetch_text(&self, _url: &Url) -> Result<String, FetchError> {
            let n = self.0.fetch_add(1, Ordering::SeqCst) + 1;
            Ok("<link rel=\"stylesheet\" href=\"/a.css\">".repeat(n))
        }
    }

    struct Unreachable;

    #[async_trait]
    impl ResourceFetcher for Unreachable {
        async fn fetch_text(&self, _url: &Url) -> Result<String, FetchError> {
            Err(FetchError::Other("connection refused".into()))
        }
    }

    fn location() -> Url {
        Url::parse("http://127.0.0.1:8080/").unwrap()
    }

    #[tokio::test]
    async fn test_load_document() {
        let doc = load_document(&GrowingPage(AtomicUsize::new(0)), &location()).await;
        assert_eq!(doc.by_tag("link").len(), 1);
        assert!(load_document(&Unreachable, &location()).await.is_empty());
    }

    #[tokio::test]
    async fn test_reload_refreshes_document() {
        let fetcher = Arc::new(GrowingPage(AtomicUsize::new(1)));
        let page = Page::new(location(), Document::new()).shared();
        let events = page.lock().subscribe();
        let task = tokio::spawn(report_events(events, Arc::clone(&page), fetcher));

        page.lock().reload(ReloadKind::Hard);
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(page.lock().document().by_tag("link").len(), 2);
        task.abort();
    }
}
