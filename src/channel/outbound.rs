//! Outbound broadcast queue.
//!
//! While the transport is down payloads are queued; when it opens the queue
//! is flushed in order and later payloads go straight to the link, until the
//! next disconnect.

use std::collections::VecDeque;

use crossbeam::channel::{Receiver, Sender, unbounded};

/// Sending half of an open connection.
///
/// The link keeps a handle on the connection's inbox, so whatever the
/// connection never picked up can be taken back when it closes.
#[derive(Debug, Clone)]
pub struct OutboundLink {
    tx: Sender<String>,
    inbox: Receiver<String>,
}

impl OutboundLink {
    /// New link, plus the receiver the connection writes from.
    pub fn channel() -> (Self, Receiver<String>) {
        let (tx, rx) = unbounded();
        let link = Self {
            tx,
            inbox: rx.clone(),
        };
        (link, rx)
    }

    fn send(&self, payload: String) {
        // Cannot fail: the link itself holds a receiver
        let _ = self.tx.send(payload);
    }

    /// Payloads the connection has not picked up, in send order.
    fn take_back(&self) -> impl Iterator<Item = String> + '_ {
        self.inbox.try_iter()
    }
}

#[derive(Debug, Default)]
pub struct Outbound {
    queue: VecDeque<String>,
    link: Option<OutboundLink>,
}

impl Outbound {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send or queue a payload.
    pub fn send(&mut self, payload: String) {
        match &self.link {
            Some(link) => link.send(payload),
            None => self.queue.push_back(payload),
        }
    }

    /// Switch to immediate transmission and flush the queue.
    ///
    /// Returns the number of payloads flushed.
    pub fn open(&mut self, link: OutboundLink) -> usize {
        let flushed = self.queue.len();
        for payload in self.queue.drain(..) {
            link.send(payload);
        }
        self.link = Some(link);
        flushed
    }

    /// Revert to queuing.
    ///
    /// `unsent` are payloads the connection took but failed to write. They and
    /// everything it never took go back to the front of the queue, in order.
    pub fn close(&mut self, unsent: Vec<String>) {
        let mut requeue = VecDeque::from(unsent);
        if let Some(link) = self.link.take() {
            requeue.extend(link.take_back());
        }
        requeue.append(&mut self.queue);
        self.queue = requeue;
    }

    pub fn is_open(&self) -> bool {
        self.link.is_some()
    }

    /// Payloads waiting for a connection.
    pub fn pending(&self) -> impl Iterator<Item = &str> {
        self.queue.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_then_flush_in_order() {
        let mut out = Outbound::new();
        out.send("a".into());
        out.send("b".into());
        assert_eq!(out.len(), 2);

        let (link, rx) = OutboundLink::channel();
        assert_eq!(out.open(link), 2);
        out.send("c".into());

        assert!(out.is_empty());
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_close_takes_back_unwritten_payloads() {
        let mut out = Outbound::new();
        let (link, rx) = OutboundLink::channel();
        out.open(link);
        out.send("a".into());
        out.send("b".into());
        out.send("c".into());

        // The connection took "a", failed to write it, and died
        let taken = rx.try_recv().unwrap();
        out.close(vec![taken]);
        out.send("d".into());

        assert!(!out.is_open());
        assert_eq!(out.pending().collect::<Vec<_>>(), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_reopen_resumes_queuing_after_close() {
        let mut out = Outbound::new();
        let (link1, rx1) = OutboundLink::channel();
        out.open(link1);
        out.send("1".into());
        assert_eq!(rx1.try_recv().unwrap(), "1");
        out.close(Vec::new());
        out.send("2".into());
        assert_eq!(out.len(), 1);

        let (link2, rx2) = OutboundLink::channel();
        assert_eq!(out.open(link2), 1);
        assert_eq!(rx2.try_iter().collect::<Vec<_>>(), vec!["2"]);
        assert!(rx1.try_recv().is_err());
    }
}
