use std::collections::HashMap;

use log::{debug, warn};
use tokio::sync::{oneshot, Mutex};

use crate::core::{Error, Header, QueueError};

pub type Reply = (Header, Vec<u8>);

/// Routes replies read off a shared stream back to whichever request
/// registered the matching transaction id.
///
/// A request must [`PendingReplies::register`] before its frame is sent, so a
/// fast reply can never arrive ahead of its waiter. Once closed, no reply can
/// arrive at all and registering fails.
#[derive(Debug, Default)]
pub struct PendingReplies {
    inner: Mutex<Waiters>,
}

#[derive(Debug, Default)]
struct Waiters {
    pending: HashMap<u16, oneshot::Sender<Reply>>,
    closed: bool,
}

#[derive(Debug)]
pub struct PendingReply {
    id: u16,
    receiver: oneshot::Receiver<Reply>,
}

impl PendingReplies {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, id: u16) -> Result<PendingReply, Error> {
        let mut waiters = self.inner.lock().await;
        if waiters.closed {
            return Err(Error::Queue(QueueError::ReplyDropped));
        }

        let (sender, receiver) = oneshot::channel();
        if waiters.pending.insert(id, sender).is_some() {
            warn!("Replaced a stale waiter on TxnID={id}");
        }

        debug!("Registered waiter on TxnID={id}");
        Ok(PendingReply { id, receiver })
    }

    pub(crate) async fn deliver(&self, header: Header, packet: Vec<u8>) {
        let id = header.transaction_id;

        match self.inner.lock().await.pending.remove(&id) {
            Some(waiter) => {
                if waiter.send((header, packet)).is_err() {
                    debug!("Waiter on TxnID={id} went away before its reply");
                }
            }
            None => warn!("Discarding unsolicited reply TxnID={id}"),
        }
    }

    /// Drops every waiter, failing their pending requests, and refuses new ones.
    pub(crate) async fn close(&self) {
        let mut waiters = self.inner.lock().await;
        waiters.closed = true;
        waiters.pending.clear();
    }
}

impl PendingReply {
    pub async fn wait(self) -> Result<Reply, Error> {
        let reply = self
            .receiver
            .await
            .map_err(|_| Error::Queue(QueueError::ReplyDropped))?;

        debug!("Reply received on TxnID={}", self.id);
        Ok(reply)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn header(transaction_id: u16) -> Header {
        Header {
            transaction_id,
            protocol_id: 0,
            length: 3,
            unit_id: 1,
        }
    }

    #[tokio::test]
    async fn replies_reach_their_transaction() {
        let replies = PendingReplies::new();
        let first = replies.register(1).await.expect("Must register");
        let second = replies.register(2).await.expect("Must register");

        replies.deliver(header(2), vec![2]).await;
        replies.deliver(header(1), vec![1]).await;

        assert_eq!(first.wait().await.expect("Must reply").1, vec![1]);
        assert_eq!(second.wait().await.expect("Must reply").1, vec![2]);
    }

    #[tokio::test]
    async fn closing_fails_waiters() {
        let replies = PendingReplies::new();
        let pending = replies.register(7).await.expect("Must register");

        replies.close().await;

        assert!(matches!(
            pending.wait().await,
            Err(Error::Queue(QueueError::ReplyDropped))
        ));
    }

    #[tokio::test]
    async fn closed_queue_refuses_waiters() {
        let replies = PendingReplies::new();
        replies.close().await;

        assert!(matches!(
            replies.register(8).await,
            Err(Error::Queue(QueueError::ReplyDropped))
        ));
    }
}
