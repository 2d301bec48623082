//! Broadcast queue for one-to-many event distribution.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::{AgentflowError, Result};

/// Broadcast queue for one-to-many message distribution.
///
/// Used for execution event broadcasting where all subscribers receive
/// every message. Backed by tokio's broadcast channel.
///
/// Sending into a queue with no subscribers is not an error; the message
/// is simply dropped.
#[derive(Clone)]
pub struct BroadcastQueue<T> {
    sender: Arc<broadcast::Sender<T>>,
}

impl<T: Clone> BroadcastQueue<T> {
    /// create a new broadcast queue
    pub fn new(cap: usize) -> Arc<Self> {
        let (tx, _) = broadcast::channel(cap);

        Arc::new(Self {
            sender: Arc::new(tx),
        })
    }

    /// send a message to the queue
    pub fn send(
        &self,
        msg: T,
    ) -> Result<()> {
        if self.sender.receiver_count() == 0 {
            return Ok(());
        }
        self.sender.send(msg).map_err(|e| AgentflowError::Queue(e.to_string()))?;
        Ok(())
    }

    /// subscribe to the queue
    pub fn subscribe(&self) -> broadcast::Receiver<T> {
        self.sender.subscribe()
    }
}
