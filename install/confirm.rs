/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Named publish/subscribe topics carrying JSON messages.

use std::collections::HashMap;
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, unbounded};
use log::warn;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub const CONFIRM_TOPIC: &str = "confirm";

/// An endpoint the operator confirmed on the install page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationMessage {
    pub uri: String,
}

#[derive(Clone, Default)]
pub struct MessageBus {
    topics: Arc<Mutex<HashMap<String, Vec<Sender<Vec<u8>>>>>>,
}

impl MessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, topic: &str) -> Subscription {
        let (sender, receiver) = unbounded();
        self.topics
            .lock()
            .entry(topic.to_string())
            .or_default()
            .push(sender);
        Subscription {
            topic: topic.to_string(),
            receiver,
        }
    }

    /// Deliver `message` to every live subscriber of `topic`; returns how
    /// many received it.
    pub fn publish<T: Serialize>(&self, topic: &str, message: &T) -> Result<usize, serde_json::Error> {
        let payload = serde_json::to_vec(message)?;
        let mut topics = self.topics.lock();
        let Some(subscribers) = topics.get_mut(topic) else {
            return Ok(0);
        };
        subscribers.retain(|subscriber| subscriber.send(payload.clone()).is_ok());
        Ok(subscribers.len())
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics.lock().get(topic).map_or(0, Vec::len)
    }
}

pub struct Subscription {
    topic: String,
    receiver: Receiver<Vec<u8>>,
}

impl Subscription {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Next decodable message, skipping any that do not decode as `T`.
    pub fn try_next<T: DeserializeOwned>(&self) -> Option<T> {
        for payload in self.receiver.try_iter() {
            match serde_json::from_slice(&payload) {
                Ok(message) => return Some(message),
                Err(error) => warn!("dropping undecodable message on `{}`: {error}", self.topic),
            }
        }
        None
    }

    pub fn drain<T: DeserializeOwned>(&self) -> Vec<T> {
        std::iter::from_fn(|| self.try_next()).collect()
    }
}
