//! crates/study_portal_core/src/feed.rs
//!
//! Generation-tagged slots for fetched lists.
//!
//! A `Feed` remembers the key its current contents belong to. Asking for a new
//! key bumps the generation and hands out a `Ticket`; a response is committed
//! only if its ticket still carries the current generation. Responses for a
//! superseded key, or for a key that was dropped, are discarded on arrival.

/// What a panel renders for one list.
#[derive(Debug, Clone, PartialEq)]
pub enum Loadable<T> {
    Idle,
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> Loadable<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Loadable::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Loadable::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Loadable::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Proof of which request a response answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket<K> {
    pub generation: u64,
    pub key: K,
}

#[derive(Debug, Clone)]
pub struct Feed<K, T> {
    key: Option<K>,
    generation: u64,
    state: Loadable<T>,
}

impl<K, T> Default for Feed<K, T> {
    fn default() -> Self {
        Self {
            key: None,
            generation: 0,
            state: Loadable::Idle,
        }
    }
}

impl<K: Clone + PartialEq, T> Feed<K, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(&self) -> Option<&K> {
        self.key.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self) -> &Loadable<T> {
        &self.state
    }

    /// Points the feed at `key`.
    ///
    /// Returns a ticket when a fetch has to be issued: the key changed. `None`
    /// clears the contents and orphans any request still in flight.
    pub fn request(&mut self, key: Option<K>) -> Option<Ticket<K>> {
        match key {
            None => {
                if self.key.is_some() || !matches!(self.state, Loadable::Idle) {
                    self.generation += 1;
                    self.key = None;
                    self.state = Loadable::Idle;
                }
                None
            }
            Some(key) if self.key.as_ref() == Some(&key) => None,
            Some(key) => {
                self.generation += 1;
                self.key = Some(key.clone());
                self.state = Loadable::Loading;
                Some(Ticket {
                    generation: self.generation,
                    key,
                })
            }
        }
    }

    /// Stores the outcome if `ticket` is still current. Returns whether it was kept.
    pub fn commit(&mut self, ticket: &Ticket<K>, result: Result<T, String>) -> bool {
        if ticket.generation != self.generation {
            return false;
        }
        self.state = match result {
            Ok(value) => Loadable::Ready(value),
            Err(message) => Loadable::Failed(message),
        };
        true
    }
}
