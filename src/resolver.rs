//! Resolution of server names to server ids through the live network.
//!
//! The network answers a `GETID <name>` request with either a `GETID: <name> is <id>` notice or
//! a "no such nick/server" numeric. Both replies reach the [`Resolver`] through
//! [`Resolver::deliver`], called by whatever drives the IRC connection, and are matched back to
//! the waiting lookups by name, ignoring case.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        OnceLock,
    },
    time::Duration,
};

use async_trait::async_trait;
use parking_lot::Mutex;
use regex::Regex;
use tokio::sync::oneshot;
use tracing::{debug, trace};

use crate::{error::ResolveError, server::fold_name};

/// How long to wait for a reply to a lookup by default.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Maps a server name to its id.
#[async_trait]
pub trait Resolve: Send + Sync {
    async fn resolve(&self, name: &str) -> Result<String, ResolveError>;
}

/// Sends lookup requests to the network.
pub trait LookupTransport: Send + Sync {
    /// Sends a `GETID` request for `name`, the reply is expected through [`Resolver::deliver`].
    fn request_id(&self, name: &str) -> Result<(), ResolveError>;
}

/// A reply to a lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Found { name: String, id: String },
    NoSuchServer { name: String },
}

impl Reply {
    /// Parses a `GETID: <name> is <id>` notice, any other text yields `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use hopgraph::resolver::Reply;
    ///
    /// assert_eq!(
    ///     Reply::parse_notice("GETID: irc.example.net is 0AB"),
    ///     Some(Reply::Found { name: "irc.example.net".into(), id: "0AB".into() })
    /// );
    /// assert_eq!(Reply::parse_notice("hello"), None);
    /// ```
    pub fn parse_notice(message: &str) -> Option<Self> {
        static NOTICE: OnceLock<Regex> = OnceLock::new();

        let captures = NOTICE
            .get_or_init(|| Regex::new(r"^GETID: (\S+) is (\S+)$").expect("valid regex"))
            .captures(message.trim())?;

        Some(Self::Found {
            name: captures[1].to_owned(),
            id: captures[2].to_owned(),
        })
    }

    /// The name the reply is about.
    pub fn name(&self) -> &str {
        match self {
            Self::Found { name, .. } | Self::NoSuchServer { name } => name,
        }
    }
}

struct Waiter {
    ticket: u64,
    sender: oneshot::Sender<Reply>,
}

/// Lookups waiting for a reply, keyed by lowercased name.
type Pending = Mutex<HashMap<String, Vec<Waiter>>>;

/// Resolves names by sending lookups through a [`LookupTransport`] and waiting for the matching
/// reply.
///
/// Any number of lookups may be outstanding at once, each completes only with a reply naming the
/// server it asked for.
pub struct Resolver<T> {
    transport: T,
    timeout: Duration,
    pending: Pending,
    next_ticket: AtomicU64,
}

impl<T: LookupTransport> Resolver<T> {
    pub fn new(transport: T) -> Self {
        Self::with_timeout(transport, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(transport: T, timeout: Duration) -> Self {
        Self {
            transport,
            timeout,
            pending: Mutex::new(HashMap::new()),
            next_ticket: AtomicU64::new(0),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Hands a reply from the network to the lookups waiting on its name. Returns whether any
    /// lookup was waiting, replies to other clients' queries are simply dropped.
    pub fn deliver(&self, reply: Reply) -> bool {
        let Some(waiters) = self.pending.lock().remove(&key(reply.name())) else {
            trace!(name = reply.name(), "dropping unsolicited lookup reply");
            return false;
        };

        for waiter in waiters {
            // The lookup may have given up in the meantime.
            let _ = waiter.sender.send(reply.clone());
        }

        true
    }

    /// Returns the number of lookups currently waiting for a reply.
    pub fn in_flight(&self) -> usize {
        self.pending.lock().values().map(Vec::len).sum()
    }

    fn register(&self, name: &str) -> (Registration<'_>, oneshot::Receiver<Reply>) {
        let (sender, receiver) = oneshot::channel();
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let key = key(name);

        self.pending
            .lock()
            .entry(key.clone())
            .or_default()
            .push(Waiter { ticket, sender });

        let registration = Registration {
            pending: &self.pending,
            key,
            ticket,
        };

        (registration, receiver)
    }
}

#[async_trait]
impl<T: LookupTransport> Resolve for Resolver<T> {
    async fn resolve(&self, name: &str) -> Result<String, ResolveError> {
        // Registered before sending so a fast reply can't be missed. Dropping the registration
        // removes the waiter whichever way this returns.
        let (_registration, receiver) = self.register(name);

        self.transport.request_id(name)?;
        debug!(name, "requested server id");

        match tokio::time::timeout(self.timeout, receiver).await {
            Ok(Ok(Reply::Found { id, .. })) => Ok(id),
            Ok(Ok(Reply::NoSuchServer { .. })) => Err(ResolveError::NoSuchServer(name.to_owned())),
            Ok(Err(_)) => Err(ResolveError::Closed(name.to_owned())),
            Err(_) => Err(ResolveError::Timeout(name.to_owned())),
        }
    }
}

/// Removes a waiter from the pending set when dropped.
struct Registration<'a> {
    pending: &'a Pending,
    key: String,
    ticket: u64,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        let mut pending = self.pending.lock();

        if let Some(waiters) = pending.get_mut(&self.key) {
            waiters.retain(|waiter| waiter.ticket != self.ticket);

            if waiters.is_empty() {
                pending.remove(&self.key);
            }
        }
    }
}

/// IRC server names compare case-insensitively.
fn key(name: &str) -> String {
    fold_name(name)
}
