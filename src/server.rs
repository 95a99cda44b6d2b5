//! A module for working with servers, the vertices of a network graph.

use std::{collections::BTreeSet, fmt};

use itertools::Itertools;

/// Prefix of the ids synthesized for servers whose real id couldn't be resolved.
pub const PLACEHOLDER_PREFIX: &str = "FAKEID_";

/// Description prefix marking servers that are hidden from diameter searches (usually services).
pub const HIDDEN_MARKER: char = '~';

/// Version recorded for servers only known from a `MAP` listing.
pub const UNKNOWN_VERSION: &str = "unknown";

/// A server in the network and the ids of the servers it links to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Server {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) version: Option<String>,
    pub(crate) peers: BTreeSet<String>,
}

impl Server {
    /// Creates a server without peers, description or version.
    ///
    /// # Examples
    ///
    /// ```
    /// use hopgraph::server::Server;
    ///
    /// let server = Server::new("001", "irc.example.net");
    /// assert_eq!(server.name_id(), "irc.example.net (001)");
    /// ```
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            version: None,
            peers: BTreeSet::new(),
        }
    }

    /// Creates a server standing in for `name`, whose id couldn't be resolved.
    ///
    /// # Examples
    ///
    /// ```
    /// use hopgraph::server::Server;
    ///
    /// let server = Server::placeholder("lost.example.net");
    /// assert_eq!(server.id(), "FAKEID_lost.example.net");
    /// assert!(server.is_placeholder());
    /// ```
    pub fn placeholder(name: &str) -> Self {
        Self::new(placeholder_id(name), name)
    }

    /// Sets the description, empty strings are treated as absent.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = non_empty(description.into());
        self
    }

    /// Sets the software version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = non_empty(version.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// The ids of the directly linked servers, in sorted order.
    pub fn peers(&self) -> impl Iterator<Item = &str> + '_ {
        self.peers.iter().map(String::as_str)
    }

    /// Returns the number of directly linked servers.
    pub fn degree(&self) -> usize {
        self.peers.len()
    }

    /// Returns whether this server links directly to the server with `id`.
    pub fn has_peer(&self, id: &str) -> bool {
        self.peers.contains(id)
    }

    /// Returns whether the id was synthesized rather than reported by the network.
    pub fn is_placeholder(&self) -> bool {
        self.id.starts_with(PLACEHOLDER_PREFIX)
    }

    /// Returns whether the description carries the [`HIDDEN_MARKER`].
    pub fn is_hidden(&self) -> bool {
        self.description
            .as_deref()
            .is_some_and(|d| d.starts_with(HIDDEN_MARKER))
    }

    /// Formats the server as `name (id)`.
    pub fn name_id(&self) -> String {
        format!("{} ({})", self.name, self.id)
    }

    /// Applies `description` unless one is already set.
    pub(crate) fn describe(&mut self, description: &str) -> bool {
        if self.description.is_some() || description.is_empty() {
            return false;
        }

        self.description = Some(description.to_owned());
        true
    }
}

/// Derives the placeholder id for a server name.
pub fn placeholder_id(name: &str) -> String {
    format!("{PLACEHOLDER_PREFIX}{name}")
}

/// Folds a server name for comparison. IRC server names are hostnames and only ASCII letters
/// differ in case.
///
/// # Examples
///
/// ```
/// use hopgraph::server::fold_name;
///
/// assert_eq!(fold_name("IRC.Example.NET"), "irc.example.net");
/// assert_eq!(fold_name("Ünï.example.net"), "Ünï.example.net");
/// ```
pub fn fold_name(name: &str) -> String {
    name.to_ascii_lowercase()
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}

//
// Trait implementations
//

impl fmt::Display for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} connected to {}",
            self.name_id(),
            self.peers.iter().join(", ")
        )
    }
}
