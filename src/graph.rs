//! A module for working with network graphs.

use std::collections::BTreeMap;

use tracing::debug;

use crate::{
    edge::Edge,
    error::{Error, FormatError, Result},
    server::{fold_name, Server},
};

/// An undirected graph of servers keyed by id: one consistent snapshot of the network.
///
/// Graphs are only produced by a [`GraphBuilder`] and can't be mutated afterwards, so every
/// peer id is guaranteed to be a key of the graph and links are symmetric, loopless and unique.
///
/// The use of a `BTreeMap` gives a canonical (sorted by id) iteration order which every
/// computation on the graph relies on to break ties deterministically.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Graph {
    servers: BTreeMap<String, Server>,
}

impl Graph {
    /// Returns the number of servers in the graph.
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Returns the server with the given id.
    pub fn get(&self, id: &str) -> Option<&Server> {
        self.servers.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.servers.contains_key(id)
    }

    /// Looks a server up by id, falling back to the first server (in id order) whose name
    /// matches ignoring ASCII case.
    ///
    /// # Examples
    ///
    /// ```
    /// use hopgraph::graph::GraphBuilder;
    /// use hopgraph::server::Server;
    ///
    /// let mut builder = GraphBuilder::new();
    /// builder.insert(Server::new("001", "irc.example.net"));
    /// let graph = builder.build();
    ///
    /// assert_eq!(graph.find("001").map(|s| s.id()), Some("001"));
    /// assert_eq!(graph.find("IRC.example.net").map(|s| s.id()), Some("001"));
    /// assert!(graph.find("nope").is_none());
    /// ```
    pub fn find(&self, name_or_id: &str) -> Option<&Server> {
        self.get(name_or_id).or_else(|| {
            let name = fold_name(name_or_id);
            self.servers
                .values()
                .find(|server| fold_name(server.name()) == name)
        })
    }

    /// Iterates over the servers in canonical order.
    pub fn servers(&self) -> impl DoubleEndedIterator<Item = &Server> {
        self.servers.values()
    }

    /// Iterates over the server ids in canonical order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.servers.keys().map(String::as_str)
    }

    /// Returns every link in the graph once, sorted.
    ///
    /// # Examples
    ///
    /// ```
    /// use hopgraph::edge::Edge;
    /// use hopgraph::graph::GraphBuilder;
    /// use hopgraph::server::Server;
    ///
    /// let mut builder = GraphBuilder::new();
    /// builder.insert(Server::new("a", "a"));
    /// builder.insert(Server::new("b", "b"));
    /// builder.link("b", "a").unwrap();
    ///
    /// assert_eq!(builder.build().edges(), vec![Edge::new("a", "b")]);
    /// ```
    pub fn edges(&self) -> Vec<Edge<&str>> {
        // Peers are sorted and symmetric, so keeping the pairs where the server is the lesser
        // vertex yields each link exactly once, already in order.
        self.servers
            .iter()
            .flat_map(|(id, server)| {
                server
                    .peers()
                    .filter(move |peer| id.as_str() < *peer)
                    .map(move |peer| Edge::new(id.as_str(), peer))
            })
            .collect()
    }

    /// Returns the number of links in the graph.
    pub fn edge_count(&self) -> usize {
        self.servers.values().map(Server::degree).sum::<usize>() / 2
    }

    /// Returns the peer count of the server found by [`Graph::find`].
    pub fn peer_count(&self, name_or_id: &str) -> Option<usize> {
        self.find(name_or_id).map(Server::degree)
    }
}

/// Accumulates servers and links into a [`Graph`], enforcing its invariants as it goes.
///
/// The builder only uses ordered collections so the result doesn't depend on the order in
/// which hashing would have visited things.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    servers: BTreeMap<String, Server>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a server. Returns `false` and keeps the existing server if the id is taken.
    ///
    /// Any peers already recorded on `server` are discarded, links are only made through
    /// [`GraphBuilder::link`].
    pub fn insert(&mut self, mut server: Server) -> bool {
        if self.servers.contains_key(server.id()) {
            return false;
        }

        server.peers.clear();
        self.servers.insert(server.id.clone(), server);

        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.servers.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Server> {
        self.servers.get(id)
    }

    /// Sets the description of a server if it doesn't have one yet.
    pub fn describe(&mut self, id: &str, description: &str) -> bool {
        self.servers
            .get_mut(id)
            .is_some_and(|server| server.describe(description))
    }

    /// Links two servers. Returns whether the link is new, inserting an existing link is a no-op.
    ///
    /// # Errors
    ///
    /// Both ids must belong to inserted servers and must differ.
    ///
    /// # Examples
    ///
    /// ```
    /// use hopgraph::graph::GraphBuilder;
    /// use hopgraph::server::Server;
    ///
    /// let mut builder = GraphBuilder::new();
    /// builder.insert(Server::new("a", "a"));
    /// builder.insert(Server::new("b", "b"));
    ///
    /// assert_eq!(builder.link("a", "b").unwrap(), true);
    /// assert_eq!(builder.link("b", "a").unwrap(), false);
    /// assert!(builder.link("a", "a").is_err());
    /// assert!(builder.link("a", "c").is_err());
    /// ```
    pub fn link(&mut self, a: &str, b: &str) -> Result<bool> {
        for id in [a, b] {
            if !self.servers.contains_key(id) {
                return Err(FormatError::UnknownLinkId(id.to_owned()).into());
            }
        }

        if a == b {
            return Err(Error::SelfLoop(a.to_owned()));
        }

        let mut is_inserted = false;
        for (from, to) in [(a, b), (b, a)] {
            if let Some(server) = self.servers.get_mut(from) {
                is_inserted |= server.peers.insert(to.to_owned());
            }
        }

        if is_inserted {
            debug!(a, b, "linked servers");
        }

        Ok(is_inserted)
    }

    /// Finalises the snapshot.
    pub fn build(self) -> Graph {
        Graph {
            servers: self.servers,
        }
    }
}

/// Builds a graph from paths of ids, each server is named after its id.
#[cfg(test)]
macro_rules! graph {
    ($([$($id:expr),+ $(,)?]),* $(,)?) => {{
        let mut builder = $crate::graph::GraphBuilder::new();

        $(
            let path: Vec<&str> = vec![$($id),+];
            for id in &path {
                builder.insert($crate::server::Server::new(*id, *id));
            }
            for pair in path.windows(2) {
                builder.link(pair[0], pair[1]).unwrap();
            }
        )*

        builder.build()
    }};
}

#[cfg(test)]
pub(crate) use graph;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty() {
        let graph = GraphBuilder::new().build();

        assert!(graph.is_empty());
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.edges().is_empty());
    }

    #[test]
    fn insert() {
        let mut builder = GraphBuilder::new();

        assert!(builder.insert(Server::new("1", "a")));
        assert!(!builder.insert(Server::new("1", "b")));

        // First insert wins.
        assert_eq!(builder.get("1").map(Server::name), Some("a"));
    }

    #[test]
    fn insert_discards_peers() {
        let mut server = Server::new("1", "a");
        server.peers.insert("2".to_owned());

        let mut builder = GraphBuilder::new();
        builder.insert(server);

        // A dangling peer must never make it into the graph.
        assert_eq!(builder.build().get("1").map(Server::degree), Some(0));
    }

    #[test]
    fn link_is_symmetric() {
        let graph = graph!(["a", "b"]);

        assert!(graph.get("a").unwrap().has_peer("b"));
        assert!(graph.get("b").unwrap().has_peer("a"));
    }

    #[test]
    fn link_is_idempotent() {
        let mut builder = GraphBuilder::new();
        builder.insert(Server::new("a", "a"));
        builder.insert(Server::new("b", "b"));

        assert!(builder.link("a", "b").unwrap());
        assert!(!builder.link("a", "b").unwrap());
        assert!(!builder.link("b", "a").unwrap());

        let graph = builder.build();
        assert_eq!(graph.get("a").unwrap().degree(), 1);
        assert_eq!(graph.get("b").unwrap().degree(), 1);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn link_rejects_self_loop() {
        let mut builder = GraphBuilder::new();
        builder.insert(Server::new("a", "a"));

        assert!(matches!(builder.link("a", "a"), Err(Error::SelfLoop(id)) if id == "a"));
    }

    #[test]
    fn link_rejects_unknown_id() {
        let mut builder = GraphBuilder::new();
        builder.insert(Server::new("a", "a"));

        assert!(matches!(
            builder.link("a", "z"),
            Err(Error::Format(FormatError::UnknownLinkId(id))) if id == "z"
        ));
        assert_eq!(builder.get("a").unwrap().degree(), 0);
    }

    #[test]
    fn describe() {
        let mut builder = GraphBuilder::new();
        builder.insert(Server::new("a", "a"));

        assert!(!builder.describe("a", ""));
        assert!(builder.describe("a", "1 first"));
        assert!(!builder.describe("a", "1 second"));
        assert!(!builder.describe("z", "nope"));

        assert_eq!(builder.get("a").unwrap().description(), Some("1 first"));
    }

    #[test]
    fn build_is_order_independent() {
        let one = graph!(["a", "b", "c"], ["d", "a"]);
        let two = graph!(["a", "d"], ["c", "b", "a"]);

        assert_eq!(one, two);
    }

    #[test]
    fn edges() {
        let graph = graph!(["c", "a", "b"], ["b", "c"]);

        assert_eq!(
            graph.edges(),
            vec![Edge::new("a", "b"), Edge::new("a", "c"), Edge::new("b", "c")]
        );
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn find() {
        let mut builder = GraphBuilder::new();
        builder.insert(Server::new("2", "twin.example.net"));
        builder.insert(Server::new("1", "Twin.example.net"));
        builder.insert(Server::new("3", "1"));
        let graph = builder.build();

        // Ids take precedence over names.
        assert_eq!(graph.find("1").map(Server::id), Some("1"));
        // The first name match in id order wins.
        assert_eq!(graph.find("twin.example.net").map(Server::id), Some("1"));
        assert_eq!(graph.find("TWIN.example.NET").map(Server::id), Some("1"));
        assert!(graph.find("other").is_none());
        assert!(graph.find("twın.example.net").is_none());
    }

    #[test]
    fn peer_count() {
        let graph = graph!(["a", "b"], ["a", "c"]);

        assert_eq!(graph.peer_count("a"), Some(2));
        assert_eq!(graph.peer_count("b"), Some(1));
        assert_eq!(graph.peer_count("z"), None);
    }

    #[test]
    fn isolated_servers_are_kept() {
        let graph = graph!(["a"], ["b", "c"]);

        assert_eq!(graph.len(), 3);
        assert_eq!(graph.edge_count(), 1);
    }
}
