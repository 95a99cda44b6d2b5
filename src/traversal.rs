//! Distance based queries over a network graph.
//!
//! Links are unweighted so every query is answered by a breadth-first search from a single
//! source. All of them are pure functions of an already built [`Graph`]: servers that can't be
//! found or reached produce `None` rather than an error.

use std::{
    cmp::Reverse,
    collections::{BTreeMap, BTreeSet, HashMap, VecDeque},
};

use itertools::Itertools;

use crate::{graph::Graph, server::Server};

/// The outcome of a breadth-first search: the hop count to every reached server and the server
/// each one was first reached from.
struct Search<'a> {
    distances: BTreeMap<&'a str, usize>,
    parents: HashMap<&'a str, &'a str>,
}

impl Graph {
    /// Returns the number of hops on a shortest path between two servers, `None` if either is
    /// unknown or they aren't connected.
    ///
    /// # Examples
    ///
    /// ```
    /// use hopgraph::graph::GraphBuilder;
    /// use hopgraph::server::Server;
    ///
    /// let mut builder = GraphBuilder::new();
    /// for id in ["a", "b", "c", "d"] {
    ///     builder.insert(Server::new(id, id));
    /// }
    /// builder.link("a", "b").unwrap();
    /// builder.link("b", "c").unwrap();
    /// let graph = builder.build();
    ///
    /// assert_eq!(graph.distance("a", "a"), Some(0));
    /// assert_eq!(graph.distance("a", "c"), Some(2));
    /// assert_eq!(graph.distance("a", "d"), None);
    /// ```
    pub fn distance(&self, start: &str, end: &str) -> Option<usize> {
        self.search(start, Some(end)).distances.get(end).copied()
    }

    /// Returns the hop count from `start` to every server reachable from it, `start` included.
    ///
    /// The map is empty if `start` isn't in the graph.
    pub fn all_distances_from(&self, start: &str) -> BTreeMap<&str, usize> {
        self.search(start, None).distances
    }

    /// Returns the farthest server reachable from `start` and its distance.
    pub fn eccentricity(&self, start: &str) -> Option<(usize, &Server)> {
        self.eccentricity_by(start, |_| true)
    }

    /// Returns the farthest server reachable from `start` among those accepted by `filter`.
    ///
    /// Ties go to the server with the lowest id. `None` if `start` is unknown or no reachable
    /// server passes the filter.
    pub fn eccentricity_by<F>(&self, start: &str, filter: F) -> Option<(usize, &Server)>
    where
        F: Fn(&Server) -> bool,
    {
        let mut farthest: Option<(usize, &Server)> = None;

        for (id, distance) in self.all_distances_from(start) {
            let Some(server) = self.get(id) else {
                continue;
            };

            if !filter(server) {
                continue;
            }

            // Strictly greater keeps the first server reaching the maximum.
            if farthest.map_or(true, |(best, _)| distance > best) {
                farthest = Some((distance, server));
            }
        }

        farthest
    }

    /// Returns the largest distance between any two connected servers and the pair realising it.
    pub fn diameter(&self) -> Option<(usize, (&Server, &Server))> {
        self.diameter_by(|_| true)
    }

    /// Returns the largest distance between two connected servers that are both accepted by
    /// `filter`, e.g. to leave services out with `|s| !s.is_hidden()`.
    ///
    /// Pairs are scanned in id order and the first pair reaching the maximum wins. Servers in
    /// different components never form a pair.
    ///
    /// # Examples
    ///
    /// ```
    /// use hopgraph::graph::GraphBuilder;
    /// use hopgraph::server::Server;
    ///
    /// let mut builder = GraphBuilder::new();
    /// for id in ["a", "b", "c"] {
    ///     builder.insert(Server::new(id, id));
    /// }
    /// builder.link("a", "b").unwrap();
    /// builder.link("b", "c").unwrap();
    /// let graph = builder.build();
    ///
    /// let (hops, (from, to)) = graph.diameter().unwrap();
    /// assert_eq!((hops, from.id(), to.id()), (2, "a", "c"));
    /// ```
    pub fn diameter_by<F>(&self, filter: F) -> Option<(usize, (&Server, &Server))>
    where
        F: Fn(&Server) -> bool,
    {
        let mut widest: Option<(usize, (&Server, &Server))> = None;

        for source in self.servers().filter(|&server| filter(server)) {
            let Some((distance, target)) = self.eccentricity_by(source.id(), &filter) else {
                continue;
            };

            if widest.map_or(true, |(best, _)| distance > best) {
                widest = Some((distance, (source, target)));
            }
        }

        widest
    }

    /// Returns the servers on a shortest path from `start` to `end`, both included.
    ///
    /// Peers are explored in id order so the same path is returned for the same graph.
    ///
    /// # Examples
    ///
    /// ```
    /// use hopgraph::graph::GraphBuilder;
    /// use hopgraph::server::Server;
    ///
    /// let mut builder = GraphBuilder::new();
    /// for id in ["a", "b", "c", "d"] {
    ///     builder.insert(Server::new(id, id));
    /// }
    /// builder.link("a", "b").unwrap();
    /// builder.link("b", "c").unwrap();
    /// builder.link("c", "d").unwrap();
    /// builder.link("a", "d").unwrap();
    /// let graph = builder.build();
    ///
    /// let path: Vec<_> = graph.path_between("a", "c").unwrap().iter().map(|s| s.id()).collect();
    /// assert_eq!(path, vec!["a", "b", "c"]);
    /// ```
    pub fn path_between(&self, start: &str, end: &str) -> Option<Vec<&Server>> {
        let search = self.search(start, Some(end));
        let (mut current, _) = search.distances.get_key_value(end)?;

        let mut path = vec![self.get(current)?];
        while let Some(parent) = search.parents.get(current) {
            path.push(self.get(parent)?);
            current = parent;
        }
        path.reverse();

        Some(path)
    }

    /// Returns the server with the most peers, the lowest id wins ties.
    pub fn most_peers(&self) -> Option<&Server> {
        // `max_by_key` keeps the last maximum, scanning backwards makes that the lowest id.
        self.servers().rev().max_by_key(|server| server.degree())
    }

    /// Returns every server ranked by peer count, highest first, ties in id order.
    pub fn degree_ranking(&self) -> Vec<&Server> {
        self.servers()
            .sorted_by_key(|server| Reverse(server.degree()))
            .collect()
    }

    /// Returns the connected components of the graph, ordered by their lowest id.
    pub fn components(&self) -> Vec<BTreeSet<&str>> {
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut components = Vec::new();

        for id in self.ids() {
            if seen.contains(id) {
                continue;
            }

            let component: BTreeSet<&str> = self.all_distances_from(id).into_keys().collect();
            seen.extend(&component);
            components.push(component);
        }

        components
    }

    //
    // Private
    //

    /// Breadth-first search from `start`, stopping early once `target` has been reached.
    ///
    /// A server is assigned its distance when it is enqueued and is never enqueued again, which
    /// makes the search terminate on cyclic graphs.
    fn search(&self, start: &str, target: Option<&str>) -> Search<'_> {
        let mut search = Search {
            distances: BTreeMap::new(),
            parents: HashMap::new(),
        };

        let Some(source) = self.get(start).map(Server::id) else {
            return search;
        };

        search.distances.insert(source, 0);

        let mut queue = VecDeque::from([source]);
        while let Some(current) = queue.pop_front() {
            if target == Some(current) {
                break;
            }

            let Some(server) = self.get(current) else {
                continue;
            };

            let next_distance = search.distances[current] + 1;
            for peer in server.peers() {
                if search.distances.contains_key(peer) {
                    continue;
                }

                search.distances.insert(peer, next_distance);
                search.parents.insert(peer, current);
                queue.push_back(peer);
            }
        }

        search
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::graph;

    use super::*;

    fn ids<'a>(servers: impl IntoIterator<Item = &'a Server>) -> Vec<&'a str> {
        servers.into_iter().map(Server::id).collect()
    }

    #[test]
    fn distance_to_self() {
        let graph = graph!(["a", "b", "c"], ["d"]);

        for id in graph.ids() {
            assert_eq!(graph.distance(id, id), Some(0));
        }
    }

    #[test]
    fn distance_is_symmetric() {
        let graph = graph!(["a", "b", "c", "d"], ["b", "e", "f"], ["f", "a"]);

        for a in graph.ids() {
            for b in graph.ids() {
                assert_eq!(graph.distance(a, b), graph.distance(b, a));
            }
        }
    }

    #[test]
    fn distance_unknown_server() {
        let graph = graph!(["a", "b"]);

        assert_eq!(graph.distance("a", "z"), None);
        assert_eq!(graph.distance("z", "a"), None);
        assert_eq!(graph.distance("z", "z"), None);
    }

    #[test]
    fn distance_with_cycle() {
        let graph = graph!(["a", "b", "c", "d", "e", "a"]);

        assert_eq!(graph.distance("a", "c"), Some(2));
        assert_eq!(graph.distance("a", "d"), Some(2));
        assert_eq!(graph.distance("b", "e"), Some(2));
    }

    #[test]
    fn all_distances_from() {
        let graph = graph!(["a", "b", "c", "d"], ["a", "e", "d"], ["x", "y"]);

        let distances = graph.all_distances_from("a");

        assert_eq!(
            distances,
            BTreeMap::from([("a", 0), ("b", 1), ("c", 2), ("d", 2), ("e", 1)])
        );
    }

    #[test]
    fn all_distances_from_are_shortest() {
        // Every reached server is one hop further than its closest peer.
        let graph = graph!(["a", "b", "c", "d", "e"], ["a", "f", "e"], ["c", "f"]);
        let distances = graph.all_distances_from("a");

        for (id, distance) in &distances {
            if *id == "a" {
                assert_eq!(*distance, 0);
                continue;
            }

            let closest_peer = graph
                .get(id)
                .unwrap()
                .peers()
                .filter_map(|peer| distances.get(peer))
                .min()
                .unwrap();

            assert_eq!(*distance, closest_peer + 1);
        }
    }

    #[test]
    fn all_distances_from_unknown_server() {
        let graph = graph!(["a", "b"]);

        assert!(graph.all_distances_from("z").is_empty());
    }

    #[test]
    fn eccentricity() {
        let graph = graph!(["a", "b", "c"], ["b", "d"]);

        let (distance, server) = graph.eccentricity("a").unwrap();

        // "c" and "d" are both two hops away, the lowest id wins.
        assert_eq!((distance, server.id()), (2, "c"));
    }

    #[test]
    fn eccentricity_of_isolated_server() {
        let graph = graph!(["a"], ["b", "c"]);

        let (distance, server) = graph.eccentricity("a").unwrap();
        assert_eq!((distance, server.id()), (0, "a"));
    }

    #[test]
    fn eccentricity_by() {
        let graph = graph!(["a", "b", "c", "d"]);

        let (distance, server) = graph.eccentricity_by("a", |s| s.id() != "d").unwrap();
        assert_eq!((distance, server.id()), (2, "c"));

        assert!(graph.eccentricity_by("a", |_| false).is_none());
        assert!(graph.eccentricity("z").is_none());
    }

    #[test]
    fn diameter() {
        let graph = graph!(["a", "b", "c", "d"], ["b", "e"]);

        let (distance, (from, to)) = graph.diameter().unwrap();

        assert_eq!(distance, 3);
        assert_eq!((from.id(), to.id()), ("a", "d"));
    }

    #[test]
    fn diameter_bounds_eccentricity() {
        let graph = graph!(["a", "b", "c", "d"], ["b", "e", "f"], ["c", "g"]);
        let (diameter, _) = graph.diameter().unwrap();

        for id in graph.ids() {
            let (eccentricity, _) = graph.eccentricity(id).unwrap();
            assert!(diameter >= eccentricity);
        }
    }

    #[test]
    fn diameter_ignores_other_components() {
        let graph = graph!(["a", "b"], ["c", "d"]);

        assert_eq!(graph.distance("a", "c"), None);

        let (distance, (from, to)) = graph.diameter().unwrap();
        assert_eq!((distance, from.id(), to.id()), (1, "a", "b"));

        // Restricting to one component leaves the other out entirely.
        let (distance, (from, to)) = graph.diameter_by(|s| s.id() >= "c").unwrap();
        assert_eq!((distance, from.id(), to.id()), (1, "c", "d"));
    }

    #[test]
    fn diameter_by_skips_hidden_servers() {
        let mut builder = crate::graph::GraphBuilder::new();
        for id in ["a", "b", "c"] {
            builder.insert(Server::new(id, id));
        }
        builder.insert(Server::new("s", "services").with_description("~services"));
        builder.link("a", "b").unwrap();
        builder.link("b", "c").unwrap();
        builder.link("c", "s").unwrap();
        let graph = builder.build();

        assert_eq!(graph.diameter().map(|(d, _)| d), Some(3));

        let (distance, (from, to)) = graph.diameter_by(|s| !s.is_hidden()).unwrap();
        assert_eq!((distance, from.id(), to.id()), (2, "a", "c"));
    }

    #[test]
    fn diameter_of_empty_graph() {
        let graph = crate::graph::GraphBuilder::new().build();

        assert!(graph.diameter().is_none());
        assert!(graph.most_peers().is_none());
        assert!(graph.components().is_empty());
    }

    #[test]
    fn path_between() {
        let graph = graph!(["a", "b", "c", "d"], ["a", "e", "d"]);

        assert_eq!(ids(graph.path_between("a", "d").unwrap()), vec!["a", "e", "d"]);
        assert_eq!(ids(graph.path_between("a", "a").unwrap()), vec!["a"]);
        assert_eq!(ids(graph.path_between("d", "b").unwrap()), vec!["d", "c", "b"]);
    }

    #[test]
    fn path_between_is_shortest() {
        // A depth-first walk from "a" would wander down "b" first.
        let graph = graph!(["a", "b", "c", "d", "e", "f"], ["a", "f"]);

        let path = graph.path_between("a", "e").unwrap();

        assert_eq!(ids(path.iter().copied()), vec!["a", "f", "e"]);
        assert_eq!(Some(path.len() - 1), graph.distance("a", "e"));
    }

    #[test]
    fn path_between_disconnected() {
        let graph = graph!(["a", "b"], ["c", "d"]);

        assert!(graph.path_between("a", "d").is_none());
        assert!(graph.path_between("a", "z").is_none());
    }

    #[test]
    fn most_peers() {
        let graph = graph!(["a", "b", "c"], ["d", "c", "e"]);

        assert_eq!(graph.most_peers().map(Server::id), Some("c"));
    }

    #[test]
    fn most_peers_tie_break() {
        let graph = graph!(["b", "a"]);

        assert_eq!(graph.most_peers().map(Server::id), Some("a"));
    }

    #[test]
    fn degree_ranking() {
        let graph = graph!(["a", "b", "c"], ["d", "c", "e"], ["f"]);

        assert_eq!(ids(graph.degree_ranking()), vec!["c", "b", "a", "d", "e", "f"]);
    }

    #[test]
    fn components() {
        let graph = graph!(["d", "c"], ["b", "a"], ["e"]);

        assert_eq!(
            graph.components(),
            vec![
                BTreeSet::from(["a", "b"]),
                BTreeSet::from(["c", "d"]),
                BTreeSet::from(["e"]),
            ]
        );
    }
}
