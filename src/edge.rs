//! A module for working with peer links.

/// A pair of servers forming a peer link. Links don't have a direction: the pair is stored in
/// sorted order, so `(a, b)` and `(b, a)` compare, hash and sort identically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge<T> {
    low: T,
    high: T,
}

impl<T: Ord> Edge<T> {
    /// Creates a new edge from two vertices.
    ///
    /// # Examples
    ///
    /// ```
    /// use hopgraph::edge::Edge;
    ///
    /// let edge = Edge::new("b", "a");
    /// assert_eq!(edge, Edge::new("a", "b"));
    /// ```
    pub fn new(a: T, b: T) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    /// Returns the lesser of the two vertices.
    ///
    /// # Examples
    ///
    /// ```
    /// use hopgraph::edge::Edge;
    ///
    /// let edge = Edge::new("b", "a");
    /// assert_eq!(edge.source(), &"a");
    /// ```
    pub fn source(&self) -> &T {
        &self.low
    }

    /// Returns the greater of the two vertices.
    pub fn target(&self) -> &T {
        &self.high
    }

    /// Returns whether the edge contains the given vertex.
    ///
    /// # Examples
    ///
    /// ```
    /// use hopgraph::edge::Edge;
    ///
    /// let edge = Edge::new("a", "b");
    ///
    /// assert!(edge.contains(&"a"));
    /// assert!(!edge.contains(&"c"));
    /// ```
    pub fn contains(&self, vertex: &T) -> bool {
        &self.low == vertex || &self.high == vertex
    }

    /// Returns whether both ends are the same vertex.
    pub fn is_loop(&self) -> bool {
        self.low == self.high
    }

    /// Consumes the edge, returning its vertices in sorted order.
    pub fn into_pair(self) -> (T, T) {
        (self.low, self.high)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{hash_map::DefaultHasher, BTreeSet};
    use std::hash::{Hash, Hasher};

    use super::*;

    #[test]
    fn new() {
        assert_eq!(Edge::new("a", "b"), Edge { low: "a", high: "b" });
        assert_eq!(Edge::new("b", "a"), Edge { low: "a", high: "b" });
    }

    #[test]
    fn contains() {
        let edge = Edge::new("a", "b");

        assert!(edge.contains(&"a"));
        assert!(edge.contains(&"b"));
        assert!(!edge.contains(&"c"));
    }

    #[test]
    fn is_loop() {
        assert!(Edge::new("a", "a").is_loop());
        assert!(!Edge::new("a", "b").is_loop());
    }

    #[test]
    fn ordering() {
        let edges: BTreeSet<_> = [Edge::new("c", "a"), Edge::new("b", "a"), Edge::new("a", "b")]
            .into_iter()
            .collect();

        assert_eq!(
            edges.into_iter().map(Edge::into_pair).collect::<Vec<_>>(),
            vec![("a", "b"), ("a", "c")]
        );
    }

    #[test]
    fn hash() {
        let mut h1 = DefaultHasher::new();
        let mut h2 = DefaultHasher::new();

        Edge::new("a", "b").hash(&mut h1);
        Edge::new("b", "a").hash(&mut h2);

        // Verify k1 == k2 => hash(k1) == hash(k2).
        assert_eq!(h1.finish(), h2.finish());
    }
}
