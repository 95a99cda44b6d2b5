//! Matrix representations of a network graph and the measurements derived from them.
//!
//! Rows and columns follow the canonical (sorted by id) order of the servers, isolated servers
//! included.

use std::collections::HashMap;

use nalgebra::{DMatrix, DVector, SymmetricEigen};

use crate::graph::Graph;

impl Graph {
    /// Computes the density of the graph, the ratio of links with respect to the maximum
    /// possible links. `NaN` for graphs with fewer than two servers.
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
    /// builder.link("a", "c").unwrap();
    ///
    /// assert_eq!(builder.build().density(), 2.0 / 3.0);
    /// ```
    pub fn density(&self) -> f64 {
        let vc = self.len() as f64;
        let ec = self.edge_count() as f64;

        // Calculate the total number of possible links given a server count.
        let pec = vc * (vc - 1.0) / 2.0;
        ec / pec
    }

    /// Constructs the adjacency matrix for this graph. It is symmetric since links are undirected.
    ///
    /// # Examples
    ///
    /// ```
    /// use nalgebra::dmatrix;
    /// use hopgraph::graph::GraphBuilder;
    /// use hopgraph::server::Server;
    ///
    /// let mut builder = GraphBuilder::new();
    /// builder.insert(Server::new("a", "a"));
    /// builder.insert(Server::new("b", "b"));
    /// builder.link("a", "b").unwrap();
    ///
    /// assert_eq!(
    ///     builder.build().adjacency_matrix(),
    ///     dmatrix![0.0, 1.0;
    ///              1.0, 0.0]
    /// );
    /// ```
    pub fn adjacency_matrix(&self) -> DMatrix<f64> {
        let index: HashMap<&str, usize> = self.ids().enumerate().map(|(i, id)| (id, i)).collect();

        let n = index.len();
        let mut matrix = DMatrix::<f64>::zeros(n, n);

        for edge in self.edges() {
            // Both ends are keys of the graph, so they are in the index.
            if let (Some(&i), Some(&j)) = (index.get(edge.source()), index.get(edge.target())) {
                matrix[(i, j)] = 1.0;
                matrix[(j, i)] = 1.0;
            }
        }

        matrix
    }

    /// Constructs the degree matrix for this graph.
    pub fn degree_matrix(&self) -> DMatrix<f64> {
        let degrees: Vec<f64> = self.servers().map(|s| s.degree() as f64).collect();

        DMatrix::from_diagonal(&DVector::from_vec(degrees))
    }

    /// Constructs the laplacian matrix for this graph.
    pub fn laplacian_matrix(&self) -> DMatrix<f64> {
        self.degree_matrix() - self.adjacency_matrix()
    }

    /// Returns the algebraic connectivity (Fiedler value) of the graph: the second-smallest
    /// eigenvalue of the laplacian. It is `0.0` when the graph is disconnected or has fewer than
    /// two servers, and grows with how well connected the network is.
    pub fn algebraic_connectivity(&self) -> f64 {
        if self.len() < 2 {
            return 0.0;
        }

        let mut eigenvalues: Vec<f64> = SymmetricEigen::new(self.laplacian_matrix())
            .eigenvalues
            .iter()
            .copied()
            .collect();
        eigenvalues.sort_unstable_by(f64::total_cmp);

        // Clamp the rounding noise around zero of disconnected graphs.
        eigenvalues[1].max(0.0)
    }
}
