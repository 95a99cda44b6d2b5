//! Hopgraph is a small toolkit for analysing the topology of IRC networks: which servers link to
//! which, how many hops separate them and where the hubs are.
//!
//! # Basic usage
//!
//! The library is centered around the [`Graph`](graph::Graph) structure, an immutable snapshot
//! of the network. Snapshots come from one of two sources:
//!
//! - a JSON topology feed, see [`feed`];
//! - the `MAP` and `LINKS` listings of a live server, collected with [`acquire`] and parsed by
//!   [`text`], with servers missing from `MAP` looked up by [`resolver`].
//!
//! Once built, the graph answers distance queries (see the methods documented on
//! [`Graph`](graph::Graph)).
//!
//! ```rust
//! use hopgraph::feed::graph_from_json;
//!
//! let graph = graph_from_json(r#"{
//!     "nodes": {
//!         "001": { "name": "hub.example.net" },
//!         "002": { "name": "leaf-a.example.net" },
//!         "003": { "name": "leaf-b.example.net" }
//!     },
//!     "links": [["001", "002"], ["001", "003"]]
//! }"#).unwrap();
//!
//! // Servers can be looked up by id or by name.
//! let a = graph.find("leaf-a.example.net").unwrap();
//! let b = graph.find("leaf-b.example.net").unwrap();
//!
//! assert_eq!(graph.distance(a.id(), b.id()), Some(2));
//! assert_eq!(graph.most_peers().unwrap().name(), "hub.example.net");
//!
//! let (hops, _) = graph.diameter().unwrap();
//! assert_eq!(hops, 2);
//! ```

mod spectral;
mod traversal;

pub mod acquire;
pub mod cache;
pub mod config;
pub mod edge;
pub mod error;
pub mod feed;
pub mod graph;
pub mod resolver;
pub mod server;
pub mod text;

pub use error::{Error, Result};
