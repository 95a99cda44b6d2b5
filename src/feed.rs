//! Building graphs from the JSON topology feed.
//!
//! The feed is a single document of the form:
//!
//! ```json
//! {
//!     "nodes": { "001": { "name": "a.example.net", "description": "Hub", "version": "6.1.0" } },
//!     "links": [["001", "002"]]
//! }
//! ```
//!
//! Node payloads don't repeat their id, it is taken from the key.

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::{debug, info};

use crate::{
    error::{FormatError, Result},
    graph::{Graph, GraphBuilder},
    server::Server,
};

#[derive(Debug, Deserialize)]
struct Feed {
    nodes: BTreeMap<String, FeedNode>,
    #[serde(default)]
    links: Vec<(String, String)>,
}

#[derive(Debug, Deserialize)]
struct FeedNode {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    version: Option<String>,
}

/// Fetches the feed at `url` and builds a graph from it. Failures aren't retried.
///
/// # Errors
///
/// [`crate::Error::Transport`] if the request fails or the server doesn't answer with a success
/// status, otherwise see [`graph_from_json`].
pub async fn fetch_graph(client: &reqwest::Client, url: &str) -> Result<Graph> {
    debug!(url, "fetching topology feed");

    let body = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    graph_from_json(&body)
}

/// Builds a graph from a feed document.
///
/// # Errors
///
/// [`FormatError::Json`] if the document is malformed, [`FormatError::UnknownLinkId`] if a link
/// names a node that isn't listed and [`crate::Error::SelfLoop`] if a node links to itself.
///
/// # Examples
///
/// ```
/// use hopgraph::feed::graph_from_json;
///
/// let graph = graph_from_json(r#"{
///     "nodes": {
///         "001": { "name": "a.example.net", "version": "6.1.0" },
///         "002": { "name": "b.example.net" }
///     },
///     "links": [["001", "002"]]
/// }"#).unwrap();
///
/// assert_eq!(graph.distance("001", "002"), Some(1));
/// assert_eq!(graph.get("001").unwrap().version(), Some("6.1.0"));
/// ```
pub fn graph_from_json(json: &str) -> Result<Graph> {
    let feed: Feed = serde_json::from_str(json).map_err(FormatError::from)?;

    let mut builder = GraphBuilder::new();

    for (id, node) in feed.nodes {
        let mut server = Server::new(id, node.name);
        if let Some(description) = node.description {
            server = server.with_description(description);
        }
        if let Some(version) = node.version {
            server = server.with_version(version);
        }

        builder.insert(server);
    }

    for (a, b) in &feed.links {
        builder.link(a, b)?;
    }

    let graph = builder.build();
    info!(
        servers = graph.len(),
        links = graph.edge_count(),
        "built graph from topology feed"
    );

    Ok(graph)
}
