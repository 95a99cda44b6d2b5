use std::{collections::HashMap, sync::Arc};

use hopgraph::{
    acquire::SnapshotGate,
    cache::GraphCache,
    config::Config,
    error::ResolveError,
    feed::fetch_graph,
    graph::Graph,
    resolver::{LookupTransport, Reply, Resolver},
    text::LinkRecord,
};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

// Forwards lookups to the simulated network.
struct Loopback {
    requests: mpsc::UnboundedSender<String>,
}

impl LookupTransport for Loopback {
    fn request_id(&self, name: &str) -> Result<(), ResolveError> {
        self.requests
            .send(name.to_owned())
            .map_err(|e| ResolveError::Transport(e.to_string()))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = match std::env::var("HOPGRAPH_CONFIG") {
        Ok(json) => Config::from_json(&json)?,
        Err(_) => Config::default(),
    };

    let cache = GraphCache::new(config.cache_ttl());

    let graph = match &config.feed_url {
        Some(url) => cache.store(fetch_graph(&reqwest::Client::new(), url).await?),
        None => cache.store(crawl_simulated_network(&config).await?),
    };

    report(&graph);

    // A second query within the time-to-live reuses the snapshot.
    if let Some(graph) = cache.get() {
        println!("\nCached snapshot still has {} servers", graph.len());
    }

    Ok(())
}

/// Plays the part of an IRC connection: answers `MAP`, `LINKS` and `GETID` for a small network
/// where one server is missing from `MAP` and one can't be resolved at all.
async fn crawl_simulated_network(config: &Config) -> Result<Graph, Box<dyn std::error::Error>> {
    let ids = HashMap::from([("hidden.example.net", "00H")]);

    let (requests, mut lookups) = mpsc::unbounded_channel();
    let resolver = Arc::new(Resolver::with_timeout(
        Loopback { requests },
        config.resolve_timeout(),
    ));

    tokio::spawn({
        let resolver = resolver.clone();
        async move {
            while let Some(name) = lookups.recv().await {
                let reply = match ids.get(name.as_str()) {
                    Some(id) => Reply::parse_notice(&format!("GETID: {name} is {id}")),
                    None => Some(Reply::NoSuchServer { name }),
                };

                if let Some(reply) = reply {
                    resolver.deliver(reply);
                }
            }
        }
    });

    let gate = SnapshotGate::new();
    let (collection, sink) = gate.begin()?;

    for line in [
        "hub.example.net -------- | Users:   10 (50.00%) [001]",
        "|-east.example.net ----- | Users:    4 (20.00%) [002]",
        "| `-edge.example.net --- | Users:    2 (10.00%) [004]",
        "`-west.example.net ----- | Users:    4 (20.00%) [003]",
    ] {
        sink.map_line(line);
    }
    sink.end_of_map();

    for params in [
        ["me", "edge.example.net", "east.example.net", "2 Edge"],
        ["me", "east.example.net", "hub.example.net", "1 East"],
        ["me", "west.example.net", "hub.example.net", "1 West"],
        ["me", "hidden.example.net", "west.example.net", "2 Hidden"],
        ["me", "services.example.net", "hub.example.net", "~1 Services"],
        ["me", "hub.example.net", "hub.example.net", "0 Hub"],
    ] {
        if let Some(record) = LinkRecord::from_reply_params(&params) {
            sink.link(record);
        }
    }
    sink.end_of_links();

    let snapshot = collection.collect(config.acquire_timeout()).await?;
    Ok(snapshot
        .build(resolver.as_ref(), config.max_in_flight())
        .await?)
}

fn report(graph: &Graph) {
    println!(
        "Network has {} servers and {} links (density {:.2}, algebraic connectivity {:.3})",
        graph.len(),
        graph.edge_count(),
        graph.density(),
        graph.algebraic_connectivity(),
    );

    for server in graph.servers() {
        println!("  {server}");
    }

    if let Some(hub) = graph.most_peers() {
        println!("Server with the most peers is {} with {} peers", hub.name_id(), hub.degree());
    }

    if let Some((hops, (from, to))) = graph.diameter_by(|s| !s.is_hidden()) {
        println!("Largest hop count is {hops}, between {} and {}", from.name_id(), to.name_id());

        if let Some(path) = graph.path_between(from.id(), to.id()) {
            let names: Vec<_> = path.iter().map(|s| s.name()).collect();
            println!("Route: {}", names.join(" -> "));
        }
    }

    for (i, component) in graph.components().iter().enumerate() {
        println!("Component {i}: {} servers", component.len());
    }
}
