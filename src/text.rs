//! Building graphs from the text replies of the `MAP` and `LINKS` commands.
//!
//! `MAP` lists every server with its id but no links, `LINKS` lists every link by server name
//! but no ids. Names found in `LINKS` only are looked up through a [`Resolve`] implementation,
//! and stand-in servers are made up for the ones that can't be resolved.

use std::{
    collections::{BTreeSet, HashMap},
    sync::OnceLock,
};

use futures::{stream, StreamExt};
use regex::Regex;
use tracing::{debug, info, warn};

use crate::{
    error::{FormatError, Result},
    graph::{Graph, GraphBuilder},
    resolver::Resolve,
    server::{fold_name, Server, UNKNOWN_VERSION},
};

/// Characters drawing the tree structure in front of server names in `MAP` replies.
const TREE_GLYPHS: &[char] = &['`', '|', '-', ' '];

/// A server named in a `MAP` reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapEntry {
    pub name: String,
    pub id: String,
}

/// One line of a `LINKS` reply: `server` links to `peer`, `description` belongs to `server`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkRecord {
    pub server: String,
    pub peer: String,
    pub description: String,
}

impl LinkRecord {
    pub fn new(
        server: impl Into<String>,
        peer: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            server: server.into(),
            peer: peer.into(),
            description: description.into(),
        }
    }

    /// Builds a record from the parameters of an `RPL_LINKS` (364) reply:
    /// `<client> <server> <peer> :<hopcount> <description>`.
    ///
    /// # Examples
    ///
    /// ```
    /// use hopgraph::text::LinkRecord;
    ///
    /// let record = LinkRecord::from_reply_params(&["me", "b.example.net", "a.example.net", "1 Bee"]);
    /// assert_eq!(record, Some(LinkRecord::new("b.example.net", "a.example.net", "1 Bee")));
    /// assert_eq!(LinkRecord::from_reply_params(&["me", "b.example.net"]), None);
    /// ```
    pub fn from_reply_params<S: AsRef<str>>(params: &[S]) -> Option<Self> {
        match params {
            [_client, server, peer, description, ..] => Some(Self::new(
                server.as_ref(),
                peer.as_ref(),
                description.as_ref(),
            )),
            [_client, server, peer] => Some(Self::new(server.as_ref(), peer.as_ref(), "")),
            _ => None,
        }
    }
}

/// Parses one line of a `MAP` reply.
///
/// Two layouts are understood: the current `<name> ---- | Users: <n> (<pct>%) [<id>]` and the
/// legacy `<name> (<n>) <id>`. Leading tree drawing characters are ignored.
///
/// # Examples
///
/// ```
/// use hopgraph::text::parse_map_line;
///
/// let entry = parse_map_line("`-b.example.net -- | Users:    2 (50.00%) [00B]").unwrap();
/// assert_eq!((entry.name.as_str(), entry.id.as_str()), ("b.example.net", "00B"));
///
/// let entry = parse_map_line("|-c.example.net (3) 00C").unwrap();
/// assert_eq!((entry.name.as_str(), entry.id.as_str()), ("c.example.net", "00C"));
///
/// assert!(parse_map_line("d.example.net | Users: 1 (25.00%)").is_err());
/// ```
pub fn parse_map_line(line: &str) -> std::result::Result<MapEntry, FormatError> {
    static FORMATS: OnceLock<[Regex; 2]> = OnceLock::new();

    let formats = FORMATS.get_or_init(|| {
        [
            Regex::new(r"^(?P<name>\S+)\s-*\s\|\sUsers:\s+\d+\s+\(.+%\)\s\[(?P<id>\S+)\]$"),
            Regex::new(r"^(?P<name>\S+)\s*\(\d+\)\s(?P<id>\S+)$"),
        ]
        .map(|regex| regex.expect("valid regex"))
    });

    let trimmed = line.trim_end().trim_start_matches(TREE_GLYPHS);

    formats
        .iter()
        .find_map(|format| format.captures(trimmed))
        .map(|captures| MapEntry {
            name: captures["name"].to_owned(),
            id: captures["id"].to_owned(),
        })
        .ok_or_else(|| FormatError::MapLine(line.to_owned()))
}

/// Builds a graph from a `MAP` listing and a `LINKS` listing.
///
/// Every map line must parse, a single bad line fails the whole build. Servers that only appear
/// in the link records are resolved with `resolver`, at most `max_in_flight` at a time; those
/// that can't be resolved get a placeholder id (see [`Server::placeholder`]).
///
/// # Errors
///
/// [`FormatError::MapLine`] for unparseable map lines, [`crate::Error::SelfLoop`] for a record
/// linking two different names that turn out to be the same server. The row a server lists for
/// itself only contributes its description.
pub async fn graph_from_text_sources<R, M>(
    map_lines: &[M],
    link_records: &[LinkRecord],
    resolver: &R,
    max_in_flight: usize,
) -> Result<Graph>
where
    R: Resolve + ?Sized,
    M: AsRef<str>,
{
    let entries = map_lines
        .iter()
        .map(|line| parse_map_line(line.as_ref()))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut builder = GraphBuilder::new();
    let mut ids = NameIndex::default();

    for MapEntry { name, id } in entries {
        debug!(%name, %id, "parsed map entry");
        ids.insert(&name, &id);
        builder.insert(Server::new(id, name).with_version(UNKNOWN_VERSION));
    }

    // Names are resolved in order of first appearance so the outcome doesn't depend on which
    // lookup finishes first.
    let mut unknown = Vec::new();
    let mut queued = BTreeSet::new();
    for record in link_records {
        for name in [&record.server, &record.peer] {
            if ids.get(name).is_none() && queued.insert(fold_name(name)) {
                unknown.push(name.as_str());
            }
        }
    }

    let resolved: Vec<(&str, String)> = stream::iter(unknown)
        .map(|name| async move {
            let id = match resolver.resolve(name).await {
                Ok(id) => id,
                Err(e) => {
                    let server = Server::placeholder(name);
                    warn!(name, id = server.id(), "{e}, using placeholder");
                    server.id().to_owned()
                }
            };
            (name, id)
        })
        .buffered(max_in_flight.max(1))
        .collect()
        .await;

    for (name, id) in resolved {
        debug!(name, %id, "adding server missing from map");
        ids.insert(name, &id);
        builder.insert(Server::new(id, name));
    }

    for record in link_records {
        // Every name was indexed above.
        let (Some(server), Some(peer)) = (ids.get(&record.server), ids.get(&record.peer)) else {
            continue;
        };

        builder.describe(server, &record.description);

        // The server answering `LINKS` lists itself at hop 0.
        if server == peer && fold_name(&record.server) == fold_name(&record.peer) {
            continue;
        }

        builder.link(server, peer)?;
    }

    let graph = builder.build();
    info!(
        servers = graph.len(),
        links = graph.edge_count(),
        "built graph from map and links"
    );

    Ok(graph)
}

/// Maps server names to ids, ignoring case. The first id recorded for a name sticks.
#[derive(Default)]
struct NameIndex {
    ids: HashMap<String, String>,
}

impl NameIndex {
    fn insert(&mut self, name: &str, id: &str) {
        self.ids
            .entry(fold_name(name))
            .or_insert_with(|| id.to_owned());
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.ids.get(&fold_name(name)).map(String::as_str)
    }
}
