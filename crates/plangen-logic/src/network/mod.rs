//! Utility networks derived from a blueprint.
//!
//! A network is a plain node/segment list computed on demand from the rooms;
//! nothing here is stored on the blueprint. `plumbing` and `electrical`
//! build the two concrete networks, this module holds the shared graph type
//! and its queries (BFS paths, simple-path counts, tree check).

pub mod electrical;
pub mod plumbing;

pub use electrical::build_electrical;
pub use plumbing::build_plumbing;

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};

/// Index into `Network::nodes`.
pub type NodeId = usize;

/// Vertical position of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Roof,
    Floor(u32),
    Basement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentClass {
    Main,
    Riser,
    Branch,
    Lateral,
}

/// What an electrical endpoint feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureCode {
    Light,
    Power,
    Exhaust,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipeNodeKind {
    Tank,
    Riser,
    Tee,
    Branch,
    Endpoint,
    Drain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElecNodeKind {
    Meter,
    Riser,
    DistributionBoard,
    Switchboard,
    Endpoint,
}

/// A point of the network, in floor-local feet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node<K> {
    pub id: String,
    pub kind: K,
    pub level: Level,
    pub x: f64,
    pub y: f64,
    /// Room served by an endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixture: Option<FixtureCode>,
}

/// Undirected link between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub from: NodeId,
    pub to: NodeId,
    pub class: SegmentClass,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Network<K> {
    pub nodes: Vec<Node<K>>,
    pub segments: Vec<Segment>,
}

pub type PlumbingNetwork = Network<PipeNodeKind>;
pub type ElectricalNetwork = Network<ElecNodeKind>;

impl<K> Default for Network<K> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            segments: Vec::new(),
        }
    }
}

impl<K: Copy + PartialEq> Network<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node and return its id.
    pub fn add_node(
        &mut self,
        id: impl Into<String>,
        kind: K,
        level: Level,
        x: f64,
        y: f64,
    ) -> NodeId {
        self.nodes.push(Node {
            id: id.into(),
            kind,
            level,
            x,
            y,
            room_id: None,
            fixture: None,
        });
        self.nodes.len() - 1
    }

    pub fn connect(&mut self, from: NodeId, to: NodeId, class: SegmentClass) {
        self.segments.push(Segment { from, to, class });
    }

    pub fn node(&self, id: NodeId) -> Option<&Node<K>> {
        self.nodes.get(id)
    }

    /// Look a node up by its string id.
    pub fn find(&self, id: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.id == id)
    }

    pub fn nodes_of_kind(&self, kind: K) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(move |(_, n)| n.kind == kind)
            .map(|(i, _)| i)
    }

    /// The node serving `room_id` on `floor`.
    pub fn endpoint_for_room(&self, floor: u32, room_id: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.level == Level::Floor(floor) && n.room_id.as_deref() == Some(room_id))
    }

    pub fn segments_of_class(&self, class: SegmentClass) -> impl Iterator<Item = usize> + '_ {
        self.segments
            .iter()
            .enumerate()
            .filter(move |(_, s)| s.class == class)
            .map(|(i, _)| i)
    }

    /// node → [(neighbor, segment index)]
    fn adjacency(&self) -> Vec<Vec<(NodeId, usize)>> {
        let mut adj = vec![Vec::new(); self.nodes.len()];
        for (i, s) in self.segments.iter().enumerate() {
            if s.from < adj.len() && s.to < adj.len() {
                adj[s.from].push((s.to, i));
                adj[s.to].push((s.from, i));
            }
        }
        adj
    }

    /// Shortest path by BFS, as the node sequence `from..=to`.
    pub fn path(&self, from: NodeId, to: NodeId) -> Option<Vec<NodeId>> {
        if from >= self.nodes.len() || to >= self.nodes.len() {
            return None;
        }
        if from == to {
            return Some(vec![from]);
        }
        let adj = self.adjacency();
        let mut parent: Vec<Option<NodeId>> = vec![None; self.nodes.len()];
        let mut visited = vec![false; self.nodes.len()];
        let mut queue = VecDeque::new();
        visited[from] = true;
        queue.push_back(from);

        while let Some(current) = queue.pop_front() {
            for &(next, _) in &adj[current] {
                if visited[next] {
                    continue;
                }
                visited[next] = true;
                parent[next] = Some(current);
                if next == to {
                    let mut path = vec![to];
                    let mut node = to;
                    while let Some(p) = parent[node] {
                        path.push(p);
                        node = p;
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(next);
            }
        }
        None
    }

    /// Number of distinct simple paths between two nodes.
    pub fn count_paths(&self, from: NodeId, to: NodeId) -> usize {
        if from >= self.nodes.len() || to >= self.nodes.len() {
            return 0;
        }
        let adj = self.adjacency();
        let mut on_path = vec![false; self.nodes.len()];
        let mut used_segments = HashSet::new();
        count_simple_paths(&adj, from, to, &mut on_path, &mut used_segments)
    }

    /// Nodes reachable from `start`, including itself.
    pub fn reachable(&self, start: NodeId) -> Vec<bool> {
        let mut seen = vec![false; self.nodes.len()];
        if start >= self.nodes.len() {
            return seen;
        }
        let adj = self.adjacency();
        let mut queue = VecDeque::from([start]);
        seen[start] = true;
        while let Some(current) = queue.pop_front() {
            for &(next, _) in &adj[current] {
                if !seen[next] {
                    seen[next] = true;
                    queue.push_back(next);
                }
            }
        }
        seen
    }

    /// Connected and acyclic.
    pub fn is_tree(&self) -> bool {
        if self.nodes.is_empty() {
            return self.segments.is_empty();
        }
        self.segments.len() == self.nodes.len() - 1 && self.reachable(0).iter().all(|&r| r)
    }

    /// A copy with segment `index` removed.
    pub fn without_segment(&self, index: usize) -> Self
    where
        K: Clone,
    {
        let mut copy = self.clone();
        if index < copy.segments.len() {
            copy.segments.remove(index);
        }
        copy
    }
}

fn count_simple_paths(
    adj: &[Vec<(NodeId, usize)>],
    current: NodeId,
    target: NodeId,
    on_path: &mut [bool],
    used_segments: &mut HashSet<usize>,
) -> usize {
    if current == target {
        return 1;
    }
    on_path[current] = true;
    let mut total = 0;
    for &(next, seg) in &adj[current] {
        if on_path[next] || used_segments.contains(&seg) {
            continue;
        }
        used_segments.insert(seg);
        total += count_simple_paths(adj, next, target, on_path, used_segments);
        used_segments.remove(&seg);
    }
    on_path[current] = false;
    total
}
