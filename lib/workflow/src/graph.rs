//! Workflow graph implementation using petgraph.
//!
//! A `WorkflowGraph` is an immutable, validated view of a workflow's nodes
//! and edges:
//! - Node indices follow declaration order
//! - Edge indices follow insertion order
//!
//! Both orders are relied on by the scheduler for reproducible plans.

use crate::edge::Edge;
use crate::error::GraphError;
use crate::node::{Node, NodeId};
use petgraph::Direction;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The raw `{nodes, edges}` shape of a workflow, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDefinition {
    /// Nodes in declaration order.
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Edges in declaration order.
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl GraphDefinition {
    /// Creates a definition from nodes and edges.
    #[must_use]
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    /// Validates the definition and builds a graph.
    ///
    /// # Errors
    ///
    /// See [`WorkflowGraph::build`].
    pub fn build(self) -> Result<WorkflowGraph, GraphError> {
        WorkflowGraph::build(self.nodes, self.edges)
    }
}

/// A validated workflow graph.
///
/// Node ids are unique and non-empty and every edge references existing
/// nodes. The graph may still contain cycles; those are reported by the
/// scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "GraphDefinition", try_from = "GraphDefinition")]
pub struct WorkflowGraph {
    graph: DiGraph<Node, Edge>,
    node_index_map: HashMap<NodeId, NodeIndex>,
}

impl WorkflowGraph {
    /// Validates nodes and edges and builds the graph.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A node id is empty
    /// - Two nodes share an id
    /// - An edge's source or target is not a node of this graph
    pub fn build(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self, GraphError> {
        let mut graph = DiGraph::with_capacity(nodes.len(), edges.len());
        let mut node_index_map = HashMap::with_capacity(nodes.len());

        for (position, node) in nodes.into_iter().enumerate() {
            if node.id.is_empty() {
                return Err(GraphError::EmptyNodeId { position });
            }
            if node_index_map.contains_key(&node.id) {
                return Err(GraphError::DuplicateNodeId { node_id: node.id });
            }
            let node_id = node.id.clone();
            let index = graph.add_node(node);
            node_index_map.insert(node_id, index);
        }

        for edge in edges {
            let source = Self::endpoint(&node_index_map, &edge, &edge.source)?;
            let target = Self::endpoint(&node_index_map, &edge, &edge.target)?;
            graph.add_edge(source, target, edge);
        }

        Ok(Self {
            graph,
            node_index_map,
        })
    }

    fn endpoint(
        node_index_map: &HashMap<NodeId, NodeIndex>,
        edge: &Edge,
        node_id: &NodeId,
    ) -> Result<NodeIndex, GraphError> {
        node_index_map
            .get(node_id)
            .copied()
            .ok_or_else(|| GraphError::DanglingEdge {
                edge_id: edge.id.clone(),
                node_id: node_id.clone(),
            })
    }

    /// Returns a node by its id.
    #[must_use]
    pub fn node(&self, node_id: &str) -> Option<&Node> {
        let index = self.node_index_map.get(node_id)?;
        self.graph.node_weight(*index)
    }

    /// Returns true if the graph has a node with this id.
    #[must_use]
    pub fn contains(&self, node_id: &str) -> bool {
        self.node_index_map.contains_key(node_id)
    }

    /// Returns the declaration position of a node.
    #[must_use]
    pub fn position_of(&self, node_id: &str) -> Option<usize> {
        self.node_index_map.get(node_id).map(|index| index.index())
    }

    /// Returns all nodes in declaration order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_weights()
    }

    /// Returns all edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.graph.edge_weights()
    }

    /// Returns the number of nodes in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of edges in the graph.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns true if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Returns each node's outgoing edges with their targets.
    ///
    /// Every node has an entry; edges are listed in insertion order.
    #[must_use]
    pub fn adjacency(&self) -> HashMap<NodeId, Vec<(&Edge, &NodeId)>> {
        self.graph
            .node_indices()
            .map(|index| {
                let successors = self
                    .directed_edges(index, Direction::Outgoing)
                    .into_iter()
                    .filter_map(|edge_index| {
                        let (_, target) = self.graph.edge_endpoints(edge_index)?;
                        Some((&self.graph[edge_index], &self.graph[target].id))
                    })
                    .collect();
                (self.graph[index].id.clone(), successors)
            })
            .collect()
    }

    /// Returns the number of incoming edges of every node.
    #[must_use]
    pub fn in_degree(&self) -> HashMap<NodeId, usize> {
        self.graph
            .node_indices()
            .map(|index| {
                let degree = self
                    .graph
                    .edges_directed(index, Direction::Incoming)
                    .count();
                (self.graph[index].id.clone(), degree)
            })
            .collect()
    }

    /// Returns nodes that have no incoming edges, in declaration order.
    pub fn source_nodes(&self) -> Vec<&Node> {
        self.graph
            .node_indices()
            .filter(|&index| {
                self.graph
                    .edges_directed(index, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .map(|index| &self.graph[index])
            .collect()
    }

    /// Returns the upstream nodes of a node with the connecting edges.
    ///
    /// Listed in edge insertion order. A node connected by two edges
    /// appears twice.
    pub fn predecessors(&self, node_id: &str) -> Vec<(&Node, &Edge)> {
        self.neighbors(node_id, Direction::Incoming)
    }

    /// Returns the downstream nodes of a node with the connecting edges.
    ///
    /// Listed in edge insertion order.
    pub fn successors(&self, node_id: &str) -> Vec<(&Node, &Edge)> {
        self.neighbors(node_id, Direction::Outgoing)
    }

    fn neighbors(&self, node_id: &str, direction: Direction) -> Vec<(&Node, &Edge)> {
        let Some(&index) = self.node_index_map.get(node_id) else {
            return Vec::new();
        };

        self.directed_edges(index, direction)
            .into_iter()
            .filter_map(|edge_index| {
                let (source, target) = self.graph.edge_endpoints(edge_index)?;
                let other = match direction {
                    Direction::Outgoing => target,
                    Direction::Incoming => source,
                };
                Some((&self.graph[other], &self.graph[edge_index]))
            })
            .collect()
    }

    /// Edge indices touching a node, sorted into insertion order.
    ///
    /// petgraph walks its adjacency lists newest-first.
    fn directed_edges(&self, index: NodeIndex, direction: Direction) -> Vec<EdgeIndex> {
        let mut edges: Vec<EdgeIndex> = self
            .graph
            .edges_directed(index, direction)
            .map(|edge| edge.id())
            .collect();
        edges.sort_unstable();
        edges
    }

    /// Returns the graph in its raw `{nodes, edges}` shape.
    #[must_use]
    pub fn to_definition(&self) -> GraphDefinition {
        GraphDefinition {
            nodes: self.nodes().cloned().collect(),
            edges: self.edges().cloned().collect(),
        }
    }
}

impl TryFrom<GraphDefinition> for WorkflowGraph {
    type Error = GraphError;

    fn try_from(definition: GraphDefinition) -> Result<Self, Self::Error> {
        definition.build()
    }
}

impl From<WorkflowGraph> for GraphDefinition {
    fn from(graph: WorkflowGraph) -> Self {
        graph.to_definition()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(id: &str) -> Node {
        Node::new(id, "transform")
    }

    fn diamond() -> WorkflowGraph {
        // a -> b -> d
        //  \-> c -/
        WorkflowGraph::build(
            vec![node("a"), node("b"), node("c"), node("d")],
            vec![
                Edge::between("a", "b"),
                Edge::between("a", "c"),
                Edge::between("b", "d"),
                Edge::between("c", "d"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn build_rejects_duplicate_ids() {
        let err = WorkflowGraph::build(vec![node("a"), node("a")], vec![]).unwrap_err();
        assert_eq!(
            err,
            GraphError::DuplicateNodeId {
                node_id: NodeId::from("a")
            }
        );
    }

    #[test]
    fn build_rejects_empty_ids() {
        let err = WorkflowGraph::build(vec![node("a"), node("")], vec![]).unwrap_err();
        assert_eq!(err, GraphError::EmptyNodeId { position: 1 });
    }

    #[test]
    fn build_rejects_dangling_edges() {
        let err = WorkflowGraph::build(
            vec![node("a")],
            vec![Edge::new("e1", "a", "missing")],
        )
        .unwrap_err();
        assert_eq!(
            err,
            GraphError::DanglingEdge {
                edge_id: "e1".to_string(),
                node_id: NodeId::from("missing"),
            }
        );
    }

    #[test]
    fn build_accepts_cycles() {
        let graph = WorkflowGraph::build(
            vec![node("a"), node("b")],
            vec![Edge::between("a", "b"), Edge::between("b", "a")],
        );
        assert!(graph.is_ok());
    }

    #[test]
    fn in_degree_counts_incoming_edges() {
        let graph = diamond();
        let degrees = graph.in_degree();
        assert_eq!(degrees["a"], 0);
        assert_eq!(degrees["b"], 1);
        assert_eq!(degrees["d"], 2);
    }

    #[test]
    fn adjacency_preserves_insertion_order() {
        let graph = diamond();
        let adjacency = graph.adjacency();

        let targets: Vec<&str> = adjacency["a"].iter().map(|(_, t)| t.as_str()).collect();
        assert_eq!(targets, vec!["b", "c"]);
        assert!(adjacency["d"].is_empty());
    }

    #[test]
    fn source_nodes_in_declaration_order() {
        let graph = WorkflowGraph::build(
            vec![node("z"), node("y"), node("x")],
            vec![Edge::between("z", "x")],
        )
        .unwrap();
        let sources: Vec<&str> = graph.source_nodes().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(sources, vec!["z", "y"]);
    }

    #[test]
    fn predecessors_follow_edge_order() {
        let graph = diamond();
        let preds: Vec<&str> = graph
            .predecessors("d")
            .iter()
            .map(|(n, _)| n.id.as_str())
            .collect();
        assert_eq!(preds, vec!["b", "c"]);
        assert!(graph.predecessors("unknown").is_empty());
    }

    #[test]
    fn position_follows_declaration() {
        let graph = diamond();
        assert_eq!(graph.position_of("a"), Some(0));
        assert_eq!(graph.position_of("d"), Some(3));
        assert_eq!(graph.position_of("nope"), None);
    }

    #[test]
    fn graph_serde_roundtrip() {
        let graph = diamond();
        let json = serde_json::to_value(&graph).expect("serialize");
        assert_eq!(json["nodes"].as_array().map(Vec::len), Some(4));

        let parsed: WorkflowGraph = serde_json::from_value(json).expect("deserialize");
        assert_eq!(parsed.node_count(), 4);
        assert_eq!(parsed.edge_count(), 4);
        assert!(parsed.contains("c"));
    }

    #[test]
    fn deserialize_validates() {
        let result: Result<WorkflowGraph, _> = serde_json::from_value(json!({
            "nodes": [{"id": "a", "type": "input"}],
            "edges": [{"id": "e", "source": "a", "target": "b"}]
        }));
        assert!(result.is_err());
    }
}
