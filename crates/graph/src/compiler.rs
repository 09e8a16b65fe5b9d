use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexMap;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use prana_action::ActionRegistry;
use prana_core::NodeKey;
use prana_workflow::Workflow;

use crate::error::GraphError;
use crate::graph::{CompiledNode, ExecutionGraph};

/// Compile a declarative workflow into an [`ExecutionGraph`].
///
/// Validates, in order: structural well-formedness (duplicate keys,
/// unknown connection endpoints — delegated to
/// [`Workflow::validate_structure`]), exactly one trigger node, and that
/// every node's declared type resolves in `registry`. Node and port
/// iteration order in the result always matches the workflow's own
/// node order, so replays are deterministic.
///
/// # Errors
///
/// Returns the first [`GraphError`] encountered.
pub fn compile(workflow: &Workflow, registry: &ActionRegistry) -> Result<ExecutionGraph, GraphError> {
    workflow.validate_structure()?;

    let mut nodes: IndexMap<NodeKey, CompiledNode> = IndexMap::new();
    let mut trigger_keys = Vec::new();

    for node in &workflow.nodes {
        let descriptor = registry.resolve(&node.node_type).ok_or_else(|| GraphError::HandlerNotFound {
            node_key: node.key.as_str().to_owned(),
            node_type: node.node_type.clone(),
        })?;

        if descriptor.kind == prana_action::HandlerKind::Trigger {
            trigger_keys.push(node.key.clone());
        }

        let required_input_ports: Vec<String> = descriptor
            .input_ports
            .iter()
            .filter(|port| !node.optional_input_ports.contains(port))
            .cloned()
            .collect();

        nodes.insert(
            node.key.clone(),
            CompiledNode {
                key: node.key.clone(),
                node_type: node.node_type.clone(),
                params: node.params.clone(),
                retry: node.retry.clone(),
                loop_settings: node.loop_settings,
                kind: descriptor.kind,
                input_ports: descriptor.input_ports.clone(),
                output_ports: descriptor.output_ports.clone(),
                suspendable: descriptor.suspendable,
                required_input_ports,
                topological_rank: usize::MAX, // filled in below
            },
        );
    }

    if trigger_keys.len() != 1 {
        return Err(GraphError::InvalidTriggerCount {
            count: trigger_keys.len(),
        });
    }
    let trigger = trigger_keys.into_iter().next().expect("checked len == 1 above");

    let mut connection_map: HashMap<NodeKey, HashMap<String, Vec<prana_workflow::Connection>>> = HashMap::new();
    let mut reverse_connection_map: HashMap<NodeKey, Vec<(NodeKey, String, String)>> = HashMap::new();

    for (from_key_str, ports) in &workflow.connections {
        let from_key = nodes
            .get_key_value(&NodeKey::new(from_key_str).map_err(|_| GraphError::UnknownConnectionEndpoint {
                key: from_key_str.clone(),
            })?)
            .map(|(k, _)| k.clone())
            .ok_or_else(|| GraphError::UnknownConnectionEndpoint {
                key: from_key_str.clone(),
            })?;

        for (from_port, targets) in ports {
            connection_map
                .entry(from_key.clone())
                .or_default()
                .insert(from_port.clone(), targets.clone());

            for target in targets {
                reverse_connection_map.entry(target.to.clone()).or_default().push((
                    from_key.clone(),
                    from_port.clone(),
                    target.to_port.clone(),
                ));
            }
        }
    }

    assign_topological_ranks(&mut nodes, &connection_map, &trigger);

    Ok(ExecutionGraph {
        workflow_id: workflow.id,
        version: workflow.version,
        nodes,
        connection_map,
        reverse_connection_map,
        trigger,
        variables: workflow.variables.clone(),
    })
}

/// Depth-first traversal from the trigger, collapsing per-port detail
/// into plain node-to-node edges, assigns each node its discovery order.
/// Nodes unreachable from the trigger (orphans the compiler otherwise
/// accepts) are ranked after every reachable node, in workflow order.
fn assign_topological_ranks(
    nodes: &mut IndexMap<NodeKey, CompiledNode>,
    connection_map: &HashMap<NodeKey, HashMap<String, Vec<prana_workflow::Connection>>>,
    trigger: &NodeKey,
) {
    let mut graph: DiGraph<NodeKey, ()> = DiGraph::new();
    let mut index_of: HashMap<NodeKey, NodeIndex> = HashMap::new();
    for key in nodes.keys() {
        index_of.insert(key.clone(), graph.add_node(key.clone()));
    }
    for (from_key, ports) in connection_map {
        let Some(&from_idx) = index_of.get(from_key) else { continue };
        for targets in ports.values() {
            for target in targets {
                if let Some(&to_idx) = index_of.get(&target.to) {
                    graph.add_edge(from_idx, to_idx, ());
                }
            }
        }
    }

    let mut rank = 0usize;
    let mut visited: HashSet<NodeKey> = HashSet::new();
    if let Some(&start) = index_of.get(trigger) {
        let mut dfs = Dfs::new(&graph, start);
        while let Some(idx) = dfs.next(&graph) {
            let key = graph[idx].clone();
            if visited.insert(key.clone()) {
                if let Some(node) = nodes.get_mut(&key) {
                    node.topological_rank = rank;
                    rank += 1;
                }
            }
        }
    }

    for key in nodes.keys().cloned().collect::<VecDeque<_>>() {
        if !visited.contains(&key) {
            if let Some(node) = nodes.get_mut(&key) {
                node.topological_rank = rank;
                rank += 1;
            }
        }
    }
}
