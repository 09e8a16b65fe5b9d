//! Evaluation context — the exact shape handed to the evaluator and to
//! action handlers (see the data model's `$input`/`$nodes`/`$vars`/`$env`/
//! `$execution` mapping).

use std::collections::HashMap;

use serde_json::Value;

/// Per-node-output summary exposed under `$nodes.<key>`.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSnapshot {
    /// The node's emitted output, if it has completed at least once.
    pub output: Value,
    /// Last-observed status string (`"completed"`, `"failed"`, ...).
    pub status: String,
}

/// Execution-scoped counters exposed under `$execution`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionInfo {
    /// Zero-based count of this node's prior completed invocations.
    pub run_index: u32,
    /// One-based retry attempt number (1 on the first try).
    pub attempt_number: u32,
    /// Execution identifier, stringified.
    pub execution_id: String,
    /// Workflow identifier, stringified.
    pub workflow_id: String,
}

/// Evaluation context: `$input`, `$nodes`, `$vars`, `$env`, `$execution`.
///
/// Built fresh for every node invocation by the context builder; never
/// mutated by the evaluator itself.
#[derive(Debug, Clone)]
pub struct EvaluationContext {
    input: HashMap<String, Value>,
    nodes: HashMap<String, NodeSnapshot>,
    vars: HashMap<String, Value>,
    env: HashMap<String, Value>,
    execution: ExecutionInfo,
}

impl EvaluationContext {
    /// Build a context from its five constituent maps.
    #[must_use]
    pub fn new(
        input: HashMap<String, Value>,
        nodes: HashMap<String, NodeSnapshot>,
        vars: HashMap<String, Value>,
        env: HashMap<String, Value>,
        execution: ExecutionInfo,
    ) -> Self {
        Self {
            input,
            nodes,
            vars,
            env,
            execution,
        }
    }

    /// Resolve a root binding (`input`, `nodes`, `vars`, `env`, `execution`)
    /// to its JSON representation. Returns `None` for unknown roots.
    #[must_use]
    pub fn resolve_root(&self, root: &str) -> Option<Value> {
        match root {
            "input" => Some(Value::Object(
                self.input
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            )),
            "nodes" => {
                let mut map = serde_json::Map::new();
                for (key, snap) in &self.nodes {
                    map.insert(
                        key.clone(),
                        serde_json::json!({
                            "output": snap.output,
                            "status": snap.status,
                        }),
                    );
                }
                Some(Value::Object(map))
            }
            "vars" => Some(Value::Object(
                self.vars.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            )),
            "env" => Some(Value::Object(
                self.env.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            )),
            "execution" => Some(serde_json::json!({
                "run_index": self.execution.run_index,
                "attempt_number": self.execution.attempt_number,
                "execution_id": self.execution.execution_id,
                "workflow_id": self.execution.workflow_id,
            })),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EvaluationContext {
        let mut input = HashMap::new();
        input.insert("age".to_owned(), serde_json::json!(20));
        let mut nodes = HashMap::new();
        nodes.insert(
            "a".to_owned(),
            NodeSnapshot {
                output: serde_json::json!({"x": 1}),
                status: "completed".to_owned(),
            },
        );
        EvaluationContext::new(
            input,
            nodes,
            HashMap::new(),
            HashMap::new(),
            ExecutionInfo {
                run_index: 0,
                attempt_number: 1,
                execution_id: "e1".to_owned(),
                workflow_id: "w1".to_owned(),
            },
        )
    }

    #[test]
    fn resolves_input_root() {
        let ctx = sample();
        assert_eq!(ctx.resolve_root("input"), Some(serde_json::json!({"age": 20})));
    }

    #[test]
    fn resolves_nodes_root() {
        let ctx = sample();
        let nodes = ctx.resolve_root("nodes").unwrap();
        assert_eq!(nodes["a"]["status"], "completed");
        assert_eq!(nodes["a"]["output"]["x"], 1);
    }

    #[test]
    fn resolves_execution_root() {
        let ctx = sample();
        let exec = ctx.resolve_root("execution").unwrap();
        assert_eq!(exec["run_index"], 0);
        assert_eq!(exec["attempt_number"], 1);
    }

    #[test]
    fn unknown_root_is_none() {
        assert!(sample().resolve_root("bogus").is_none());
    }
}
