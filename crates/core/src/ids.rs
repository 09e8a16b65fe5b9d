//! Strongly-typed identifiers shared across every Prana crate.
//!
//! Workflow and execution identifiers are random UUIDs; node keys are
//! author-chosen strings that must stay unique within a single workflow.
//! Keeping both behind [`domain-key`](https://crates.io/crates/domain-key)
//! wrappers means a `NodeKey` can never be passed where a `WorkflowId` is
//! expected, even though both ultimately wrap plain data.

pub use domain_key::KeyParseError;
use domain_key::{define_domain, define_uuid, key_type};

// UUID-backed identifiers — random per workflow/execution.
define_uuid!(WorkflowIdDomain => WorkflowId);
define_uuid!(ExecutionIdDomain => ExecutionId);

// String-backed identifier — author-chosen, unique within one workflow.
define_domain!(NodeKeyDomain, "node");
key_type!(NodeKey, NodeKeyDomain);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_and_execution_ids_are_distinct_types() {
        let w = WorkflowId::v4();
        let e = ExecutionId::v4();
        assert_ne!(w.to_string(), e.to_string());
    }

    #[test]
    fn node_key_roundtrips_through_string() {
        let key = NodeKey::new("fetch_user").unwrap();
        assert_eq!(key.as_str(), "fetch_user");
    }

    #[test]
    fn node_key_equality_is_value_based() {
        assert_eq!(NodeKey::new("a").unwrap(), NodeKey::new("a").unwrap());
        assert_ne!(NodeKey::new("a").unwrap(), NodeKey::new("b").unwrap());
    }
}
