//! Registry lifecycle tests
//!
//! End-to-end coverage of the registry's observable guarantees: content
//! identities are deterministic, identical content is materialized once,
//! collection never reclaims anything still referenced, and chains of
//! garbage drain one level per pass.

use std::rc::Rc;
use tessera::{
    submit_graph, Blueprint, ContentHasher, NodeId, NodeKind, NodePayload, Registry, ShaderStage,
    TreeMaterializer,
};

fn registry() -> Registry<TreeMaterializer> {
    Registry::new(TreeMaterializer::new())
}

/// Hash and encode a leaf buffer payload the way a producer would
fn buffer_payload(data: &[u8], stride: u32) -> (NodeId, Vec<u8>) {
    let mut hasher = ContentHasher::new();
    hasher.add_tag(NodeKind::Buffer.as_byte());
    hasher.add_u32(stride);
    hasher.add_bytes(data);
    let payload = NodePayload::Buffer {
        data: data.to_vec(),
        stride,
    };
    (hasher.finish(), bincode::serialize(&payload).unwrap())
}

/// Hash and encode a composite over already-known child ids
fn composite_payload(children: &[NodeId]) -> (NodeId, Vec<u8>) {
    let mut hasher = ContentHasher::new();
    hasher.add_tag(NodeKind::Composite.as_byte());
    for child in children {
        hasher.add_id(*child);
    }
    let payload = NodePayload::Composite {
        children: children.to_vec(),
    };
    (hasher.finish(), bincode::serialize(&payload).unwrap())
}

// ============================================================================
// Hashing
// ============================================================================

#[test]
fn test_identity_is_deterministic() {
    let (id_a, _) = buffer_payload(b"vertex data", 1);
    let (id_b, _) = buffer_payload(b"vertex data", 1);
    assert_eq!(id_a, id_b);

    let (other, _) = buffer_payload(b"vertex data!", 1);
    assert_ne!(id_a, other);
}

#[test]
fn test_blueprint_identity_matches_across_builds() {
    let build = || {
        Blueprint::pipeline(
            Blueprint::shader(ShaderStage::Vertex, "void main() { v(); }"),
            Blueprint::shader(ShaderStage::Fragment, "void main() { f(); }"),
        )
    };
    assert_eq!(build().content_id(), build().content_id());
}

// ============================================================================
// Deduplication
// ============================================================================

#[test]
fn test_identical_content_materialized_once() {
    let mut registry = registry();
    let scene = || {
        Blueprint::composite(vec![Blueprint::pipeline(
            Blueprint::shader(ShaderStage::Vertex, "void main() { v(); }"),
            Blueprint::shader(ShaderStage::Fragment, "void main() { f(); }"),
        )])
    };

    let first = submit_graph(&mut registry, &scene()).unwrap();
    let parsed_after_first = registry.materializer().parsed();
    let second = submit_graph(&mut registry, &scene()).unwrap();

    assert_eq!(first.id(), second.id());
    // The second pass hit try_acquire for every node; nothing was parsed.
    assert_eq!(registry.materializer().parsed(), parsed_after_first);
    assert_eq!(registry.len(), 4);
    assert_eq!(registry.external_count(first.id()), Some(2));
}

// ============================================================================
// Collection
// ============================================================================

#[test]
fn test_collect_never_removes_externally_held_entries() {
    let mut registry = registry();
    let (id, payload) = buffer_payload(b"held", 1);
    registry.submit(id, &payload).unwrap();

    for _ in 0..3 {
        assert_eq!(registry.collect(), 0);
        assert!(registry.contains(id));
    }
}

#[test]
fn test_parent_keeps_child_alive() {
    let mut registry = registry();
    let (leaf_id, leaf_payload) = buffer_payload(b"leaf", 1);
    let leaf = registry.submit(leaf_id, &leaf_payload).unwrap();

    let (parent_id, parent_payload) = composite_payload(&[leaf_id]);
    registry.submit(parent_id, &parent_payload).unwrap();

    registry.release(leaf);
    assert_eq!(registry.external_count(leaf_id), Some(0));

    // Parent is externally held and aliases the leaf: nothing to collect.
    assert_eq!(registry.collect(), 0);
    assert!(registry.contains(leaf_id));
    assert!(registry.contains(parent_id));
}

#[test]
fn test_chain_reclaimed_one_level_per_pass() {
    let mut registry = registry();
    let (leaf_id, leaf_payload) = buffer_payload(b"leaf", 1);
    let leaf = registry.submit(leaf_id, &leaf_payload).unwrap();
    let (parent_id, parent_payload) = composite_payload(&[leaf_id]);
    let parent = registry.submit(parent_id, &parent_payload).unwrap();

    registry.release(leaf);
    registry.release(parent);

    // First pass removes the parent; the leaf still carried its alias at
    // classification time.
    assert_eq!(registry.collect(), 1);
    assert!(!registry.contains(parent_id));
    assert!(registry.contains(leaf_id));

    // Second pass removes the now-unaliased leaf.
    assert_eq!(registry.collect(), 1);
    assert!(registry.is_empty());
    assert_eq!(registry.materializer().released(), 2);
}

#[test]
fn test_diamond_dependencies_reclaim_fully() {
    let mut registry = registry();
    // Two distinct composites sharing one leaf, under a single root.
    let leaf = Blueprint::buffer(b"shared".to_vec(), 1);
    let left = Blueprint::composite(vec![Rc::clone(&leaf), Blueprint::buffer(vec![1], 1)]);
    let right = Blueprint::composite(vec![Rc::clone(&leaf), Blueprint::buffer(vec![2], 1)]);
    let root = Blueprint::composite(vec![left, right]);

    let handle = submit_graph(&mut registry, &root).unwrap();
    assert_eq!(registry.len(), 6);
    assert_eq!(registry.internal_alias_count(leaf.content_id()), Some(2));

    registry.release(handle);
    assert_eq!(registry.collect(), 1); // root
    assert_eq!(registry.collect(), 2); // both mid composites
    assert_eq!(registry.collect(), 3); // shared leaf and the two unique buffers
    assert!(registry.is_empty());
    assert_eq!(registry.materializer().released(), 6);
}

// ============================================================================
// Failure semantics
// ============================================================================

#[test]
fn test_failed_submit_is_fail_closed() {
    let mut registry = registry();
    let (good_id, good_payload) = buffer_payload(b"ok", 1);
    registry.submit(good_id, &good_payload).unwrap();

    let (bad_id, bad_payload) = buffer_payload(b"12345", 2); // stride mismatch
    let err = registry.submit(bad_id, &bad_payload).unwrap_err();

    assert_eq!(registry.len(), 1);
    assert!(registry.contains(good_id));
    assert!(!registry.contains(bad_id));
    let message = registry.last_error().unwrap();
    assert!(!message.is_empty());
    assert_eq!(message, err.to_string());
}

#[test]
fn test_last_error_survives_reads_until_next_submit() {
    let mut registry = registry();
    let (id, _) = buffer_payload(b"x", 1);
    registry.submit(id, b"\xff\xff garbage").unwrap_err();

    assert!(registry.last_error().is_some());
    assert!(registry.last_error().is_some());

    let (good_id, good_payload) = buffer_payload(b"x", 1);
    registry.submit(good_id, &good_payload).unwrap();
    assert!(registry.last_error().is_none());
}

// ============================================================================
// Scenarios
// ============================================================================

/// Scenario A: a leaf outlives its releases until a checkpoint collects it
#[test]
fn test_leaf_lifecycle() {
    let mut registry = registry();
    let (id, payload) = buffer_payload(b"leaf", 4);
    let handle = registry.submit(id, &payload).unwrap();

    let reacquired = registry.try_acquire(id).unwrap();
    registry.release(handle);
    registry.release(reacquired);

    // Released but not collected: still acquirable.
    let held = registry.try_acquire(id).unwrap();
    registry.release(held);

    registry.collect();
    assert!(registry.try_acquire(id).is_none());
}

/// Scenario B: parent/child survival and staged reclamation
#[test]
fn test_parent_child_staged_reclamation() {
    let mut registry = registry();
    let (leaf_id, leaf_payload) = buffer_payload(b"child", 1);
    let leaf = registry.submit(leaf_id, &leaf_payload).unwrap();
    let (parent_id, parent_payload) = composite_payload(&[leaf_id]);
    let parent = registry.submit(parent_id, &parent_payload).unwrap();
    registry.release(leaf);

    // Parent still externally held: both survive.
    assert_eq!(registry.collect(), 0);
    assert!(registry.contains(parent_id));
    assert!(registry.contains(leaf_id));

    registry.release(parent);
    assert_eq!(registry.collect(), 1);
    assert!(!registry.contains(parent_id));
    assert_eq!(registry.collect(), 1);
    assert!(!registry.contains(leaf_id));
}

/// Scenario C: duplicate submission is a contract violation, not an error
#[test]
#[should_panic(expected = "duplicate submit")]
fn test_duplicate_submit_is_fatal() {
    let mut registry = registry();
    let (id, payload) = buffer_payload(b"dup", 1);
    registry.submit(id, &payload).unwrap();
    let _ = registry.submit(id, &payload);
}
