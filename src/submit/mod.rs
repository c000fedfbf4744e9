//! Producer-side get-or-make submission
//!
//! A [`Blueprint`] is the producer's description of a node graph before
//! anything is encoded or materialized. Shared subtrees are expressed by
//! sharing `Rc<Blueprint>`s. [`submit_graph`] walks a blueprint bottom-up
//! and, for every node, checks the registry by content identity before
//! encoding and submitting — logically identical content is materialized
//! at most once, no matter how many times or from how many blueprints it
//! is submitted.

use crate::materialize::Materializer;
use crate::model::{ContentHasher, NodeId, NodeKind, NodePayload, ShaderStage};
use crate::registry::{Handle, Registry};
use crate::Result;
use std::cell::OnceCell;
use std::rc::Rc;

/// Description of one node and, through `Rc` children, of the whole graph
/// below it.
pub struct Blueprint {
    kind: BlueprintKind,
    /// Content identity, computed on first use
    id: OnceCell<NodeId>,
}

enum BlueprintKind {
    Shader {
        stage: ShaderStage,
        source: String,
    },
    Buffer {
        data: Vec<u8>,
        stride: u32,
    },
    Pipeline {
        vertex: Rc<Blueprint>,
        fragment: Rc<Blueprint>,
    },
    Composite {
        children: Vec<Rc<Blueprint>>,
    },
}

impl Blueprint {
    pub fn shader(stage: ShaderStage, source: impl Into<String>) -> Rc<Self> {
        Rc::new(Blueprint {
            kind: BlueprintKind::Shader {
                stage,
                source: source.into(),
            },
            id: OnceCell::new(),
        })
    }

    pub fn buffer(data: Vec<u8>, stride: u32) -> Rc<Self> {
        Rc::new(Blueprint {
            kind: BlueprintKind::Buffer { data, stride },
            id: OnceCell::new(),
        })
    }

    pub fn pipeline(vertex: Rc<Blueprint>, fragment: Rc<Blueprint>) -> Rc<Self> {
        Rc::new(Blueprint {
            kind: BlueprintKind::Pipeline { vertex, fragment },
            id: OnceCell::new(),
        })
    }

    pub fn composite(children: Vec<Rc<Blueprint>>) -> Rc<Self> {
        Rc::new(Blueprint {
            kind: BlueprintKind::Composite { children },
            id: OnceCell::new(),
        })
    }

    /// This node's content identity: kind tag, own fields, then child
    /// identities, folded in fixed order. Memoized per blueprint node, so
    /// a shared subtree is hashed once.
    pub fn content_id(&self) -> NodeId {
        *self.id.get_or_init(|| {
            let mut hasher = ContentHasher::new();
            match &self.kind {
                BlueprintKind::Shader { stage, source } => {
                    hasher.add_tag(NodeKind::Shader.as_byte());
                    hasher.add_tag(stage.as_byte());
                    hasher.add_str(source);
                }
                BlueprintKind::Buffer { data, stride } => {
                    hasher.add_tag(NodeKind::Buffer.as_byte());
                    hasher.add_u32(*stride);
                    hasher.add_bytes(data);
                }
                BlueprintKind::Pipeline { vertex, fragment } => {
                    hasher.add_tag(NodeKind::Pipeline.as_byte());
                    hasher.add_id(vertex.content_id());
                    hasher.add_id(fragment.content_id());
                }
                BlueprintKind::Composite { children } => {
                    hasher.add_tag(NodeKind::Composite.as_byte());
                    for child in children {
                        hasher.add_id(child.content_id());
                    }
                }
            }
            hasher.finish()
        })
    }

    /// Direct children, in the order their ids are embedded in the payload
    pub fn children(&self) -> Vec<&Rc<Blueprint>> {
        match &self.kind {
            BlueprintKind::Shader { .. } | BlueprintKind::Buffer { .. } => Vec::new(),
            BlueprintKind::Pipeline { vertex, fragment } => vec![vertex, fragment],
            BlueprintKind::Composite { children } => children.iter().collect(),
        }
    }

    /// Encode this node's payload, embedding child content ids
    pub fn encode_payload(&self) -> Result<Vec<u8>> {
        let payload = match &self.kind {
            BlueprintKind::Shader { stage, source } => NodePayload::Shader {
                stage: *stage,
                source: source.clone(),
            },
            BlueprintKind::Buffer { data, stride } => NodePayload::Buffer {
                data: data.clone(),
                stride: *stride,
            },
            BlueprintKind::Pipeline { vertex, fragment } => NodePayload::Pipeline {
                vertex: vertex.content_id(),
                fragment: fragment.content_id(),
            },
            BlueprintKind::Composite { children } => NodePayload::Composite {
                children: children.iter().map(|child| child.content_id()).collect(),
            },
        };
        Ok(bincode::serialize(&payload)?)
    }
}

/// Submit a blueprint graph bottom-up, reusing every node the registry
/// already holds. Returns a handle on the root with one external
/// reference; interior nodes end up held only by their dependents.
pub fn submit_graph<M: Materializer>(
    registry: &mut Registry<M>,
    blueprint: &Blueprint,
) -> Result<Handle> {
    let mut child_handles = Vec::new();
    for child in blueprint.children() {
        match submit_graph(registry, child) {
            Ok(handle) => child_handles.push(handle),
            Err(err) => {
                // Drop the claims taken so far; the children stay
                // registered until a collection pass decides otherwise.
                for handle in child_handles {
                    registry.release(handle);
                }
                return Err(err);
            }
        }
    }

    let result = get_or_submit(registry, blueprint);

    // The parent now holds its children structurally (or failed to
    // materialize); either way the temporary external claims go away.
    for handle in child_handles {
        registry.release(handle);
    }
    result
}

fn get_or_submit<M: Materializer>(
    registry: &mut Registry<M>,
    blueprint: &Blueprint,
) -> Result<Handle> {
    let id = blueprint.content_id();
    if let Some(handle) = registry.try_acquire(id) {
        return Ok(handle);
    }
    let payload = blueprint.encode_payload()?;
    registry.submit(id, &payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materialize::TreeMaterializer;

    fn sample_pipeline() -> Rc<Blueprint> {
        let vertex = Blueprint::shader(ShaderStage::Vertex, "void main() { v(); }");
        let fragment = Blueprint::shader(ShaderStage::Fragment, "void main() { f(); }");
        Blueprint::pipeline(vertex, fragment)
    }

    #[test]
    fn test_content_id_is_memoized_and_stable() {
        let pipeline = sample_pipeline();
        assert_eq!(pipeline.content_id(), pipeline.content_id());
        // An independently built identical description hashes the same.
        assert_eq!(pipeline.content_id(), sample_pipeline().content_id());
    }

    #[test]
    fn test_submit_graph_registers_whole_tree() {
        let mut registry = Registry::new(TreeMaterializer::new());
        let pipeline = sample_pipeline();

        let root = submit_graph(&mut registry, &pipeline).unwrap();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.external_count(root.id()), Some(1));
        // Shaders are held by the pipeline, not externally.
        for child in pipeline.children() {
            let id = child.content_id();
            assert_eq!(registry.external_count(id), Some(0));
            assert_eq!(registry.internal_alias_count(id), Some(1));
        }
    }

    #[test]
    fn test_resubmission_parses_nothing() {
        let mut registry = Registry::new(TreeMaterializer::new());
        let first = submit_graph(&mut registry, &sample_pipeline()).unwrap();
        assert_eq!(registry.materializer().parsed(), 3);

        let second = submit_graph(&mut registry, &sample_pipeline()).unwrap();
        assert_eq!(second, first);
        assert_eq!(registry.materializer().parsed(), 3);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.external_count(first.id()), Some(2));
    }

    #[test]
    fn test_shared_subtree_submitted_once() {
        let mut registry = Registry::new(TreeMaterializer::new());
        let vertex = Blueprint::shader(ShaderStage::Vertex, "void main() { v(); }");
        let fragment_a = Blueprint::shader(ShaderStage::Fragment, "void main() { a(); }");
        let fragment_b = Blueprint::shader(ShaderStage::Fragment, "void main() { b(); }");
        let scene = Blueprint::composite(vec![
            Blueprint::pipeline(Rc::clone(&vertex), fragment_a),
            Blueprint::pipeline(Rc::clone(&vertex), fragment_b),
        ]);

        submit_graph(&mut registry, &scene).unwrap();
        // vertex, two fragments, two pipelines, composite
        assert_eq!(registry.len(), 6);
        assert_eq!(registry.internal_alias_count(vertex.content_id()), Some(2));
    }

    #[test]
    fn test_failed_parent_releases_child_claims() {
        let mut registry = Registry::new(TreeMaterializer::new());
        // Two vertex shaders: the fragment slot will reject the stage.
        let vertex_a = Blueprint::shader(ShaderStage::Vertex, "void main() { a(); }");
        let vertex_b = Blueprint::shader(ShaderStage::Vertex, "void main() { b(); }");
        let broken = Blueprint::pipeline(Rc::clone(&vertex_a), Rc::clone(&vertex_b));

        submit_graph(&mut registry, &broken).unwrap_err();
        assert!(registry.last_error().is_some());
        // The shaders were registered, but no claim on them survives.
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.external_count(vertex_a.content_id()), Some(0));
        assert_eq!(registry.external_count(vertex_b.content_id()), Some(0));
        // The next checkpoint sweeps them.
        assert_eq!(registry.collect(), 2);
        assert!(registry.is_empty());
    }
}
