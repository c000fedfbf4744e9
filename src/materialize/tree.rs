//! Built-in materializer for the closed node kinds
//!
//! Decodes bincode [`NodePayload`]s into in-memory [`Node`]s. A real
//! rendering backend would compile shaders and upload buffers here; this
//! materializer only validates and links, which is all the registry core
//! needs and keeps the crate testable without a GPU.

use super::{Materializer, ParseOutput, Resolver};
use crate::model::{
    Buffer, Composite, Node, NodeId, NodeKind, NodePayload, Pipeline, Shader, ShaderStage,
};
use crate::{Error, Result};
use std::rc::Rc;

/// Materializer producing plain in-memory [`Node`] objects.
pub struct TreeMaterializer {
    parsed: u64,
    released: u64,
}

impl TreeMaterializer {
    pub fn new() -> Self {
        TreeMaterializer {
            parsed: 0,
            released: 0,
        }
    }

    /// Number of payloads successfully materialized
    pub fn parsed(&self) -> u64 {
        self.parsed
    }

    /// Number of objects torn down by collection passes
    pub fn released(&self) -> u64 {
        self.released
    }
}

impl Default for TreeMaterializer {
    fn default() -> Self {
        TreeMaterializer::new()
    }
}

/// Resolve a pipeline slot: the dependency must be a shader compiled for
/// the expected stage.
fn resolve_shader(deps: &Resolver<'_, Node>, id: NodeId, stage: ShaderStage) -> Result<Rc<Node>> {
    let node = deps.resolve(id);
    let shader = node.as_shader().ok_or(Error::WrongKind {
        id,
        expected: NodeKind::Shader,
        found: node.kind(),
    })?;
    if shader.stage != stage {
        return Err(Error::MalformedNode(format!(
            "{} slot of pipeline holds a {} shader ({id})",
            stage, shader.stage
        )));
    }
    Ok(node)
}

impl Materializer for TreeMaterializer {
    type Object = Node;

    fn parse(&mut self, deps: &Resolver<'_, Node>, payload: &[u8]) -> Result<ParseOutput<Node>> {
        let payload: NodePayload = bincode::deserialize(payload)?;
        let output = match payload {
            NodePayload::Shader { stage, source } => {
                if source.trim().is_empty() {
                    return Err(Error::MalformedNode("shader source is empty".into()));
                }
                ParseOutput::leaf(Rc::new(Node::Shader(Shader { stage, source })))
            }
            NodePayload::Buffer { data, stride } => {
                if stride == 0 {
                    return Err(Error::MalformedNode("buffer stride is zero".into()));
                }
                if data.len() % stride as usize != 0 {
                    return Err(Error::MalformedNode(format!(
                        "buffer length {} is not a multiple of stride {}",
                        data.len(),
                        stride
                    )));
                }
                ParseOutput::leaf(Rc::new(Node::Buffer(Buffer { data, stride })))
            }
            NodePayload::Pipeline { vertex, fragment } => {
                let vertex_node = resolve_shader(deps, vertex, ShaderStage::Vertex)?;
                let fragment_node = resolve_shader(deps, fragment, ShaderStage::Fragment)?;
                ParseOutput::with_dependencies(
                    Rc::new(Node::Pipeline(Pipeline {
                        vertex: vertex_node,
                        fragment: fragment_node,
                    })),
                    vec![vertex, fragment],
                )
            }
            NodePayload::Composite { children } => {
                let resolved = children.iter().map(|id| deps.resolve(*id)).collect();
                ParseOutput::with_dependencies(
                    Rc::new(Node::Composite(Composite { children: resolved })),
                    children,
                )
            }
        };
        self.parsed += 1;
        Ok(output)
    }

    fn release(&mut self, batch: Vec<Rc<Node>>) {
        self.released += batch.len() as u64;
        log::debug!("releasing {} materialized nodes", batch.len());
        // In-memory nodes need no context-scoped teardown; dropping the
        // batch drops the last strong reference to each victim.
        drop(batch);
    }
}
