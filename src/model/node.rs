//! Node kinds: encoded payloads and materialized objects
//!
//! The set of node kinds is closed. A payload is the wire form of one node,
//! carrying the `NodeId`s of its dependencies; a materialized [`Node`] holds
//! strong `Rc` references to the dependencies those ids resolved to, so a
//! registered parent keeps its children's objects alive.

use super::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// Type tag for node kinds; doubles as the leading hash tag byte
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Shader,
    Buffer,
    Pipeline,
    Composite,
}

impl NodeKind {
    pub fn as_byte(&self) -> u8 {
        match self {
            NodeKind::Shader => 0,
            NodeKind::Buffer => 1,
            NodeKind::Pipeline => 2,
            NodeKind::Composite => 3,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Shader => "shader",
            NodeKind::Buffer => "buffer",
            NodeKind::Pipeline => "pipeline",
            NodeKind::Composite => "composite",
        };
        write!(f, "{}", name)
    }
}

/// Pipeline slot a shader is compiled for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn as_byte(&self) -> u8 {
        match self {
            ShaderStage::Vertex => 0,
            ShaderStage::Fragment => 1,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

/// Encoded form of one node, with dependencies as embedded ids
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum NodePayload {
    Shader {
        stage: ShaderStage,
        source: String,
    },
    Buffer {
        data: Vec<u8>,
        stride: u32,
    },
    Pipeline {
        vertex: NodeId,
        fragment: NodeId,
    },
    Composite {
        children: Vec<NodeId>,
    },
}

impl NodePayload {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodePayload::Shader { .. } => NodeKind::Shader,
            NodePayload::Buffer { .. } => NodeKind::Buffer,
            NodePayload::Pipeline { .. } => NodeKind::Pipeline,
            NodePayload::Composite { .. } => NodeKind::Composite,
        }
    }
}

/// A materialized shader
#[derive(Debug)]
pub struct Shader {
    pub stage: ShaderStage,
    pub source: String,
}

/// A materialized data buffer
#[derive(Debug)]
pub struct Buffer {
    pub data: Vec<u8>,
    pub stride: u32,
}

impl Buffer {
    /// Number of stride-sized elements in the buffer
    pub fn len(&self) -> usize {
        self.data.len() / self.stride as usize
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A materialized pipeline; holds its two shader stages alive
#[derive(Debug)]
pub struct Pipeline {
    pub vertex: Rc<Node>,
    pub fragment: Rc<Node>,
}

/// A materialized composite; holds its children alive, in order
#[derive(Debug)]
pub struct Composite {
    pub children: Vec<Rc<Node>>,
}

/// A materialized node of one of the closed kinds
#[derive(Debug)]
pub enum Node {
    Shader(Shader),
    Buffer(Buffer),
    Pipeline(Pipeline),
    Composite(Composite),
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Shader(_) => NodeKind::Shader,
            Node::Buffer(_) => NodeKind::Buffer,
            Node::Pipeline(_) => NodeKind::Pipeline,
            Node::Composite(_) => NodeKind::Composite,
        }
    }

    pub fn as_shader(&self) -> Option<&Shader> {
        match self {
            Node::Shader(shader) => Some(shader),
            _ => None,
        }
    }

    pub fn as_buffer(&self) -> Option<&Buffer> {
        match self {
            Node::Buffer(buffer) => Some(buffer),
            _ => None,
        }
    }
}
