//! tessera CLI - frame-loop demo for the node registry
//!
//! Plays the role of the external collaborator: it submits a small scene
//! graph once per frame, releases its claim on the root, and runs a
//! collection pass as the per-frame checkpoint. Frame-constant subtrees
//! (shaders, pipeline) are deduplicated across frames; the per-frame
//! buffer node churns and gets reclaimed a couple of checkpoints later.

use anyhow::Result;
use clap::Parser;
use std::rc::Rc;
use tessera::{submit_graph, Blueprint, Registry, ShaderStage, TreeMaterializer};

#[derive(Parser)]
#[command(name = "tessera")]
#[command(about = "Content-addressed node registry demo")]
#[command(version)]
struct Cli {
    /// Number of frames to submit
    #[arg(short, long, default_value_t = 4)]
    frames: u32,
}

/// One frame's scene: a shared pipeline plus a buffer that varies per frame
fn scene(frame: u32) -> Rc<Blueprint> {
    let vertex = Blueprint::shader(
        ShaderStage::Vertex,
        "attribute vec2 pos; void main() { gl_Position = vec4(pos, 0.0, 1.0); }",
    );
    let fragment = Blueprint::shader(
        ShaderStage::Fragment,
        "void main() { gl_FragColor = vec4(1.0); }",
    );
    let pipeline = Blueprint::pipeline(vertex, fragment);

    let mut data = Vec::with_capacity(32);
    for i in 0u32..8 {
        data.extend((frame * 8 + i).to_le_bytes());
    }
    let buffer = Blueprint::buffer(data, 4);

    Blueprint::composite(vec![pipeline, buffer])
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut registry = Registry::new(TreeMaterializer::new());

    for frame in 0..cli.frames {
        let root = submit_graph(&mut registry, &scene(frame))?;
        println!(
            "frame {frame}: root {} ({} entries, {} parsed so far)",
            root.id(),
            registry.len(),
            registry.materializer().parsed()
        );

        registry.release(root);
        let collected = registry.collect();
        println!("  checkpoint: collected {collected}, {} entries remain", registry.len());
    }

    // Drain what the per-frame passes left behind; each pass unlocks the
    // next level of whatever chains are still dangling.
    let mut passes = 0;
    while registry.collect() > 0 {
        passes += 1;
    }
    println!(
        "drained in {passes} extra passes: {} entries remain, {} objects released total",
        registry.len(),
        registry.materializer().released()
    );

    Ok(())
}
