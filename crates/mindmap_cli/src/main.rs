//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `mindmap_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

use mindmap_core::{MindMapConfig, MindMapService};

fn main() {
    println!("mindmap_core ping={}", mindmap_core::ping());
    println!("mindmap_core version={}", mindmap_core::core_version());

    let service = MindMapService::new(MindMapConfig::default());
    match service.export_document() {
        Ok(document) => println!("{document}"),
        Err(err) => {
            eprintln!("mindmap_core export failed: {err}");
            std::process::exit(1);
        }
    }
}
