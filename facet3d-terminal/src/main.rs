//! facet3d - covers a mesh with pyramids, one per face, and shows it in the terminal.
//!
//! Controls:
//!   - WASD / Arrow Keys: Rotate
//!   - O: Toggle perspective / orthographic
//!   - Q/ESC: Quit

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use facet3d_core::{
    align_mesh, stl, AlignConfig, IndexedMesh, InstanceBuffers, InstancingConfig, TriangleAligner,
};
use facet3d_terminal::{Scene, TerminalApp};
use log::info;

#[derive(Parser)]
#[command(name = "facet3d", about = "Cover a mesh with per-face pyramid instances")]
struct Cli {
    /// STL file to load (binary or ASCII); a built-in octahedron when omitted
    path: Option<PathBuf>,

    /// JSON file with alignment settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pyramid apex height; defaults to a quarter of the mesh radius
    #[arg(long)]
    height: Option<f64>,

    /// Print batch statistics instead of opening the viewer
    #[arg(long)]
    summary: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str::<AlignConfig>(&text)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => AlignConfig::default(),
    };

    let mesh = match &cli.path {
        Some(path) => {
            info!("loading STL file: {}", path.display());
            let data = fs::read(path)
                .with_context(|| format!("failed to read STL file {}", path.display()))?;
            stl::parse_stl(&data).with_context(|| format!("failed to parse {}", path.display()))?
        }
        None => IndexedMesh::octahedron(1.0),
    };
    mesh.validate()?;

    let aligner = TriangleAligner::try_new(config).context("invalid alignment settings")?;

    if cli.summary {
        print_summary(&mesh, &aligner);
        return Ok(());
    }

    let height = cli.height.unwrap_or_else(|| default_height(&mesh));
    let scene = Scene::new(mesh, &aligner, &InstancingConfig { height });

    let mut app = TerminalApp::new(scene, height)?;
    app.run()?;
    Ok(())
}

fn default_height(mesh: &IndexedMesh) -> f64 {
    let radius = mesh
        .vertices
        .iter()
        .map(|v| v.coords.norm())
        .fold(0.0, f64::max);
    (radius * 0.25).max(1e-3)
}

fn print_summary(mesh: &IndexedMesh, aligner: &TriangleAligner) {
    let report = align_mesh(mesh, aligner);
    let buffers = InstanceBuffers::from_report(&report, mesh);

    println!("faces:       {}", mesh.face_count());
    println!("vertices:    {}", mesh.vertices.len());
    println!("aligned:     {}", report.succeeded());
    println!("substituted: {}", report.failures.len());
    println!(
        "buffers:     4 x {} column floats, {} normal floats",
        buffers.col0.len(),
        buffers.normals.len()
    );
    for (face, failure) in report.failures.iter().take(10) {
        println!("  face {face}: {failure}");
    }
    if report.failures.len() > 10 {
        println!("  ... {} more", report.failures.len() - 10);
    }
}
