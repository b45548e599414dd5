/// Command-line inspection of STL files
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use nalgebra::Point3;
use stlmesh_core::{detect_format, Mesh, StlFormat, StlLoader};

/// Which decoder to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Probe the file and pick a decoder
    Auto,
    Binary,
    Ascii,
}

#[derive(Debug, Parser)]
#[command(name = "stlmesh")]
#[command(about = "Decode STL files and report mesh statistics")]
#[command(version)]
pub struct Cli {
    /// STL files to load
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Decoder to use
    #[arg(long, value_enum, default_value_t = FormatArg::Auto)]
    pub format: FormatArg,

    /// Return the dedup map's memory after each file
    #[arg(long)]
    pub release: bool,

    /// Log decoder progress at debug level
    #[arg(short, long)]
    pub verbose: bool,
}

/// What gets printed for one loaded file
#[derive(Debug, Clone, PartialEq)]
pub struct MeshSummary {
    pub path: PathBuf,
    pub format: StlFormat,
    pub triangles: usize,
    pub points: usize,
    pub bounds: Option<(Point3<f32>, Point3<f32>)>,
}

impl MeshSummary {
    pub fn new(path: &Path, format: StlFormat, mesh: &Mesh) -> Self {
        Self {
            path: path.to_path_buf(),
            format,
            triangles: mesh.triangle_count(),
            points: mesh.point_count(),
            bounds: mesh.bounds(),
        }
    }
}

impl fmt::Display for MeshSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let format = match self.format {
            StlFormat::Binary => "binary",
            StlFormat::Ascii => "ascii",
        };
        write!(
            f,
            "{}: {} STL, {} triangles, {} unique points",
            self.path.display(),
            format,
            self.triangles,
            self.points
        )?;
        if let Some((min, max)) = self.bounds {
            let size = max - min;
            write!(
                f,
                ", bounds [{:.3}, {:.3}, {:.3}] to [{:.3}, {:.3}, {:.3}] ({:.3} x {:.3} x {:.3})",
                min.x, min.y, min.z, max.x, max.y, max.z, size.x, size.y, size.z
            )?;
        }
        Ok(())
    }
}

/// Load one file with the requested decoder
pub fn inspect(loader: &mut StlLoader, path: &Path, format: FormatArg) -> Result<MeshSummary> {
    let format = match format {
        FormatArg::Auto => detect_format(path)?,
        FormatArg::Binary => StlFormat::Binary,
        FormatArg::Ascii => StlFormat::Ascii,
    };
    let mesh = match format {
        StlFormat::Binary => loader.load_binary(path),
        StlFormat::Ascii => loader.load_ascii(path),
    }
    .with_context(|| format!("failed to load {}", path.display()))?;

    Ok(MeshSummary::new(path, format, &mesh))
}

/// Process every path, printing a summary line or an error for each.
///
/// Returns how many files failed.
pub fn run(cli: &Cli) -> usize {
    let mut loader = StlLoader::new();
    let mut failures = 0;

    for path in &cli.paths {
        match inspect(&mut loader, path, cli.format) {
            Ok(summary) => println!("{summary}"),
            Err(e) => {
                tracing::error!("{:#}", e);
                eprintln!("error: {e:#}");
                failures += 1;
            }
        }
        if cli.release {
            loader.release(true);
        }
    }

    failures
}
