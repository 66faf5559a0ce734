//! Shared pipeline helpers for CLI commands.
//!
//! Project root resolution, input loading, and diagnostic rendering.

use std::path::{Path, PathBuf};

use tempus_common::Interner;
use tempus_config::{ConfigError, CONFIG_FILE_NAME};
use tempus_diagnostics::{Diagnostic, DiagnosticRenderer, DiagnosticSink, TerminalRenderer};
use tempus_timing::{parse_sdc, GraphError, TimingConstraints, TimingGraph};

use crate::GlobalArgs;

/// Failures that stop a command before any check runs.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// No `tempus.toml` was found and no netlist was given on the command line.
    #[error("could not find tempus.toml in {} or any parent directory", .0.display())]
    NoProject(PathBuf),

    /// The project configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An input file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// The file that failed.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// The timing graph file is malformed.
    #[error("{}: {source}", path.display())]
    Graph {
        /// The graph file.
        path: PathBuf,
        /// What was wrong with it.
        source: GraphError,
    },

    /// A check name in the configuration or on the command line is unknown.
    #[error("unknown check `{0}`")]
    UnknownCheck(String),

    /// The current directory could not be determined.
    #[error("cannot determine the current directory: {0}")]
    CurrentDir(std::io::Error),
}

/// Walks up from `start` looking for the nearest directory containing `tempus.toml`.
pub fn find_project_root(start: &Path) -> Result<PathBuf, LoadError> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE_NAME).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(LoadError::NoProject(start.to_path_buf()));
        }
    }
}

/// Resolves the project root directory from global CLI args.
///
/// If `--config` is specified, uses that path (file → parent dir, dir → itself).
/// Otherwise walks up from `cwd` looking for `tempus.toml`.
pub fn resolve_project_root(global: &GlobalArgs, cwd: &Path) -> Result<PathBuf, LoadError> {
    if let Some(ref config_path) = global.config {
        let p = cwd.join(config_path);
        if p.is_file() {
            Ok(p.parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".")))
        } else {
            Ok(p)
        }
    } else {
        find_project_root(cwd)
    }
}

/// Reads a timing graph from a JSON file.
pub fn load_graph(path: &Path) -> Result<TimingGraph, LoadError> {
    let text = read_file(path)?;
    let graph = TimingGraph::from_json(&text).map_err(|source| LoadError::Graph {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(
        path = %path.display(),
        pins = graph.pin_count(),
        arcs = graph.arc_count(),
        "loaded timing graph"
    );
    Ok(graph)
}

/// Reads SDC files in order and merges their constraints.
///
/// Problems inside the files go to `sink`; only unreadable files fail.
pub fn load_constraints(
    paths: &[PathBuf],
    interner: &Interner,
    sink: &DiagnosticSink,
) -> Result<TimingConstraints, LoadError> {
    let mut constraints = TimingConstraints::new();
    for path in paths {
        let text = read_file(path)?;
        let file = path.display().to_string();
        constraints.extend(parse_sdc(&text, &file, interner, sink));
    }
    tracing::debug!(
        files = paths.len(),
        clocks = constraints.clock_count(),
        max_delays = constraints.max_delay_paths.len(),
        "loaded constraints"
    );
    Ok(constraints)
}

/// Renders diagnostics to stderr and returns the number of errors among them.
pub fn render_diagnostics(diagnostics: &[Diagnostic], color: bool) -> usize {
    let renderer = TerminalRenderer::new(color);
    let mut error_count = 0;
    for diag in diagnostics {
        if diag.severity.is_error() {
            error_count += 1;
        }
        eprintln!("{}", renderer.render(diag));
    }
    error_count
}

fn read_file(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}
