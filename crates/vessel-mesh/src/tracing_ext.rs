//! Tracing helpers shared by the vessel crates.
//!
//! The crates only emit events; installing a subscriber is left to the
//! application:
//!
//! ```rust,ignore
//! use tracing_subscriber::{fmt, prelude::*, EnvFilter};
//!
//! tracing_subscriber::registry()
//!     .with(fmt::layer())
//!     .with(EnvFilter::from_default_env())
//!     .init();
//!
//! // RUST_LOG=vessel=debug shows per-stage detail
//! ```
//!
//! # Targets
//!
//! - `vessel::timing`: operation start/stop with elapsed milliseconds
//! - `vessel::mesh_state`: mesh and lattice dimensions
//! - `vessel::progress`: progress of long-running stages

use std::time::Instant;
use tracing::{Span, debug, info};

use crate::grid::Domain;

/// Logs how long a stage took when dropped.
///
/// ```rust,ignore
/// let _timer = OperationTimer::with_context("accumulate", mesh.face_count());
/// // elapsed time is logged under `vessel::timing` at scope exit
/// ```
pub struct OperationTimer {
    name: &'static str,
    start: Instant,
    span: Span,
}

impl OperationTimer {
    /// Start timing `name`.
    pub fn new(name: &'static str) -> Self {
        Self::start(name, tracing::info_span!("vessel_operation", operation = name))
    }

    /// Start timing `name`, recording how many items it processes.
    pub fn with_context(name: &'static str, items: usize) -> Self {
        Self::start(
            name,
            tracing::info_span!("vessel_operation", operation = name, items),
        )
    }

    fn start(name: &'static str, span: Span) -> Self {
        span.in_scope(|| debug!(target: "vessel::timing", operation = name, "Stage started"));
        Self {
            name,
            start: Instant::now(),
            span,
        }
    }

    /// Milliseconds since the timer started.
    pub fn elapsed_ms(&self) -> f64 {
        1e3 * self.start.elapsed().as_secs_f64()
    }

    /// Span covering the timed stage.
    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        let elapsed_ms = self.elapsed_ms();
        self.span.in_scope(|| {
            info!(
                target: "vessel::timing",
                operation = self.name,
                elapsed_ms = (elapsed_ms * 100.0).round() / 100.0,
                "Stage finished"
            )
        });
    }
}

/// Log mesh statistics at debug level.
pub fn log_mesh_stats(mesh: &crate::Mesh, context: &str) {
    let dims = mesh
        .bounds()
        .map(|(lo, hi)| hi - lo)
        .unwrap_or_else(nalgebra::Vector3::zeros);

    debug!(
        target: "vessel::mesh_state",
        context = context,
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        dimensions = format!("{:.2} x {:.2} x {:.2}", dims.x, dims.y, dims.z),
        "Mesh state"
    );
}

/// Log the extent of a voxel domain at debug level.
pub fn log_domain(domain: &Domain, context: &str) {
    debug!(
        target: "vessel::mesh_state",
        context = context,
        lower = ?domain.lower,
        upper = ?domain.upper,
        cells = domain.cell_count(),
        "Voxel domain"
    );
}

/// Log that `pipeline` reached stage `current` of `total`.
///
/// `stage` names the stage about to run; `None` marks the end.
pub fn log_progress(pipeline: &str, current: usize, total: usize, stage: Option<&str>) {
    let percent = match total {
        0 => 0,
        _ => 100 * current.min(total) / total,
    };
    debug!(
        target: "vessel::progress",
        pipeline,
        current,
        total,
        percent,
        stage = stage.unwrap_or("done"),
        "Pipeline stage"
    );
}
