//! Layout logic for stacking a single SKU on a pallet.
//!
//! The engine lays a regular grid of identical items over the pallet footprint,
//! optionally widened by an overhang allowance, and repeats it layer by layer until
//! either the height or the weight limit is reached. The selector evaluates a small,
//! fixed set of candidate grids and keeps one of them.

use log::{debug, warn};
use serde::Serialize;
use utoipa::ToSchema;

use crate::geometry::{centering_offset, fit_count};
use crate::model::{Footprint, Item, Overhang, Pallet, Placement, Shape};
use crate::types::Vec3;

/// Configuration for the layout heuristic.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct PackingConfig {
    /// How far an item may exceed the pallet footprint (per axis) before the SKU is rejected
    pub overhang_tolerance: f64,
    /// Overhang granted per pallet edge, as a fraction of the item dimension on that axis
    pub overhang_ratio: f64,
    /// Items shorter than this along the length axis get no length overhang
    pub overhang_min_length: f64,
    /// Items narrower than this along the width axis get no width overhang
    pub overhang_min_width: f64,
    /// Whether the overhang candidate is evaluated at all
    pub allow_overhang: bool,
}

impl PackingConfig {
    pub const DEFAULT_OVERHANG_TOLERANCE: f64 = 15.0;
    pub const DEFAULT_OVERHANG_RATIO: f64 = 0.2;
    pub const DEFAULT_OVERHANG_MIN_LENGTH: f64 = 20.0;
    pub const DEFAULT_OVERHANG_MIN_WIDTH: f64 = 40.0;
    pub const DEFAULT_ALLOW_OVERHANG: bool = true;

    /// Creates a builder for a custom configuration.
    pub fn builder() -> PackingConfigBuilder {
        PackingConfigBuilder::default()
    }
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            overhang_tolerance: Self::DEFAULT_OVERHANG_TOLERANCE,
            overhang_ratio: Self::DEFAULT_OVERHANG_RATIO,
            overhang_min_length: Self::DEFAULT_OVERHANG_MIN_LENGTH,
            overhang_min_width: Self::DEFAULT_OVERHANG_MIN_WIDTH,
            allow_overhang: Self::DEFAULT_ALLOW_OVERHANG,
        }
    }
}

/// Builder for PackingConfig.
#[derive(Clone, Debug, Default)]
pub struct PackingConfigBuilder {
    config: PackingConfig,
}

impl PackingConfigBuilder {
    pub fn overhang_tolerance(mut self, tolerance: f64) -> Self {
        self.config.overhang_tolerance = tolerance;
        self
    }

    pub fn overhang_ratio(mut self, ratio: f64) -> Self {
        self.config.overhang_ratio = ratio;
        self
    }

    pub fn overhang_min_length(mut self, min_length: f64) -> Self {
        self.config.overhang_min_length = min_length;
        self
    }

    pub fn overhang_min_width(mut self, min_width: f64) -> Self {
        self.config.overhang_min_width = min_width;
        self
    }

    pub fn allow_overhang(mut self, allow: bool) -> Self {
        self.config.allow_overhang = allow;
        self
    }

    /// Creates the final configuration.
    pub fn build(self) -> PackingConfig {
        self.config
    }
}

/// Reasons why a SKU is not laid out at all.
#[derive(Clone, Debug, PartialEq)]
pub enum RejectionReason {
    /// Raw length or width exceeds the pallet edge plus the overhang tolerance.
    FootprintExceedsTolerance {
        axis: Axis,
        item: f64,
        limit: f64,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Length,
    Width,
}

impl RejectionReason {
    pub fn code(&self) -> &'static str {
        match self {
            RejectionReason::FootprintExceedsTolerance { .. } => "footprint_exceeds_tolerance",
        }
    }
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectionReason::FootprintExceedsTolerance { axis, item, limit } => {
                let axis = match axis {
                    Axis::Length => "length",
                    Axis::Width => "width",
                };
                write!(
                    f,
                    "Item {} {} cm exceeds the permitted overhang (limit {} cm)",
                    axis, item, limit
                )
            }
        }
    }
}

/// Rejects items whose raw footprint sticks out further than the tolerance allows.
///
/// The raw `length` is checked for cylinders as well, even though only the
/// diameter shapes their grid.
pub fn check_footprint(
    pallet: &Pallet,
    item: &Item,
    config: &PackingConfig,
) -> Result<(), RejectionReason> {
    let length_limit = pallet.length + config.overhang_tolerance;
    if item.length > length_limit {
        return Err(RejectionReason::FootprintExceedsTolerance {
            axis: Axis::Length,
            item: item.length,
            limit: length_limit,
        });
    }
    let width_limit = pallet.width + config.overhang_tolerance;
    if item.width > width_limit {
        return Err(RejectionReason::FootprintExceedsTolerance {
            axis: Axis::Width,
            item: item.width,
            limit: width_limit,
        });
    }
    Ok(())
}

/// Grid dimensions and centring offsets for one footprint/overhang combination.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, ToSchema)]
pub struct GridPlan {
    pub columns: usize,
    pub rows: usize,
    pub layers: usize,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl GridPlan {
    /// Grid cells in one layer.
    pub fn per_layer(&self) -> usize {
        self.columns.saturating_mul(self.rows)
    }

    /// Geometric maximum before the weight limit applies.
    pub fn capacity(&self) -> usize {
        self.per_layer().saturating_mul(self.layers)
    }
}

/// Computes the grid for one footprint on the pallet.
pub fn plan_grid(pallet: &Pallet, footprint: &Footprint, overhang: Overhang) -> GridPlan {
    let usable_length = pallet.length + 2.0 * overhang.length;
    let usable_width = pallet.width + 2.0 * overhang.width;

    let columns = fit_count(usable_length, footprint.length);
    let rows = fit_count(usable_width, footprint.width);
    let layers = fit_count(pallet.effective_height(), footprint.height);

    GridPlan {
        columns,
        rows,
        layers,
        offset_x: centering_offset(pallet.length, columns as f64 * footprint.length),
        offset_y: centering_offset(pallet.width, rows as f64 * footprint.width),
    }
}

/// Most placements a single layout may produce.
pub const MAX_PLACEMENTS: usize = 100_000;

/// Upper bound on the placements `grid` can yield, from its cell count and the
/// number of units the pallet weight limit admits.
pub fn placement_bound(pallet: &Pallet, footprint: &Footprint, grid: &GridPlan) -> usize {
    let by_weight = if footprint.weight > 0.0 {
        (pallet.max_weight / footprint.weight).floor() as usize
    } else {
        usize::MAX
    };
    grid.capacity().min(by_weight)
}

/// Lays out one footprint on the pallet.
///
/// Cells are visited layer by layer, row by row, column by column. A cell whose
/// weight would push the running total over the pallet limit is skipped; all units
/// weigh the same, so every later cell would be skipped too and the walk ends there.
/// Grids that could yield more than [`MAX_PLACEMENTS`] units produce nothing.
///
/// # Parameters
/// * `pallet` - The pallet
/// * `footprint` - Oriented item dimensions, unit weight and shape
/// * `overhang` - Allowance added on both sides of each axis
///
/// # Returns
/// Placements in visiting order; empty for degenerate inputs
pub fn place(pallet: &Pallet, footprint: &Footprint, overhang: Overhang) -> Vec<Placement> {
    let grid = plan_grid(pallet, footprint, overhang);
    let bound = placement_bound(pallet, footprint, &grid);
    if bound > MAX_PLACEMENTS {
        warn!(
            "⚠️ Grid {}x{}x{} exceeds {} placements, nothing placed",
            grid.columns, grid.rows, grid.layers, MAX_PLACEMENTS
        );
        return Vec::new();
    }
    let effective_height = pallet.effective_height();

    let mut placements = Vec::with_capacity(bound);
    let mut total_weight = 0.0;

    'walk: for layer in 0..grid.layers {
        let z = layer as f64 * footprint.height;
        if z + footprint.height > effective_height {
            break;
        }
        for row in 0..grid.rows {
            for col in 0..grid.columns {
                if total_weight + footprint.weight > pallet.max_weight {
                    break 'walk;
                }
                let x = col as f64 * footprint.length + grid.offset_x;
                let y = row as f64 * footprint.width + grid.offset_y;
                placements.push(Placement::new(Vec3::new(x, y, z), footprint));
                total_weight += footprint.weight;
            }
        }
    }

    placements
}

/// Overhang granted to a footprint; an axis below its minimum size gets none.
pub fn overhang_for(footprint: &Footprint, config: &PackingConfig) -> Overhang {
    let length = if footprint.length >= config.overhang_min_length {
        config.overhang_ratio * footprint.length
    } else {
        0.0
    };
    let width = if footprint.width >= config.overhang_min_width {
        config.overhang_ratio * footprint.width
    } else {
        0.0
    };
    Overhang { length, width }
}

/// Which of the fixed layouts was evaluated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CandidateKind {
    /// Row orientation, no overhang
    Primary,
    /// Row orientation with overhang allowance
    PrimaryWithOverhang,
    /// Rotated a quarter turn, no overhang
    Transposed,
}

/// A fully evaluated layout.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutCandidate {
    pub kind: CandidateKind,
    pub footprint: Footprint,
    pub overhang: Overhang,
    pub grid: GridPlan,
    pub placements: Vec<Placement>,
}

impl LayoutCandidate {
    pub fn evaluate(
        kind: CandidateKind,
        pallet: &Pallet,
        footprint: Footprint,
        overhang: Overhang,
    ) -> Self {
        Self {
            kind,
            footprint,
            overhang,
            grid: plan_grid(pallet, &footprint, overhang),
            placements: place(pallet, &footprint, overhang),
        }
    }

    pub fn count(&self) -> usize {
        self.placements.len()
    }
}

/// The candidates considered for one SKU.
#[derive(Clone, Debug)]
pub struct CandidateSet {
    pub primary: LayoutCandidate,
    pub with_overhang: Option<LayoutCandidate>,
    pub transposed: Option<LayoutCandidate>,
}

impl CandidateSet {
    /// Builds the candidates for an item: boxes get a transposed candidate,
    /// cylinders do not; the overhang candidate exists only when enabled.
    pub fn for_item(pallet: &Pallet, item: &Item, config: &PackingConfig) -> Self {
        let footprint = item.footprint();
        let primary = LayoutCandidate::evaluate(
            CandidateKind::Primary,
            pallet,
            footprint,
            Overhang::NONE,
        );

        let with_overhang = config.allow_overhang.then(|| {
            LayoutCandidate::evaluate(
                CandidateKind::PrimaryWithOverhang,
                pallet,
                footprint,
                overhang_for(&footprint, config),
            )
        });

        let transposed = match item.shape {
            Shape::Box => Some(LayoutCandidate::evaluate(
                CandidateKind::Transposed,
                pallet,
                footprint.transposed(),
                Overhang::NONE,
            )),
            Shape::Cylinder => None,
        };

        Self {
            primary,
            with_overhang,
            transposed,
        }
    }
}

/// Picks the layout to use.
///
/// The overhang candidate wins if its grid holds strictly more cells per layer
/// than the primary grid. Otherwise primary and transposed compete on placed
/// count, ties going to primary. The overhang candidate never competes with the
/// transposed one.
pub fn choose_layout(set: CandidateSet) -> LayoutCandidate {
    let CandidateSet {
        primary,
        with_overhang,
        transposed,
    } = set;

    if let Some(overhang) = with_overhang {
        if overhang.grid.per_layer() > primary.grid.per_layer() {
            return overhang;
        }
    }

    match transposed {
        Some(transposed) if transposed.count() > primary.count() => transposed,
        _ => primary,
    }
}

/// Evaluates and selects the layout for one item. Does not apply the rejection rule.
pub fn evaluate_item(pallet: &Pallet, item: &Item, config: &PackingConfig) -> LayoutCandidate {
    let chosen = choose_layout(CandidateSet::for_item(pallet, item, config));
    debug!(
        "SKU {}: {:?} grid {}x{}x{} -> {} placements",
        item.sku,
        chosen.kind,
        chosen.grid.columns,
        chosen.grid.rows,
        chosen.grid.layers,
        chosen.count()
    );
    chosen
}
