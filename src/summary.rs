//! Aggregate metrics for a finished layout.

use serde::Serialize;
use utoipa::ToSchema;

use crate::geometry::{distinct_count, extent};
use crate::model::{Item, Pallet, Placement};
use crate::types::{Dimensional, EPSILON_GENERAL, Weighted};

/// Counts, envelope and utilisation of one SKU's layout.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, ToSchema)]
pub struct LayoutSummary {
    /// Distinct columns times distinct rows, at least 1
    pub items_per_layer: usize,
    pub complete_layers: usize,
    /// Items in the last, incomplete layer
    pub leftover_items: usize,
    pub total_items: usize,
    pub total_weight: f64,
    /// Fraction of the pallet's maximum weight
    pub weight_utilization: f64,
    pub total_volume: f64,
    /// Fraction of pallet footprint times maximum height
    pub volume_utilization: f64,
    pub final_length: f64,
    pub final_width: f64,
    /// Stack height including the riser
    pub final_height: f64,
}

/// Summarises a placement set produced for `item`.
pub fn summarize(pallet: &Pallet, item: &Item, placements: &[Placement]) -> LayoutSummary {
    let columns = distinct_count(placements.iter().map(|p| p.position.x), EPSILON_GENERAL);
    let rows = distinct_count(placements.iter().map(|p| p.position.y), EPSILON_GENERAL);
    let items_per_layer = (columns * rows).max(1);

    let final_length = envelope(
        placements.iter().map(|p| p.position.x),
        placements.iter().map(|p| p.far_corner().x),
    )
    .max(pallet.length);
    let final_width = envelope(
        placements.iter().map(|p| p.position.y),
        placements.iter().map(|p| p.far_corner().y),
    )
    .max(pallet.width);
    let final_height = extent(placements.iter().map(Placement::top_z))
        .map_or(0.0, |(_, top)| top)
        + pallet.base_height;

    let total_items = placements.len();
    let total_weight = total_items as f64 * item.weight();
    let total_volume = item.volume() * total_items as f64;

    LayoutSummary {
        items_per_layer,
        complete_layers: total_items / items_per_layer,
        leftover_items: total_items % items_per_layer,
        total_items,
        total_weight,
        weight_utilization: ratio(total_weight, pallet.max_weight),
        total_volume,
        volume_utilization: ratio(total_volume, pallet.max_volume()),
        final_length,
        final_width,
        final_height,
    }
}

/// Span from the smallest start to the largest end, 0 when there is nothing.
fn envelope(starts: impl Iterator<Item = f64>, ends: impl Iterator<Item = f64>) -> f64 {
    match (extent(starts), extent(ends)) {
        (Some((min_start, _)), Some((_, max_end))) => max_end - min_start,
        _ => 0.0,
    }
}

fn ratio(value: f64, limit: f64) -> f64 {
    if limit > 0.0 { value / limit } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Overhang, Shape};
    use crate::optimizer::{PackingConfig, evaluate_item, place};

    #[test]
    fn box_scenario_summary() {
        let pallet = Pallet::default();
        let item = Item::new("CJ-01", Shape::Box, (30.0, 20.0, 15.0), 5.0);
        let layout = evaluate_item(&pallet, &item, &PackingConfig::default());
        let summary = summarize(&pallet, &item, &layout.placements);

        assert_eq!(summary.items_per_layer, 20);
        assert_eq!(summary.complete_layers, 7);
        assert_eq!(summary.leftover_items, 0);
        assert_eq!(summary.total_items, 140);
        assert_eq!(summary.total_weight, 700.0);
        assert!((summary.weight_utilization - 0.56).abs() < 1e-9);
        assert_eq!(summary.total_volume, 140.0 * 9000.0);
        assert!((summary.volume_utilization - 1_260_000.0 / 1_560_000.0).abs() < 1e-9);
        assert_eq!(summary.final_length, 120.0);
        assert_eq!(summary.final_width, 100.0);
        assert!((summary.final_height - (105.0 + 14.5)).abs() < 1e-9);
    }

    #[test]
    fn weight_capped_layout_has_partial_layer() {
        let pallet = Pallet::default();
        let item = Item::new("TB-40", Shape::Cylinder, (0.0, 25.4, 30.0), 40.0);
        let placements = place(&pallet, &item.footprint(), Overhang::NONE);
        let summary = summarize(&pallet, &item, &placements);

        assert_eq!(summary.total_items, 31);
        assert_eq!(summary.items_per_layer, 12);
        assert_eq!(summary.complete_layers, 2);
        assert_eq!(summary.leftover_items, 7);
        assert_eq!(summary.total_weight, 1240.0);
        let unit = std::f64::consts::PI * 12.7 * 12.7 * 30.0;
        assert!((summary.total_volume - unit * 31.0).abs() < 1e-6);
    }

    #[test]
    fn overhanging_block_widens_envelope() {
        let pallet = Pallet::default();
        let item = Item::new("TB-08", Shape::Cylinder, (0.0, 25.4, 30.0), 8.0);
        let layout = evaluate_item(&pallet, &item, &PackingConfig::default());
        let summary = summarize(&pallet, &item, &layout.placements);

        assert_eq!(summary.total_items, 45);
        assert_eq!(summary.items_per_layer, 15);
        assert!((summary.final_length - 127.0).abs() < 1e-9);
        assert_eq!(summary.final_width, 100.0);
        assert!((summary.final_height - 104.5).abs() < 1e-9);
    }

    #[test]
    fn empty_layout_reports_zeros() {
        let pallet = Pallet::default();
        let item = Item::new("TALL", Shape::Box, (30.0, 20.0, 200.0), 5.0);
        let summary = summarize(&pallet, &item, &[]);

        assert_eq!(summary.items_per_layer, 1);
        assert_eq!(summary.total_items, 0);
        assert_eq!(summary.complete_layers, 0);
        assert_eq!(summary.leftover_items, 0);
        assert_eq!(summary.total_weight, 0.0);
        assert_eq!(summary.final_length, 120.0);
        assert_eq!(summary.final_width, 100.0);
        assert_eq!(summary.final_height, 14.5);
    }
}
