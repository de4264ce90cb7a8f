//! Serializable views of batch results, shared by the HTTP API and the archive export.

use serde::Serialize;
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToSchema;

use crate::batch::{BatchReport, RejectedSku, SkuResult};
use crate::model::{Overhang, Pallet, Placement, Shape};
use crate::optimizer::{CandidateKind, GridPlan};
use crate::summary::LayoutSummary;

/// One row of the consolidated summary table.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct SkuRecord {
    pub sku: String,
    /// Title-cased type label from the input row
    #[serde(rename = "type")]
    pub type_label: String,
    pub shape: Shape,
    /// Informational unit count from the input row
    pub units: u32,
    pub candidate: CandidateKind,
    pub grid: GridPlan,
    pub overhang: Overhang,
    pub summary: LayoutSummary,
}

impl SkuRecord {
    pub fn from_result(result: &SkuResult) -> Self {
        Self {
            sku: result.item.sku.clone(),
            type_label: result.item.type_label.clone(),
            shape: result.item.shape,
            units: result.item.units,
            candidate: result.layout.kind,
            grid: result.layout.grid,
            overhang: result.layout.overhang,
            summary: result.summary,
        }
    }
}

/// Single placed unit.
///
/// # Fields
/// * `pos` - Lower corner (x, y, z) in pallet-local coordinates
/// * `dims` - Oriented dimensions (length, width, height)
/// * `cylinder` - Whether the unit is round
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct PlacementRecord {
    #[schema(value_type = [f64; 3], example = json!([10.0, 0.0, 0.0]))]
    pub pos: (f64, f64, f64),
    #[schema(value_type = [f64; 3], example = json!([30.0, 20.0, 15.0]))]
    pub dims: (f64, f64, f64),
    pub cylinder: bool,
}

impl From<&Placement> for PlacementRecord {
    fn from(placement: &Placement) -> Self {
        Self {
            pos: placement.position.into(),
            dims: placement.dims.into(),
            cylinder: placement.shape.is_cylinder(),
        }
    }
}

/// Summary row plus the placements needed to draw the layout.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct SkuLayoutRecord {
    #[serde(flatten)]
    pub record: SkuRecord,
    pub placements: Vec<PlacementRecord>,
}

impl SkuLayoutRecord {
    pub fn from_result(result: &SkuResult) -> Self {
        Self {
            record: SkuRecord::from_result(result),
            placements: result
                .layout
                .placements
                .iter()
                .map(PlacementRecord::from)
                .collect(),
        }
    }
}

/// Notice for a skipped SKU.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct RejectionRecord {
    pub sku: String,
    pub reason_code: String,
    pub reason: String,
}

impl From<&RejectedSku> for RejectionRecord {
    fn from(entry: &RejectedSku) -> Self {
        Self {
            sku: entry.item.sku.clone(),
            reason_code: entry.reason.code().to_string(),
            reason: entry.reason.to_string(),
        }
    }
}

/// Consolidated table for a whole batch.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct BatchSummary {
    pub pallet: Pallet,
    pub results: Vec<SkuRecord>,
    pub rejected: Vec<RejectionRecord>,
}

impl BatchSummary {
    pub fn from_report(report: &BatchReport) -> Self {
        Self {
            pallet: report.pallet,
            results: report.results.iter().map(SkuRecord::from_result).collect(),
            rejected: report.rejected.iter().map(RejectionRecord::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::pack_items;
    use crate::model::Item;
    use crate::optimizer::PackingConfig;

    #[test]
    fn layout_record_flattens_summary_row() {
        let item = Item::new("TB-08", Shape::Cylinder, (25.4, 25.4, 30.0), 8.0)
            .with_type_label("cilindro")
            .with_units(12);
        let report = pack_items(&Pallet::default(), vec![item], &PackingConfig::default());
        let json = serde_json::to_value(SkuLayoutRecord::from_result(&report.results[0])).unwrap();

        assert_eq!(json["sku"], "TB-08");
        assert_eq!(json["type"], "Cilindro");
        assert_eq!(json["shape"], "cylinder");
        assert_eq!(json["units"], 12);
        assert_eq!(json["candidate"], "primary_with_overhang");
        assert_eq!(json["summary"]["total_items"], 45);
        assert_eq!(json["placements"].as_array().map(Vec::len), Some(45));
        assert_eq!(json["placements"][0]["cylinder"], true);
    }

    #[test]
    fn batch_summary_lists_rejections() {
        let items = vec![
            Item::new("OK", Shape::Box, (30.0, 20.0, 15.0), 5.0),
            Item::new("WIDE", Shape::Box, (30.0, 120.0, 15.0), 5.0),
        ];
        let report = pack_items(&Pallet::default(), items, &PackingConfig::default());
        let summary = BatchSummary::from_report(&report);

        assert_eq!(summary.results.len(), 1);
        assert_eq!(summary.rejected.len(), 1);
        assert_eq!(summary.rejected[0].sku, "WIDE");
        assert_eq!(summary.rejected[0].reason_code, "footprint_exceeds_tolerance");
    }
}
