//! Batch runner: lays out every SKU row of a request on the same pallet.
//!
//! Rows are handled strictly one after the other. A rejected row never stops the
//! batch; it is reported next to the accepted results.

use log::{info, warn};
use serde::Serialize;

use crate::model::{Item, Pallet};
use crate::optimizer::{
    CandidateKind, LayoutCandidate, PackingConfig, RejectionReason, check_footprint,
    evaluate_item,
};
use crate::summary::{LayoutSummary, summarize};

/// Accepted SKU with its chosen layout.
#[derive(Clone, Debug)]
pub struct SkuResult {
    pub item: Item,
    pub layout: LayoutCandidate,
    pub summary: LayoutSummary,
}

/// SKU that was not laid out.
#[derive(Clone, Debug)]
pub struct RejectedSku {
    pub item: Item,
    pub reason: RejectionReason,
}

#[derive(Clone, Debug)]
pub enum SkuOutcome {
    Packed(SkuResult),
    Rejected(RejectedSku),
}

/// Result of a whole batch, in input order.
#[derive(Clone, Debug)]
pub struct BatchReport {
    pub pallet: Pallet,
    pub results: Vec<SkuResult>,
    pub rejected: Vec<RejectedSku>,
}

impl BatchReport {
    /// Indicates whether every row was accepted.
    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty()
    }

    pub fn packed_count(&self) -> usize {
        self.results.len()
    }

    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }

    /// Position of an accepted SKU in `results`.
    pub fn position_of(&self, sku: &str) -> Option<usize> {
        self.results.iter().position(|r| r.item.sku == sku)
    }

    /// Items placed over all accepted SKUs.
    pub fn total_items(&self) -> usize {
        self.results.iter().map(|r| r.summary.total_items).sum()
    }
}

/// Events emitted while a batch runs, for live progress reporting.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type")]
pub enum PackEvent {
    /// A SKU was laid out.
    SkuPacked {
        index: usize,
        sku: String,
        candidate: CandidateKind,
        summary: LayoutSummary,
    },
    /// A SKU was skipped.
    SkuRejected {
        index: usize,
        sku: String,
        reason_code: String,
        reason_text: String,
    },
    /// Batch completed.
    Finished { packed: usize, rejected: usize },
}

/// Lays out a single SKU: rejection check, candidate selection, summary.
pub fn pack_item(pallet: &Pallet, item: Item, config: &PackingConfig) -> SkuOutcome {
    if let Err(reason) = check_footprint(pallet, &item, config) {
        return SkuOutcome::Rejected(RejectedSku { item, reason });
    }

    let layout = evaluate_item(pallet, &item, config);
    let summary = summarize(pallet, &item, &layout.placements);
    SkuOutcome::Packed(SkuResult {
        item,
        layout,
        summary,
    })
}

/// Lays out all items without progress reporting.
pub fn pack_items(pallet: &Pallet, items: Vec<Item>, config: &PackingConfig) -> BatchReport {
    pack_items_with_progress(pallet, items, config, |_| {})
}

/// Lays out all items and calls `on_event` after each SKU and once at the end.
pub fn pack_items_with_progress(
    pallet: &Pallet,
    items: Vec<Item>,
    config: &PackingConfig,
    mut on_event: impl FnMut(&PackEvent),
) -> BatchReport {
    let mut results = Vec::new();
    let mut rejected = Vec::new();

    for (index, item) in items.into_iter().enumerate() {
        match pack_item(pallet, item, config) {
            SkuOutcome::Packed(result) => {
                on_event(&PackEvent::SkuPacked {
                    index,
                    sku: result.item.sku.clone(),
                    candidate: result.layout.kind,
                    summary: result.summary,
                });
                results.push(result);
            }
            SkuOutcome::Rejected(entry) => {
                warn!("⚠️ SKU '{}' skipped: {}", entry.item.sku, entry.reason);
                on_event(&PackEvent::SkuRejected {
                    index,
                    sku: entry.item.sku.clone(),
                    reason_code: entry.reason.code().to_string(),
                    reason_text: entry.reason.to_string(),
                });
                rejected.push(entry);
            }
        }
    }

    info!(
        "📦 Batch finished: {} SKUs laid out, {} rejected",
        results.len(),
        rejected.len()
    );
    on_event(&PackEvent::Finished {
        packed: results.len(),
        rejected: rejected.len(),
    });

    BatchReport {
        pallet: *pallet,
        results,
        rejected,
    }
}
