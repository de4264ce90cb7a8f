//! Browsing state for computed results.
//!
//! The cursor belongs to whoever presents the results; the report itself stays
//! immutable and is only queried.

use crate::batch::{BatchReport, SkuResult};

/// Index into the accepted results of a `BatchReport`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResultCursor {
    index: usize,
}

impl ResultCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Moves forward, wrapping to the first result after the last.
    pub fn forward(self, len: usize) -> Self {
        if len == 0 {
            return self;
        }
        Self {
            index: (self.index % len + 1) % len,
        }
    }

    /// Moves backward, wrapping to the last result before the first.
    pub fn back(self, len: usize) -> Self {
        if len == 0 {
            return self;
        }
        Self {
            index: (self.index % len + len - 1) % len,
        }
    }

    /// Jumps to the named SKU; unknown names leave the cursor unchanged.
    pub fn select(self, report: &BatchReport, sku: &str) -> Self {
        report
            .position_of(sku)
            .map_or(self, |index| Self { index })
    }
}

impl BatchReport {
    /// Result under the cursor, `None` when the report holds no results.
    pub fn result_at(&self, cursor: &ResultCursor) -> Option<&SkuResult> {
        self.results.get(cursor.index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::pack_items;
    use crate::model::{Item, Pallet, Shape};
    use crate::optimizer::PackingConfig;

    fn report() -> BatchReport {
        let items = ["A", "B", "C"]
            .into_iter()
            .map(|sku| Item::new(sku, Shape::Box, (30.0, 20.0, 15.0), 5.0))
            .collect();
        pack_items(&Pallet::default(), items, &PackingConfig::default())
    }

    #[test]
    fn forward_and_back_wrap_around() {
        let cursor = ResultCursor::new();
        assert_eq!(cursor.back(3).index(), 2);
        assert_eq!(cursor.forward(3).forward(3).index(), 2);
        assert_eq!(cursor.forward(3).forward(3).forward(3).index(), 0);
    }

    #[test]
    fn empty_collection_keeps_cursor() {
        let cursor = ResultCursor::new();
        assert_eq!(cursor.forward(0), cursor);
        assert_eq!(cursor.back(0), cursor);
    }

    #[test]
    fn select_jumps_to_named_sku() {
        let report = report();
        let cursor = ResultCursor::new().select(&report, "C");
        assert_eq!(cursor.index(), 2);
        assert_eq!(report.result_at(&cursor).map(|r| r.item.sku.as_str()), Some("C"));

        let unchanged = cursor.select(&report, "missing");
        assert_eq!(unchanged, cursor);
    }

    #[test]
    fn result_at_on_empty_report_is_none() {
        let empty = pack_items(&Pallet::default(), Vec::new(), &PackingConfig::default());
        assert!(empty.result_at(&ResultCursor::new()).is_none());
    }
}
