//! Data models for the pallet layout planner.
//!
//! This module defines the fundamental data structures:
//! - `Pallet`: the loading surface with its height and weight limits
//! - `Item`: one SKU row (box or cylinder) to be stacked
//! - `Footprint`: an item in a concrete orientation, as seen by the engine
//! - `Placement`: one stacked unit with its position on the pallet

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::types::{Dimensional, Vec3, Weighted, cylinder_volume};

/// Validation error for pallet and item data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),
    #[error("Invalid weight: {0}")]
    InvalidWeight(String),
}

fn validate_positive(value: f64, name: &str) -> Result<(), ValidationError> {
    if value <= 0.0 || !value.is_finite() {
        return Err(ValidationError::InvalidDimension(format!(
            "{} must be positive, got: {}",
            name, value
        )));
    }
    Ok(())
}

/// Checks that a row value is a usable number. Zero and negative values are allowed
/// and simply produce empty layouts.
pub fn validate_finite(value: f64, name: &str) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::InvalidDimension(format!(
            "{} must be a finite number, got: {}",
            name, value
        )));
    }
    Ok(())
}

/// Shape class of a SKU.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    Box,
    Cylinder,
}

impl Shape {
    /// Interprets the `Tipo` column: `caja` (any case, surrounding blanks ignored) is a
    /// box, every other value a cylinder.
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("caja") {
            Shape::Box
        } else {
            Shape::Cylinder
        }
    }

    pub fn is_cylinder(self) -> bool {
        matches!(self, Shape::Cylinder)
    }

    fn default_label(self) -> &'static str {
        match self {
            Shape::Box => "Caja",
            Shape::Cylinder => "Cilindro",
        }
    }
}

/// Loading surface shared by every SKU of a batch.
///
/// # Fields
/// * `length`, `width` - Nominal footprint in cm
/// * `max_height` - Maximum stack height including the riser
/// * `base_height` - Height of the riser itself
/// * `max_weight` - Maximum load in kg
#[derive(Clone, Copy, Debug, PartialEq, Serialize, ToSchema)]
pub struct Pallet {
    pub length: f64,
    pub width: f64,
    pub max_height: f64,
    pub base_height: f64,
    pub max_weight: f64,
}

impl Pallet {
    pub const DEFAULT_LENGTH: f64 = 120.0;
    pub const DEFAULT_WIDTH: f64 = 100.0;
    pub const DEFAULT_MAX_HEIGHT: f64 = 130.0;
    pub const DEFAULT_BASE_HEIGHT: f64 = 14.5;
    pub const DEFAULT_MAX_WEIGHT: f64 = 1250.0;

    /// Creates a pallet after validating the parameters.
    ///
    /// A base height above the maximum height is accepted; such a pallet just has no
    /// room for any layer.
    pub fn new(
        length: f64,
        width: f64,
        max_height: f64,
        base_height: f64,
        max_weight: f64,
    ) -> Result<Self, ValidationError> {
        validate_positive(length, "Pallet length")?;
        validate_positive(width, "Pallet width")?;
        validate_positive(max_height, "Pallet max height")?;
        if base_height < 0.0 || !base_height.is_finite() {
            return Err(ValidationError::InvalidDimension(format!(
                "Pallet base height must not be negative, got: {}",
                base_height
            )));
        }
        if max_weight <= 0.0 || !max_weight.is_finite() {
            return Err(ValidationError::InvalidWeight(format!(
                "Pallet max weight must be positive, got: {}",
                max_weight
            )));
        }
        Ok(Self {
            length,
            width,
            max_height,
            base_height,
            max_weight,
        })
    }

    /// Vertical space available for items above the riser.
    pub fn effective_height(&self) -> f64 {
        self.max_height - self.base_height
    }

    /// Reference volume for utilisation: footprint times the full maximum height.
    pub fn max_volume(&self) -> f64 {
        self.length * self.width * self.max_height
    }
}

impl Default for Pallet {
    fn default() -> Self {
        Self {
            length: Self::DEFAULT_LENGTH,
            width: Self::DEFAULT_WIDTH,
            max_height: Self::DEFAULT_MAX_HEIGHT,
            base_height: Self::DEFAULT_BASE_HEIGHT,
            max_weight: Self::DEFAULT_MAX_WEIGHT,
        }
    }
}

/// One SKU row.
///
/// For a cylinder `width` is the diameter and `length` only takes part in the
/// oversize check.
#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    pub sku: String,
    pub shape: Shape,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub weight: f64,
    pub units: u32,
    /// Title-cased `Tipo` value as shown in reports.
    pub type_label: String,
}

impl Item {
    pub fn new(
        sku: impl Into<String>,
        shape: Shape,
        dims: (f64, f64, f64),
        weight: f64,
    ) -> Self {
        Self {
            sku: sku.into(),
            shape,
            length: dims.0,
            width: dims.1,
            height: dims.2,
            weight,
            units: 0,
            type_label: shape.default_label().to_string(),
        }
    }

    /// Keeps the row's own type text (title-cased) for reporting.
    pub fn with_type_label(mut self, raw_label: &str) -> Self {
        self.type_label = title_case(raw_label.trim());
        self
    }

    pub fn with_units(mut self, units: u32) -> Self {
        self.units = units;
        self
    }

    /// Footprint in the orientation given by the row.
    pub fn footprint(&self) -> Footprint {
        match self.shape {
            Shape::Box => Footprint {
                length: self.length,
                width: self.width,
                height: self.height,
                weight: self.weight,
                shape: Shape::Box,
            },
            Shape::Cylinder => Footprint {
                length: self.width,
                width: self.width,
                height: self.height,
                weight: self.weight,
                shape: Shape::Cylinder,
            },
        }
    }
}

impl Dimensional for Item {
    fn dimensions(&self) -> Vec3 {
        Vec3::new(self.length, self.width, self.height)
    }

    fn volume(&self) -> f64 {
        match self.shape {
            Shape::Box => self.dimensions().volume(),
            Shape::Cylinder => cylinder_volume(self.width, self.height),
        }
    }
}

impl Weighted for Item {
    fn weight(&self) -> f64 {
        self.weight
    }
}

/// An item in one concrete orientation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Footprint {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub weight: f64,
    pub shape: Shape,
}

impl Footprint {
    /// Same item rotated a quarter turn about the vertical axis.
    pub fn transposed(&self) -> Self {
        Self {
            length: self.width,
            width: self.length,
            ..*self
        }
    }
}

impl Dimensional for Footprint {
    fn dimensions(&self) -> Vec3 {
        Vec3::new(self.length, self.width, self.height)
    }
}

/// Permitted protrusion beyond each pallet edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, ToSchema)]
pub struct Overhang {
    pub length: f64,
    pub width: f64,
}

impl Overhang {
    pub const NONE: Overhang = Overhang {
        length: 0.0,
        width: 0.0,
    };

    pub fn is_none(&self) -> bool {
        self.length == 0.0 && self.width == 0.0
    }
}

/// A stacked unit.
///
/// # Fields
/// * `position` - Lower corner (x, y, z) in pallet-local coordinates
/// * `dims` - Oriented footprint (length, width, height)
/// * `shape` - Shape flag for renderers
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub position: Vec3,
    pub dims: Vec3,
    pub shape: Shape,
}

impl Placement {
    pub fn new(position: Vec3, footprint: &Footprint) -> Self {
        Self {
            position,
            dims: footprint.dimensions(),
            shape: footprint.shape,
        }
    }

    /// Corner opposite to `position`.
    #[inline]
    pub fn far_corner(&self) -> Vec3 {
        self.position + self.dims
    }

    #[inline]
    pub fn top_z(&self) -> f64 {
        self.position.z + self.dims.z
    }
}

impl Dimensional for Placement {
    fn dimensions(&self) -> Vec3 {
        self.dims
    }
}

fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut at_word_start = true;
    for ch in raw.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_label_is_case_insensitive() {
        assert_eq!(Shape::from_label("caja"), Shape::Box);
        assert_eq!(Shape::from_label("  CAJA "), Shape::Box);
        assert_eq!(Shape::from_label("Caja"), Shape::Box);
        assert_eq!(Shape::from_label("cilindro"), Shape::Cylinder);
        assert_eq!(Shape::from_label("box"), Shape::Cylinder);
        assert_eq!(Shape::from_label(""), Shape::Cylinder);
    }

    #[test]
    fn pallet_validation_rejects_bad_values() {
        assert!(Pallet::new(120.0, 100.0, 130.0, 14.5, 1250.0).is_ok());
        assert!(Pallet::new(0.0, 100.0, 130.0, 14.5, 1250.0).is_err());
        assert!(Pallet::new(120.0, f64::NAN, 130.0, 14.5, 1250.0).is_err());
        assert!(Pallet::new(120.0, 100.0, 130.0, -1.0, 1250.0).is_err());
        assert!(matches!(
            Pallet::new(120.0, 100.0, 130.0, 14.5, 0.0),
            Err(ValidationError::InvalidWeight(_))
        ));
        // Riser taller than the stack limit is allowed, it just leaves no room.
        let pallet = Pallet::new(120.0, 100.0, 10.0, 14.5, 1250.0).unwrap();
        assert!(pallet.effective_height() < 0.0);
    }

    #[test]
    fn default_pallet_matches_standard_values() {
        let pallet = Pallet::default();
        assert_eq!(pallet.effective_height(), 115.5);
        assert_eq!(pallet.max_volume(), 120.0 * 100.0 * 130.0);
    }

    #[test]
    fn cylinder_footprint_uses_diameter_on_both_axes() {
        let item = Item::new("TUBO", Shape::Cylinder, (999.0, 25.4, 30.0), 8.0);
        let fp = item.footprint();
        assert_eq!((fp.length, fp.width, fp.height), (25.4, 25.4, 30.0));
        assert!(fp.shape.is_cylinder());
    }

    #[test]
    fn item_volume_depends_on_shape() {
        let boxed = Item::new("A", Shape::Box, (30.0, 20.0, 15.0), 5.0);
        assert_eq!(boxed.volume(), 9000.0);
        let round = Item::new("B", Shape::Cylinder, (0.0, 20.0, 10.0), 5.0);
        assert!((round.volume() - std::f64::consts::PI * 1000.0).abs() < 1e-9);
    }

    #[test]
    fn transposed_footprint_swaps_horizontal_axes() {
        let fp = Item::new("A", Shape::Box, (30.0, 20.0, 15.0), 5.0).footprint();
        let t = fp.transposed();
        assert_eq!((t.length, t.width, t.height), (20.0, 30.0, 15.0));
        assert_eq!(t.weight, fp.weight);
    }

    #[test]
    fn type_label_is_title_cased() {
        let item = Item::new("A", Shape::Box, (1.0, 1.0, 1.0), 1.0);
        assert_eq!(item.type_label, "Caja");
        assert_eq!(item.clone().with_type_label(" caja ").type_label, "Caja");
        assert_eq!(item.with_type_label("TUBO largo").type_label, "Tubo Largo");
    }

    #[test]
    fn validate_finite_accepts_degenerate_numbers() {
        assert!(validate_finite(0.0, "Length").is_ok());
        assert!(validate_finite(-3.0, "Length").is_ok());
        assert!(validate_finite(f64::INFINITY, "Length").is_err());
    }
}
