//! Gear selection and the static gear-ratio table.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Number of forward gears in the gearbox.
pub const FORWARD_GEARS: usize = 5;

/// Selected gear: -1 reverse, 0 neutral, 1..=5 forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Gear(i8);

impl Gear {
    pub const REVERSE: Gear = Gear(-1);
    pub const NEUTRAL: Gear = Gear(0);

    /// Forward gear `n` (1-based). Returns `None` outside 1..=5.
    pub fn forward(n: u8) -> Option<Self> {
        if (1..=FORWARD_GEARS as u8).contains(&n) {
            Some(Gear(n as i8))
        } else {
            None
        }
    }

    pub fn is_neutral(&self) -> bool {
        self.0 == 0
    }

    pub fn is_reverse(&self) -> bool {
        self.0 < 0
    }

    /// Magnitude used for ratio lookup. Reverse shares first gear's ratio slot.
    pub fn magnitude(&self) -> Option<usize> {
        if self.is_neutral() {
            None
        } else {
            Some(self.0.unsigned_abs() as usize)
        }
    }

    /// Travel direction this gear drives the wheels in, `None` for neutral.
    pub fn direction(&self) -> Option<crate::components::TravelDirection> {
        use crate::components::TravelDirection;
        match self.0 {
            0 => None,
            n if n < 0 => Some(TravelDirection::Reverse),
            _ => Some(TravelDirection::Forward),
        }
    }

    pub fn as_i32(&self) -> i32 {
        self.0 as i32
    }
}

impl TryFrom<i32> for Gear {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        if (-1..=FORWARD_GEARS as i32).contains(&value) {
            Ok(Gear(value as i8))
        } else {
            Err(format!("gear {} is outside -1..={}", value, FORWARD_GEARS))
        }
    }
}

impl From<Gear> for i32 {
    fn from(gear: Gear) -> Self {
        gear.as_i32()
    }
}

impl std::fmt::Display for Gear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            0 => write!(f, "N"),
            n if n < 0 => write!(f, "R"),
            n => write!(f, "{}", n),
        }
    }
}

/// Ratio and sustainable rpm band for one forward gear.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GearRatio {
    pub ratio: f32,
    pub min_rpm: f32,
    pub max_rpm: f32,
}

impl GearRatio {
    pub const fn new(ratio: f32, min_rpm: f32, max_rpm: f32) -> Self {
        Self { ratio, min_rpm, max_rpm }
    }
}

/// Forward gear ratios, indexed by gear number - 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GearRatioTable {
    gears: Vec<GearRatio>,
}

impl Default for GearRatioTable {
    fn default() -> Self {
        Self {
            gears: vec![
                GearRatio::new(3.3, 800.0, 4000.0),
                GearRatio::new(1.9, 1000.0, 5000.0),
                GearRatio::new(1.3, 1500.0, 6000.0),
                GearRatio::new(1.0, 2000.0, 7000.0),
                GearRatio::new(0.8, 2500.0, 8000.0),
            ],
        }
    }
}

impl GearRatioTable {
    /// Build a validated table from forward gears ordered 1st..5th.
    pub fn new(gears: Vec<GearRatio>) -> Result<Self, ConfigError> {
        let table = Self { gears };
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gears.len() != FORWARD_GEARS {
            return Err(ConfigError::GearCount {
                expected: FORWARD_GEARS,
                found: self.gears.len(),
            });
        }
        for (idx, entry) in self.gears.iter().enumerate() {
            let gear = idx + 1;
            for value in [entry.ratio, entry.min_rpm, entry.max_rpm] {
                if !value.is_finite() {
                    return Err(ConfigError::NonFinite { name: "gear_ratios", value });
                }
            }
            if !(entry.ratio > 0.0) {
                return Err(ConfigError::NonPositiveRatio { gear, ratio: entry.ratio });
            }
            if !(entry.min_rpm < entry.max_rpm) {
                return Err(ConfigError::InvalidRpmBand {
                    gear,
                    min_rpm: entry.min_rpm,
                    max_rpm: entry.max_rpm,
                });
            }
            if idx > 0 && entry.ratio >= self.gears[idx - 1].ratio {
                return Err(ConfigError::RatiosNotDecreasing { gear, previous: gear - 1 });
            }
        }
        Ok(())
    }

    /// Entry for the given gear. Neutral has no entry; reverse uses 1st.
    pub fn get(&self, gear: Gear) -> Option<&GearRatio> {
        gear.magnitude().and_then(|n| self.gears.get(n - 1))
    }

    /// Ratio for the given gear, `None` in neutral.
    pub fn ratio(&self, gear: Gear) -> Option<f32> {
        self.get(gear).map(|g| g.ratio)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GearRatio> {
        self.gears.iter()
    }
}

/// Advisory shift indicator derived from the current gear's rpm band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShiftHint {
    #[default]
    Hold,
    Upshift,
    Downshift,
}

impl ShiftHint {
    /// Compare `rpm` against the band of a forward `gear`. Neutral and reverse always hold.
    pub fn evaluate(table: &GearRatioTable, gear: Gear, rpm: f32) -> Self {
        if gear.is_reverse() {
            return ShiftHint::Hold;
        }
        let (Some(n), Some(band)) = (gear.magnitude(), table.get(gear)) else {
            return ShiftHint::Hold;
        };
        if rpm > band.max_rpm && n < FORWARD_GEARS {
            ShiftHint::Upshift
        } else if rpm < band.min_rpm && n > 1 {
            ShiftHint::Downshift
        } else {
            ShiftHint::Hold
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::TravelDirection;

    #[test]
    fn test_gear_range() {
        assert!(Gear::try_from(-1).is_ok());
        assert!(Gear::try_from(5).is_ok());
        assert!(Gear::try_from(6).is_err());
        assert!(Gear::try_from(-2).is_err());
        assert_eq!(Gear::forward(0), None);
        assert_eq!(Gear::forward(3).map(|g| g.as_i32()), Some(3));
    }

    #[test]
    fn test_gear_direction() {
        assert_eq!(Gear::NEUTRAL.direction(), None);
        assert_eq!(Gear::REVERSE.direction(), Some(TravelDirection::Reverse));
        assert_eq!(Gear::forward(2).unwrap().direction(), Some(TravelDirection::Forward));
        assert_eq!(Gear::REVERSE.to_string(), "R");
        assert_eq!(Gear::NEUTRAL.to_string(), "N");
    }

    #[test]
    fn test_default_table_lookup() {
        let table = GearRatioTable::default();
        assert!(table.validate().is_ok());
        assert_eq!(table.ratio(Gear::NEUTRAL), None);
        assert_eq!(table.ratio(Gear::forward(1).unwrap()), Some(3.3));
        assert_eq!(table.ratio(Gear::forward(5).unwrap()), Some(0.8));
        // Reverse uses the magnitude of its gear number
        assert_eq!(table.ratio(Gear::REVERSE), Some(3.3));
    }

    #[test]
    fn test_table_rejects_increasing_ratio() {
        let mut gears: Vec<_> = GearRatioTable::default().iter().copied().collect();
        gears[3].ratio = 1.5;
        let err = GearRatioTable::new(gears).unwrap_err();
        assert!(matches!(err, ConfigError::RatiosNotDecreasing { gear: 4, previous: 3 }));
    }

    #[test]
    fn test_table_rejects_bad_entries() {
        let mut gears: Vec<_> = GearRatioTable::default().iter().copied().collect();
        gears[0].ratio = 0.0;
        assert!(matches!(
            GearRatioTable::new(gears.clone()),
            Err(ConfigError::NonPositiveRatio { gear: 1, .. })
        ));

        gears[0].ratio = 3.3;
        gears[2].min_rpm = 9000.0;
        assert!(matches!(
            GearRatioTable::new(gears.clone()),
            Err(ConfigError::InvalidRpmBand { gear: 3, .. })
        ));

        gears[2].min_rpm = 1500.0;
        gears[4].ratio = f32::INFINITY;
        assert!(matches!(
            GearRatioTable::new(gears.clone()),
            Err(ConfigError::NonFinite { name: "gear_ratios", .. })
        ));

        gears[4].ratio = 0.8;
        gears.truncate(4);
        assert!(matches!(
            GearRatioTable::new(gears),
            Err(ConfigError::GearCount { expected: 5, found: 4 })
        ));
    }

    #[test]
    fn test_shift_hint() {
        let table = GearRatioTable::default();
        let first = Gear::forward(1).unwrap();
        let third = Gear::forward(3).unwrap();
        let fifth = Gear::forward(5).unwrap();

        assert_eq!(ShiftHint::evaluate(&table, first, 4500.0), ShiftHint::Upshift);
        assert_eq!(ShiftHint::evaluate(&table, first, 600.0), ShiftHint::Hold);
        assert_eq!(ShiftHint::evaluate(&table, third, 1200.0), ShiftHint::Downshift);
        assert_eq!(ShiftHint::evaluate(&table, third, 3000.0), ShiftHint::Hold);
        assert_eq!(ShiftHint::evaluate(&table, fifth, 8000.0), ShiftHint::Hold);
        assert_eq!(ShiftHint::evaluate(&table, Gear::NEUTRAL, 7000.0), ShiftHint::Hold);
        assert_eq!(ShiftHint::evaluate(&table, Gear::REVERSE, 7000.0), ShiftHint::Hold);
    }
}
