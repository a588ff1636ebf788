use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

/// How a diameter becomes a discrete ring size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeMappingPolicy {
    /// Calibrated breakpoint table (14.0 – 22.3 mm)
    #[default]
    Table,
    /// `EU = round(d·π)`, `US = round((d − 11.5) / 0.83)` on `[10, 28]` mm
    Formula,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RingSize {
    pub eu: Option<i32>,
    pub us: Option<f32>,
}

impl RingSize {
    pub const OUT_OF_RANGE: RingSize = RingSize { eu: None, us: None };

    pub fn is_in_range(&self) -> bool {
        self.eu.is_some() && self.us.is_some()
    }
}

/// Upper bound (exclusive, except the last which is inclusive) → (EU, US)
const SIZE_TABLE: [(f32, i32, f32); 27] = [
    (14.0, 44, 3.0),
    (14.3, 45, 3.5),
    (14.7, 46, 4.0),
    (15.0, 47, 4.5),
    (15.3, 48, 4.75),
    (15.7, 49, 5.0),
    (16.05, 50, 5.5),
    (16.4, 51, 5.75),
    (16.75, 52, 6.0),
    (17.05, 53, 6.5),
    (17.35, 54, 7.0),
    (17.65, 55, 7.5),
    (17.95, 56, 7.75),
    (18.3, 57, 8.0),
    (18.65, 58, 8.5),
    (18.95, 59, 8.75),
    (19.25, 60, 9.0),
    (19.55, 61, 9.5),
    (19.85, 62, 10.0),
    (20.2, 63, 10.5),
    (20.55, 64, 10.75),
    (20.85, 65, 11.0),
    (21.15, 66, 11.5),
    (21.45, 67, 12.0),
    (21.8, 68, 12.5),
    (22.15, 69, 13.0),
    (22.3, 70, 13.5),
];

fn from_table(diameter_mm: f32) -> RingSize {
    if !diameter_mm.is_finite() || diameter_mm <= 0.0 {
        return RingSize::OUT_OF_RANGE;
    }
    let last = SIZE_TABLE.len() - 1;
    SIZE_TABLE
        .iter()
        .enumerate()
        .find(|&(i, &(bound, _, _))| {
            if i == last {
                diameter_mm <= bound
            } else {
                diameter_mm < bound
            }
        })
        .map(|(_, &(_, eu, us))| RingSize {
            eu: Some(eu),
            us: Some(us),
        })
        .unwrap_or(RingSize::OUT_OF_RANGE)
}

fn from_formula(diameter_mm: f32) -> RingSize {
    if !(10.0..=28.0).contains(&diameter_mm) {
        return RingSize::OUT_OF_RANGE;
    }
    let eu = (diameter_mm * PI).round() as i32;
    let us = ((diameter_mm - 11.5) / 0.83).round().max(0.0);
    RingSize {
        eu: Some(eu),
        us: Some(us),
    }
}

pub fn ring_size(diameter_mm: f32, policy: SizeMappingPolicy) -> RingSize {
    match policy {
        SizeMappingPolicy::Table => from_table(diameter_mm),
        SizeMappingPolicy::Formula => from_formula(diameter_mm),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(d: f32) -> (Option<i32>, Option<f32>) {
        let s = ring_size(d, SizeMappingPolicy::Table);
        (s.eu, s.us)
    }

    #[test]
    fn table_lookup() {
        assert_eq!(table(15.5), (Some(49), Some(5.0)));
        assert_eq!(table(22.3), (Some(70), Some(13.5)));
        assert_eq!(table(23.0), (None, None));
        assert_eq!(table(0.0), (None, None));
        assert_eq!(table(12.0), (Some(44), Some(3.0)));
        // breakpoints are exclusive
        assert_eq!(table(14.0), (Some(45), Some(3.5)));
    }

    #[test]
    fn table_is_monotonic() {
        for pair in SIZE_TABLE.windows(2) {
            assert!(pair[0].0 < pair[1].0);
            assert!(pair[0].1 < pair[1].1);
            assert!(pair[0].2 < pair[1].2);
        }
    }

    #[test]
    fn formula_mapping() {
        let s = ring_size(17.2, SizeMappingPolicy::Formula);
        assert_eq!(s.eu, Some(54));
        assert_eq!(s.us, Some(7.0));
        assert_eq!(ring_size(9.5, SizeMappingPolicy::Formula), RingSize::OUT_OF_RANGE);
        assert_eq!(ring_size(28.5, SizeMappingPolicy::Formula), RingSize::OUT_OF_RANGE);
    }

    #[test]
    fn sizes_are_never_negative() {
        for tenth in 0..400 {
            let d = tenth as f32 / 10.0;
            for policy in [SizeMappingPolicy::Table, SizeMappingPolicy::Formula] {
                let s = ring_size(d, policy);
                assert!(s.eu.is_none_or(|eu| eu >= 0));
                assert!(s.us.is_none_or(|us| us >= 0.0));
            }
        }
    }

    #[test]
    fn variants_disagree_on_the_same_diameter() {
        let t = ring_size(15.0, SizeMappingPolicy::Table);
        let f = ring_size(15.0, SizeMappingPolicy::Formula);
        assert_eq!(t.eu, Some(48));
        assert_eq!(f.eu, Some(47));
    }
}
