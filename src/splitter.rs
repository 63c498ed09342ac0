//! Splitting a polygon ring at a vertical seam.
//!
//! The coordinate space wraps: valid x values run over `[0, wrap)` and the
//! seam sits at `x = threshold`. Points right of the seam form one ring, the
//! rest form the other. Each time the ring crosses the seam, a synthetic point
//! is pushed onto the ring being entered so it stays on its own side of the
//! wrap: `(0, y)` for the right ring and `(wrap, y)` for the left ring.

use std::fmt;

use geo::{Coord, LineString, Polygon};

use crate::error::{PrepError, Result};

pub const DEFAULT_THRESHOLD: f64 = 20.0;
pub const DEFAULT_WRAP: f64 = 24.0;

/// Which side of the seam a point falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// `x <= threshold`
    Left,
    /// `x > threshold`
    Right,
}

impl Side {
    pub fn name(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Seam and wrap coordinates of the split.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitConfig {
    pub threshold: f64,
    pub wrap: f64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            wrap: DEFAULT_WRAP,
        }
    }
}

impl SplitConfig {
    pub fn new(threshold: f64, wrap: f64) -> Result<Self> {
        for (name, value) in [("threshold", threshold), ("wrap", wrap)] {
            if !value.is_finite() {
                return Err(PrepError::InvalidParameter {
                    name,
                    value: value.to_string(),
                    reason: "must be a finite number".into(),
                });
            }
        }
        Ok(Self { threshold, wrap })
    }

    pub fn side_of(&self, coord: Coord<f64>) -> Side {
        if coord.x > self.threshold {
            Side::Right
        } else {
            Side::Left
        }
    }

    /// Synthetic point pushed onto the ring being entered.
    fn seam_point(&self, entering: Side, y: f64) -> Coord<f64> {
        match entering {
            Side::Right => Coord { x: 0.0, y },
            Side::Left => Coord { x: self.wrap, y },
        }
    }
}

/// The two closed rings produced by a split.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitResult {
    pub left: LineString<f64>,
    pub right: LineString<f64>,
}

impl SplitResult {
    pub fn ring(&self, side: Side) -> &LineString<f64> {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }
}

#[derive(Default)]
struct Accumulator {
    current: Option<Side>,
    left: Vec<Coord<f64>>,
    right: Vec<Coord<f64>>,
}

impl Accumulator {
    fn ring_mut(&mut self, side: Side) -> &mut Vec<Coord<f64>> {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

/// Distributes the coordinates over the two sides and inserts seam points.
/// Returns `(left, right)`, not yet closed.
pub(crate) fn partition_coords<'a, I>(coords: I, config: &SplitConfig) -> (Vec<Coord<f64>>, Vec<Coord<f64>>)
where
    I: IntoIterator<Item = &'a Coord<f64>>,
{
    let acc = coords
        .into_iter()
        .fold(Accumulator::default(), |mut acc, &coord| {
            let side = config.side_of(coord);
            if acc.current.is_some_and(|current| current != side) {
                let seam = config.seam_point(side, coord.y);
                acc.ring_mut(side).push(seam);
            }
            acc.ring_mut(side).push(coord);
            acc.current = Some(side);
            acc
        });
    (acc.left, acc.right)
}

/// Appends the first point if the ring does not already end on it.
/// Empty rings are left alone.
pub fn close_ring(coords: &mut Vec<Coord<f64>>) {
    if let (Some(&first), Some(&last)) = (coords.first(), coords.last()) {
        if first != last {
            coords.push(first);
        }
    }
}

pub fn split_ring(ring: &LineString<f64>, config: &SplitConfig) -> SplitResult {
    let (mut left, mut right) = partition_coords(ring.coords(), config);
    close_ring(&mut left);
    close_ring(&mut right);
    SplitResult {
        left: LineString::new(left),
        right: LineString::new(right),
    }
}

/// Splits the exterior of `polygon`; interior rings are ignored.
pub fn split_polygon(polygon: &Polygon<f64>, config: &SplitConfig) -> SplitResult {
    split_ring(polygon.exterior(), config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ring(points: &[(f64, f64)]) -> LineString<f64> {
        LineString::from(points.to_vec())
    }

    fn coords(line: &LineString<f64>) -> Vec<(f64, f64)> {
        line.coords().map(|c| (c.x, c.y)).collect()
    }

    #[test]
    fn rectangle_across_the_seam() {
        let input = ring(&[(22.0, 0.0), (22.0, 10.0), (18.0, 10.0), (18.0, 0.0), (22.0, 0.0)]);
        let result = split_ring(&input, &SplitConfig::default());

        assert_eq!(
            coords(&result.right),
            vec![(22.0, 0.0), (22.0, 10.0), (0.0, 0.0), (22.0, 0.0)]
        );
        assert_eq!(
            coords(&result.left),
            vec![(24.0, 10.0), (18.0, 10.0), (18.0, 0.0), (24.0, 10.0)]
        );
    }

    #[test]
    fn ring_on_one_side_leaves_other_empty() {
        let input = ring(&[(5.0, 0.0), (5.0, 3.0), (5.0, 6.0)]);
        let result = split_ring(&input, &SplitConfig::default());

        assert_eq!(
            coords(&result.left),
            vec![(5.0, 0.0), (5.0, 3.0), (5.0, 6.0), (5.0, 0.0)]
        );
        assert!(result.right.0.is_empty());
    }

    #[test]
    fn single_transition_inserts_one_seam_point() {
        let input = ring(&[(10.0, 1.0), (12.0, 2.0), (21.0, 7.5), (23.0, 9.0)]);
        let result = split_ring(&input, &SplitConfig::default());

        // (0, 7.5) carries the y of the first point past the seam.
        assert_eq!(
            coords(&result.right),
            vec![(0.0, 7.5), (21.0, 7.5), (23.0, 9.0), (0.0, 7.5)]
        );
        assert_eq!(
            coords(&result.left),
            vec![(10.0, 1.0), (12.0, 2.0), (10.0, 1.0)]
        );
    }

    #[test]
    fn point_on_threshold_counts_as_left() {
        let config = SplitConfig::default();
        assert_eq!(config.side_of(Coord { x: 20.0, y: 3.0 }), Side::Left);
        assert_eq!(config.side_of(Coord { x: 20.000001, y: 3.0 }), Side::Right);
    }

    #[test]
    fn closed_input_gets_no_extra_closing_point() {
        let input = ring(&[(1.0, 1.0), (2.0, 1.0), (2.0, 2.0), (1.0, 1.0)]);
        let result = split_ring(&input, &SplitConfig::default());
        assert_eq!(result.left, input);
    }

    #[test]
    fn empty_ring_splits_into_two_empty_rings() {
        let result = split_ring(&LineString::new(vec![]), &SplitConfig::default());
        assert!(result.left.0.is_empty());
        assert!(result.right.0.is_empty());
    }

    #[test]
    fn custom_seam_and_wrap() {
        let config = SplitConfig::new(180.0, 360.0).unwrap();
        let input = ring(&[(170.0, 0.0), (190.0, 0.0), (190.0, 5.0), (170.0, 5.0)]);
        let result = split_ring(&input, &config);

        assert_eq!(
            coords(&result.right),
            vec![(0.0, 0.0), (190.0, 0.0), (190.0, 5.0), (0.0, 0.0)]
        );
        assert_eq!(
            coords(&result.left),
            vec![(170.0, 0.0), (360.0, 5.0), (170.0, 5.0), (170.0, 0.0)]
        );
    }

    #[test]
    fn non_finite_config_is_rejected() {
        assert!(matches!(
            SplitConfig::new(f64::NAN, 24.0),
            Err(PrepError::InvalidParameter { name: "threshold", .. })
        ));
        assert!(matches!(
            SplitConfig::new(20.0, f64::INFINITY),
            Err(PrepError::InvalidParameter { name: "wrap", .. })
        ));
    }

    #[test]
    fn split_polygon_uses_exterior() {
        let exterior = ring(&[(19.0, 0.0), (21.0, 0.0), (21.0, 1.0), (19.0, 1.0), (19.0, 0.0)]);
        let hole = ring(&[(19.5, 0.2), (19.6, 0.2), (19.6, 0.3), (19.5, 0.2)]);
        let polygon = Polygon::new(exterior.clone(), vec![hole]);
        let config = SplitConfig::default();
        assert_eq!(split_polygon(&polygon, &config), split_ring(&exterior, &config));
    }

    fn arb_coords() -> impl Strategy<Value = Vec<Coord<f64>>> {
        prop::collection::vec((0i32..24, -10i32..10), 1..40).prop_map(|pts| {
            pts.into_iter()
                .map(|(x, y)| Coord { x: x as f64, y: y as f64 })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn output_rings_are_closed(pts in arb_coords()) {
            let result = split_ring(&LineString::new(pts), &SplitConfig::default());
            for side in [Side::Left, Side::Right] {
                let ring = &result.ring(side).0;
                if let (Some(first), Some(last)) = (ring.first(), ring.last()) {
                    prop_assert_eq!(first, last);
                }
            }
        }

        #[test]
        fn real_points_keep_their_order(pts in arb_coords()) {
            let config = SplitConfig::default();
            let (left, right) = partition_coords(&pts, &config);

            // Seam points sit at x = 0 (right ring) and x = wrap (left ring),
            // both on the opposite side of the threshold.
            let real_right: Vec<_> = right.iter().filter(|c| c.x > config.threshold).collect();
            let real_left: Vec<_> = left.iter().filter(|c| c.x <= config.threshold).collect();
            let want_right: Vec<_> = pts.iter().filter(|c| c.x > config.threshold).collect();
            let want_left: Vec<_> = pts.iter().filter(|c| c.x <= config.threshold).collect();

            prop_assert_eq!(real_right, want_right);
            prop_assert_eq!(real_left, want_left);
        }

        #[test]
        fn one_seam_point_per_transition(pts in arb_coords()) {
            let config = SplitConfig::default();
            let (left, right) = partition_coords(&pts, &config);

            let mut into_left = 0;
            let mut into_right = 0;
            for pair in pts.windows(2) {
                match (config.side_of(pair[0]), config.side_of(pair[1])) {
                    (Side::Right, Side::Left) => into_left += 1,
                    (Side::Left, Side::Right) => into_right += 1,
                    _ => {}
                }
            }

            let seams_left = left.iter().filter(|c| c.x > config.threshold).count();
            let seams_right = right.iter().filter(|c| c.x <= config.threshold).count();
            prop_assert_eq!(seams_left, into_left);
            prop_assert_eq!(seams_right, into_right);
            prop_assert!(left.iter().filter(|c| c.x > config.threshold).all(|c| c.x == config.wrap));
            prop_assert!(right.iter().filter(|c| c.x <= config.threshold).all(|c| c.x == 0.0));
        }

        #[test]
        fn both_sides_present_means_both_rings_filled(pts in arb_coords()) {
            let config = SplitConfig::default();
            let has_left = pts.iter().any(|c| config.side_of(*c) == Side::Left);
            let has_right = pts.iter().any(|c| config.side_of(*c) == Side::Right);
            let result = split_ring(&LineString::new(pts), &config);

            prop_assert_eq!(!result.left.0.is_empty(), has_left);
            prop_assert_eq!(!result.right.0.is_empty(), has_right);
        }

        #[test]
        fn closing_twice_is_a_no_op(pts in arb_coords()) {
            let mut once = pts.clone();
            close_ring(&mut once);
            let mut twice = once.clone();
            close_ring(&mut twice);
            prop_assert_eq!(once, twice);
        }
    }
}
