//! Peak detection and local slope queries.

use serde::Serialize;

use crate::error::{FieldError, Result};

use super::GammaField;

/// A node whose value is positive and strictly greater than every neighbor's.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Peak {
    pub node: usize,
    pub value: f64,
}

/// Uphill direction at a lattice node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Gradient {
    /// Unit vector, or all zeros when no neighbor is higher.
    pub direction: [f64; 3],
    pub magnitude: f64,
}

/// Outcome of [`GammaField::peak_separation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PeakSeparation {
    /// Hop distance between the two highest qualifying peaks. Always >= 1.
    Apart(usize),
    /// Fewer than two peaks reach the threshold. A merge and a field that
    /// dispersed below the threshold both land here; follow the peaks with a
    /// [`PeakTracker`] to tell them apart.
    TooFewPeaks,
    /// The two highest peaks sit in different components.
    Disconnected,
}

/// Follows one peak across ticks by re-finding it near its last position.
///
/// Each [`update`](Self::update) moves to the closest qualifying peak within
/// `radius` hops, preferring the higher one on ties. A peak that drains into a
/// neighbor's summit is followed there, so two trackers whose peaks merge end
/// on the same node. Once nothing qualifies nearby the tracker is lost for good.
#[derive(Debug, Clone, PartialEq)]
pub struct PeakTracker {
    position: Option<usize>,
    min_value: f64,
    radius: usize,
}

impl PeakTracker {
    pub const DEFAULT_RADIUS: usize = 2;

    pub fn new(node: usize, min_value: f64) -> Self {
        PeakTracker {
            position: Some(node),
            min_value,
            radius: Self::DEFAULT_RADIUS,
        }
    }

    pub fn with_radius(mut self, radius: usize) -> Self {
        self.radius = radius;
        self
    }

    /// Node of the tracked peak, or `None` once it is lost.
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub fn is_lost(&self) -> bool {
        self.position.is_none()
    }

    /// Re-locate the peak in the current field.
    pub fn update(&mut self, field: &GammaField) -> Result<Option<Peak>> {
        let Some(node) = self.position else {
            return Ok(None);
        };
        let found = field.peak_near(node, self.min_value, self.radius)?;
        self.position = found.map(|peak| peak.node);
        Ok(found)
    }

    /// Hop distance between two tracked peaks. `None` if either is lost or
    /// they are not connected.
    pub fn distance_to(&self, other: &PeakTracker, field: &GammaField) -> Result<Option<usize>> {
        match (self.position, other.position) {
            (Some(a), Some(b)) => field.topology().hop_distance(a, b),
            _ => Ok(None),
        }
    }
}

impl GammaField {
    fn is_peak(&self, node: usize) -> bool {
        let gamma = self.values();
        gamma[node] > 0.0
            && self
                .topology()
                .neighbors(node)
                .iter()
                .all(|&j| gamma[node] > gamma[j])
    }

    /// All peaks, highest first. Equal values are ordered by node index.
    pub fn find_peaks(&self) -> Vec<Peak> {
        let gamma = self.values();
        let mut peaks: Vec<Peak> = self
            .topology()
            .all_nodes()
            .filter(|&i| self.is_peak(i))
            .map(|node| Peak {
                node,
                value: gamma[node],
            })
            .collect();
        peaks.sort_by(|a, b| b.value.total_cmp(&a.value).then(a.node.cmp(&b.node)));
        peaks
    }

    /// Peaks whose value is at least `min_value`.
    pub fn find_peaks_above(&self, min_value: f64) -> Vec<Peak> {
        let mut peaks = self.find_peaks();
        peaks.retain(|p| p.value >= min_value);
        peaks
    }

    /// Closest peak at or above `min_value` within `radius` hops of `node`.
    ///
    /// Ties on distance go to the higher peak, then the lower index.
    pub fn peak_near(&self, node: usize, min_value: f64, radius: usize) -> Result<Option<Peak>> {
        let gamma = self.values();
        let best = self
            .topology()
            .nodes_within(node, radius)?
            .into_iter()
            .filter(|&(i, _)| gamma[i] >= min_value && self.is_peak(i))
            .min_by(|&(a, da), &(b, db)| {
                da.cmp(&db)
                    .then(gamma[b].total_cmp(&gamma[a]))
                    .then(a.cmp(&b))
            });
        Ok(best.map(|(node, _)| Peak {
            node,
            value: gamma[node],
        }))
    }

    /// Hop distance between the two highest peaks at or above `min_value`.
    pub fn peak_separation(&self, min_value: f64) -> PeakSeparation {
        match self.find_peaks_above(min_value).as_slice() {
            [first, second, ..] => match self.topology().hop_distance(first.node, second.node) {
                Ok(Some(hops)) => PeakSeparation::Apart(hops),
                Ok(None) | Err(_) => PeakSeparation::Disconnected,
            },
            _ => PeakSeparation::TooFewPeaks,
        }
    }

    /// Difference-weighted sum of unit vectors toward every higher neighbor.
    ///
    /// Only lattices carry edge directions; graphs return
    /// [`FieldError::NotEmbedded`] and should use
    /// [`neighbor_differences`](Self::neighbor_differences) instead.
    pub fn gradient_at(&self, node: usize) -> Result<Gradient> {
        self.topology().check_node(node)?;
        let directions = self
            .topology()
            .directions(node)
            .ok_or(FieldError::NotEmbedded)?;

        let gamma = self.values();
        let center = gamma[node];
        let mut sum = [0.0f64; 3];
        for (&j, dir) in self.topology().neighbors(node).iter().zip(directions) {
            let rise = gamma[j] - center;
            if rise > 0.0 {
                for axis in 0..3 {
                    sum[axis] += rise * dir[axis];
                }
            }
        }

        let magnitude = (sum[0] * sum[0] + sum[1] * sum[1] + sum[2] * sum[2]).sqrt();
        let direction = if magnitude > 0.0 {
            [sum[0] / magnitude, sum[1] / magnitude, sum[2] / magnitude]
        } else {
            [0.0; 3]
        };
        Ok(Gradient {
            direction,
            magnitude,
        })
    }

    /// `(neighbor, gamma[neighbor] - gamma[node])` for every neighbor.
    pub fn neighbor_differences(&self, node: usize) -> Result<Vec<(usize, f64)>> {
        let center = self.value_at(node)?;
        Ok(self
            .neighbor_values(node)?
            .into_iter()
            .map(|(j, value)| (j, value - center))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldConfig;
    use crate::topology::{Connectivity, Topology};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn line(n: usize) -> GammaField {
        let topo = Topology::cubic(n, 1, 1, Connectivity::Face).unwrap();
        GammaField::new(topo, FieldConfig::linear().with_alpha(0.25)).unwrap()
    }

    #[test]
    fn test_find_peaks_sorted() {
        let mut field = line(9);
        field.set_value(1, 2.0).unwrap();
        field.set_value(4, 5.0).unwrap();
        field.set_value(7, 2.0).unwrap();
        let peaks = field.find_peaks();
        let nodes: Vec<usize> = peaks.iter().map(|p| p.node).collect();
        assert_eq!(nodes, vec![4, 1, 7], "descending by value, ties by index");
        assert_eq!(peaks[0].value, 5.0);
    }

    #[test]
    fn test_plateau_is_not_a_peak() {
        let mut field = line(6);
        field.set_value(2, 3.0).unwrap();
        field.set_value(3, 3.0).unwrap();
        assert!(field.find_peaks().is_empty());
    }

    #[test]
    fn test_zero_field_has_no_peaks() {
        let field = line(5);
        assert!(field.find_peaks().is_empty());
        assert_eq!(field.peak_separation(0.0), PeakSeparation::TooFewPeaks);
    }

    #[test]
    fn test_isolated_positive_node_is_a_peak() {
        let topo = Topology::from_adjacency(vec![vec![1], vec![0], vec![]], 1).unwrap();
        let mut field = GammaField::new(topo, FieldConfig::linear().with_alpha(0.5)).unwrap();
        field.set_value(2, 1.0).unwrap();
        assert_eq!(field.find_peaks(), vec![Peak { node: 2, value: 1.0 }]);
    }

    #[test]
    fn test_peak_separation_with_threshold() {
        let mut field = line(12);
        field.set_value(2, 10.0).unwrap();
        field.set_value(6, 0.5).unwrap();
        field.set_value(9, 8.0).unwrap();
        assert_eq!(field.peak_separation(0.0), PeakSeparation::Apart(7));
        assert_eq!(field.find_peaks_above(1.0).len(), 2);
        assert_eq!(field.peak_separation(9.0), PeakSeparation::TooFewPeaks);
    }

    #[test]
    fn test_peak_separation_disconnected() {
        let topo = Topology::from_adjacency(vec![vec![1], vec![0], vec![3], vec![2]], 1).unwrap();
        let mut field = GammaField::new(topo, FieldConfig::linear().with_alpha(0.5)).unwrap();
        field.set_value(0, 2.0).unwrap();
        field.set_value(3, 1.0).unwrap();
        assert_eq!(field.peak_separation(0.0), PeakSeparation::Disconnected);
    }

    #[test]
    fn test_peak_near_prefers_closest_then_highest() {
        let mut field = line(12);
        field.set_value(3, 2.0).unwrap();
        field.set_value(5, 9.0).unwrap();
        field.set_value(9, 4.0).unwrap();
        assert_eq!(field.peak_near(4, 0.0, 1).unwrap().map(|p| p.node), Some(5));
        assert_eq!(field.peak_near(3, 0.0, 2).unwrap().map(|p| p.node), Some(3));
        assert_eq!(field.peak_near(3, 5.0, 2).unwrap().map(|p| p.node), Some(5));
        assert_eq!(field.peak_near(7, 0.0, 2).unwrap().map(|p| p.node), Some(5));
        assert_eq!(field.peak_near(11, 0.0, 1).unwrap(), None);
        assert!(field.peak_near(12, 0.0, 1).is_err());
    }

    #[test]
    fn test_tracker_follows_a_shifted_peak() {
        let mut field = line(10);
        field.set_value(4, 6.0).unwrap();
        let mut tracker = PeakTracker::new(4, 1.0);
        assert_eq!(tracker.update(&field).unwrap().map(|p| p.node), Some(4));

        field.reset();
        field.set_value(5, 6.0).unwrap();
        assert_eq!(tracker.update(&field).unwrap().map(|p| p.node), Some(5));
        assert_eq!(tracker.position(), Some(5));
    }

    #[test]
    fn test_trackers_meet_when_peaks_merge() {
        let mut field = line(10);
        field.set_value(3, 5.0).unwrap();
        field.set_value(5, 5.0).unwrap();
        let mut left = PeakTracker::new(3, 1.0);
        let mut right = PeakTracker::new(5, 1.0);
        left.update(&field).unwrap();
        right.update(&field).unwrap();
        assert_eq!(left.distance_to(&right, &field).unwrap(), Some(2));

        field.reset();
        field.set_value(4, 10.0).unwrap();
        left.update(&field).unwrap();
        right.update(&field).unwrap();
        assert_eq!(left.position(), Some(4));
        assert_eq!(left.distance_to(&right, &field).unwrap(), Some(0));
        assert_eq!(field.peak_separation(1.0), PeakSeparation::TooFewPeaks);
    }

    #[test]
    fn test_tracker_is_lost_once_the_peak_disperses() {
        let mut field = line(10);
        field.set_value(2, 5.0).unwrap();
        field.set_value(8, 5.0).unwrap();
        let mut tracker = PeakTracker::new(2, 1.0).with_radius(1);
        let other = PeakTracker::new(8, 1.0);

        field.set_value(2, 0.5).unwrap();
        assert_eq!(tracker.update(&field).unwrap(), None);
        assert!(tracker.is_lost());
        assert_eq!(tracker.distance_to(&other, &field).unwrap(), None);

        field.set_value(2, 5.0).unwrap();
        assert_eq!(tracker.update(&field).unwrap(), None, "lost trackers stay lost");
    }

    #[test]
    fn test_gradient_points_uphill() {
        let topo = Topology::cubic(5, 5, 5, Connectivity::Face).unwrap();
        let mut field = GammaField::new(topo, FieldConfig::linear()).unwrap();
        let center = field.topology().node_at([2, 2, 2]).unwrap();
        let east = field.topology().node_at([3, 2, 2]).unwrap();
        let north = field.topology().node_at([2, 3, 2]).unwrap();
        field.set_value(center, 1.0).unwrap();
        field.set_value(east, 4.0).unwrap();
        field.set_value(north, 5.0).unwrap();

        let gradient = field.gradient_at(center).unwrap();
        assert!((gradient.magnitude - 5.0).abs() < 1e-12, "|(3, 4, 0)| = 5");
        assert!((gradient.direction[0] - 0.6).abs() < 1e-12);
        assert!((gradient.direction[1] - 0.8).abs() < 1e-12);
        assert_eq!(gradient.direction[2], 0.0);
    }

    #[test]
    fn test_gradient_at_summit_is_zero() {
        let topo = Topology::hex(4, 4).unwrap();
        let mut field = GammaField::new(topo, FieldConfig::linear()).unwrap();
        field.set_value(5, 3.0).unwrap();
        let gradient = field.gradient_at(5).unwrap();
        assert_eq!(gradient.magnitude, 0.0);
        assert_eq!(gradient.direction, [0.0; 3]);
    }

    #[test]
    fn test_gradient_needs_geometry() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let topo = Topology::small_world(20, 4, 0.2, &mut rng).unwrap();
        let mut field = GammaField::new(topo, FieldConfig::linear()).unwrap();
        assert!(matches!(field.gradient_at(0), Err(FieldError::NotEmbedded)));

        let first = field.topology().neighbors(0)[0];
        field.set_value(first, 2.0).unwrap();
        field.set_value(0, 0.5).unwrap();
        let diffs = field.neighbor_differences(0).unwrap();
        assert_eq!(diffs.len(), field.topology().degree(0));
        assert!(diffs.contains(&(first, 1.5)));
    }
}
