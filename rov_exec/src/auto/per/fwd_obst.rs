//! # Forward obstacle monitor
//!
//! Watches a narrow corridor straight ahead of the rover for obstacles, giving the distance at which
//! the navigation controller should make an emergency stop.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use ordered_float::OrderedFloat;

use super::{frame::PolarSamples, frame::RangeMask, Mask};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FwdObstMonitor {
    corridor_semi_width_px: usize,
    max_samples: usize,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl FwdObstMonitor {
    pub fn new(corridor_semi_width_px: usize, max_samples: usize) -> Self {
        Self {
            corridor_semi_width_px,
            max_samples,
        }
    }

    /// Narrow the top-down obstacle mask down to the forward corridor.
    ///
    /// Pixels outside the corridor, pixels which are also rock and pixels beyond the sensing range
    /// are all cleared. `rock` should be the rectified rock mask before range culling.
    pub fn narrow(&self, obst: &Mask, rock: &Mask, range: &RangeMask) -> Mask {
        let (_, cols) = obst.dim();
        let centre = cols / 2;
        let min_col = centre.saturating_sub(self.corridor_semi_width_px);
        let max_col = centre + self.corridor_semi_width_px;

        let mut narrow = obst.clone();

        for ((row, col), v) in narrow.indexed_iter_mut() {
            let is_rock = rock.get((row, col)).cloned().unwrap_or(false);

            if col < min_col || col >= max_col || is_rock {
                *v = false;
            }
        }

        range.apply(&narrow)
    }

    /// Mean distance of the closest samples in the corridor.
    ///
    /// Up to `max_samples` of the nearest samples are averaged, but always at least one fewer than
    /// there are in total. This means one sample, or none at all, gives `None`.
    pub fn nearest_obstacle_distance(&self, samples: &PolarSamples) -> Option<f64> {
        let num = self.max_samples.min(samples.len().checked_sub(1)?);

        if num == 0 {
            return None;
        }

        let mut dists: Vec<OrderedFloat<f64>> =
            samples.dists.iter().map(|&d| OrderedFloat(d)).collect();
        dists.select_nth_unstable(num);

        util::maths::mean(&dists[..num].iter().map(|d| d.into_inner()).collect::<Vec<_>>())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::auto::per::frame::CoordTransformer;

    fn samples(dists: &[f64]) -> PolarSamples {
        PolarSamples {
            dists: dists.to_vec(),
            angles_rad: vec![0.0; dists.len()],
        }
    }

    #[test]
    fn test_narrow() {
        let ct = CoordTransformer::new((160, 320));
        let range = RangeMask::new(&ct, 75.0);
        let monitor = FwdObstMonitor::new(25, 30);

        let obst = Mask::from_elem((160, 320), true);
        let mut rock = Mask::from_elem((160, 320), false);
        rock[[150, 160]] = true;

        let narrow = monitor.narrow(&obst, &rock, &range);

        assert!(narrow[[159, 135]]);
        assert!(narrow[[159, 184]]);
        assert!(!narrow[[159, 134]]);
        assert!(!narrow[[159, 185]]);
        assert!(!narrow[[150, 160]]);

        // Range cull still applies inside the corridor
        assert!(narrow[[85, 160]]);
        assert!(!narrow[[84, 160]]);
    }

    #[test]
    fn test_nearest_distance() {
        let monitor = FwdObstMonitor::new(25, 3);

        assert_eq!(monitor.nearest_obstacle_distance(&samples(&[])), None);
        assert_eq!(monitor.nearest_obstacle_distance(&samples(&[4.0])), None);

        // Two samples, average only the closest one
        assert_eq!(
            monitor.nearest_obstacle_distance(&samples(&[9.0, 4.0])),
            Some(4.0)
        );

        // Many samples, average the closest three
        let d = monitor
            .nearest_obstacle_distance(&samples(&[50.0, 3.0, 40.0, 6.0, 9.0, 30.0]))
            .unwrap();
        assert!((d - 6.0).abs() < 1e-12);
    }
}
