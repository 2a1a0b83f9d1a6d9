//! Constant velocity Kalman filter over `(cx, cy, a, h)` and their velocities.

use crate::bbox::{BBox, Ltrb, Ltwh, Xyah};
use nalgebra as na;

const NDIM: usize = 4;

pub type StateMean = na::SVector<f32, 8>;
pub type StateCov = na::SMatrix<f32, 8, 8>;
pub type MeasurementMean = na::SVector<f32, 4>;
pub type MeasurementCov = na::Matrix4<f32>;

/// Gaussian estimate of one track's box and its velocity
#[derive(Debug, Clone, PartialEq)]
pub struct MotionState {
    pub mean: StateMean,
    pub covariance: StateCov,
}

impl MotionState {
    #[inline]
    pub fn as_xyah(&self) -> BBox<Xyah> {
        BBox::xyah(self.mean[0], self.mean[1], self.mean[2], self.mean[3])
    }

    #[inline]
    pub fn to_box(&self) -> BBox<Ltrb> {
        self.as_xyah().as_ltrb()
    }

    #[inline]
    pub fn to_ltwh(&self) -> BBox<Ltwh> {
        self.as_xyah().as_ltwh()
    }

    /// Variances of the box centre, `(var cx, var cy)`
    #[inline]
    pub fn position_variance(&self) -> (f32, f32) {
        (self.covariance[(0, 0)], self.covariance[(1, 1)])
    }
}

#[derive(Debug, Clone)]
pub struct KalmanFilter {
    std_weight_position: f32,
    std_weight_velocity: f32,
    motion_mat: na::SMatrix<f32, 8, 8>,
    update_mat: na::SMatrix<f32, 4, 8>,
}

impl KalmanFilter {
    pub fn new(std_weight_position: f32, std_weight_velocity: f32) -> Self {
        let mut motion_mat = na::SMatrix::<f32, 8, 8>::identity();

        for i in 0..NDIM {
            motion_mat[(i, NDIM + i)] = 1.0;
        }

        Self {
            std_weight_position,
            std_weight_velocity,
            motion_mat,
            update_mat: na::SMatrix::<f32, 4, 8>::identity(),
        }
    }

    /// New state from an unassociated measurement, velocities start at zero
    pub fn initiate(&self, measurement: &BBox<Xyah>) -> MotionState {
        let h = measurement.height();
        let (p, v) = (self.std_weight_position, self.std_weight_velocity);

        let mut mean = StateMean::zeros();
        mean.fixed_rows_mut::<NDIM>(0)
            .copy_from_slice(measurement.as_slice());

        let std = StateMean::from([
            2.0 * p * h,
            2.0 * p * h,
            1e-2,
            2.0 * p * h,
            10.0 * v * h,
            10.0 * v * h,
            1e-5,
            10.0 * v * h,
        ]);

        MotionState {
            mean,
            covariance: StateCov::from_diagonal(&std.component_mul(&std)),
        }
    }

    /// Advances `state` one frame; always adds process noise
    pub fn predict(&self, state: &mut MotionState) {
        let h = state.mean[3];
        let (p, v) = (self.std_weight_position, self.std_weight_velocity);

        let std = StateMean::from([
            p * h,
            p * h,
            1e-2,
            p * h,
            v * h,
            v * h,
            1e-5,
            v * h,
        ]);
        let motion_cov = StateCov::from_diagonal(&std.component_mul(&std));

        state.mean = self.motion_mat * state.mean;
        state.covariance =
            self.motion_mat * state.covariance * self.motion_mat.transpose() + motion_cov;
    }

    /// Projects `state` into measurement space, adding observation noise
    pub fn project(&self, state: &MotionState) -> (MeasurementMean, MeasurementCov) {
        let h = state.mean[3];
        let p = self.std_weight_position;

        let std = MeasurementMean::new(p * h, p * h, 1e-1, p * h);
        let innovation_cov = MeasurementCov::from_diagonal(&std.component_mul(&std));

        let mean = self.update_mat * state.mean;
        let covariance =
            self.update_mat * state.covariance * self.update_mat.transpose() + innovation_cov;

        (mean, covariance)
    }

    /// Fuses `measurement` into `state`. Returns `false` and leaves the state
    /// untouched when the innovation covariance is not positive definite.
    pub fn update(&self, state: &mut MotionState, measurement: &BBox<Xyah>) -> bool {
        let (projected_mean, projected_cov) = self.project(state);

        let chol = match projected_cov.cholesky() {
            Some(chol) => chol,
            None => return false,
        };

        // S * K^T = H * P^T, P is symmetric
        let gain_t = chol.solve(&(self.update_mat * state.covariance));
        let gain = gain_t.transpose();

        let z = MeasurementMean::from_column_slice(measurement.as_slice());
        let innovation = z - projected_mean;

        state.mean += gain * innovation;
        state.covariance -= gain * projected_cov * gain_t;

        true
    }

    /// Squared Mahalanobis distance between `state` and `measurement`.
    ///
    /// With `only_position` only the box centre is compared, otherwise the full
    /// `(cx, cy, a, h)` measurement. A degenerate covariance yields `+inf`.
    pub fn gating_distance(
        &self,
        state: &MotionState,
        measurement: &BBox<Xyah>,
        only_position: bool,
    ) -> f32 {
        let (mean, covariance) = self.project(state);
        let z = MeasurementMean::from_column_slice(measurement.as_slice());
        let d = z - mean;

        if only_position {
            let d = na::Vector2::new(d[0], d[1]);
            let cov = na::Matrix2::new(
                covariance[(0, 0)],
                covariance[(0, 1)],
                covariance[(1, 0)],
                covariance[(1, 1)],
            );

            match cov.cholesky() {
                Some(chol) => d.dot(&chol.solve(&d)),
                None => f32::INFINITY,
            }
        } else {
            match covariance.cholesky() {
                Some(chol) => d.dot(&chol.solve(&d)),
                None => f32::INFINITY,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nearly_eq::assert_nearly_eq;

    fn filter() -> KalmanFilter {
        KalmanFilter::new(1. / 20., 1. / 160.)
    }

    #[test]
    fn initiate_sets_zero_velocity_and_scaled_covariance() {
        let kf = filter();
        let state = kf.initiate(&BBox::xyah(1.0, 2.0, 3.0, 4.0));

        assert_eq!(
            state.mean.as_slice(),
            &[1.0, 2.0, 3.0, 4.0, 0.0, 0.0, 0.0, 0.0]
        );

        let expected = [0.16, 0.16, 1.0e-4, 0.16, 6.25e-2, 6.25e-2, 1e-10, 6.25e-2];
        for (i, v) in expected.iter().enumerate() {
            assert_nearly_eq!(state.covariance[(i, i)], *v, 1e-6);
        }
        assert_eq!(state.covariance[(0, 1)], 0.0);
    }

    #[test]
    fn predict_moves_by_velocity() {
        let kf = filter();
        let mut state = kf.initiate(&BBox::xyah(1.0, 2.0, 3.0, 4.0));
        state.mean[4] = 5.0;
        state.mean[5] = 6.0;

        kf.predict(&mut state);

        assert_nearly_eq!(state.mean[0], 6.0, 1e-6);
        assert_nearly_eq!(state.mean[1], 8.0, 1e-6);
        assert_nearly_eq!(state.mean[2], 3.0, 1e-6);
        assert_nearly_eq!(state.mean[3], 4.0, 1e-6);
    }

    #[test]
    fn predict_never_shrinks_position_uncertainty() {
        let kf = filter();
        let mut state = kf.initiate(&BBox::xyah(100.0, 100.0, 0.5, 120.0));
        let mut prev = state.position_variance();

        for _ in 0..50 {
            kf.predict(&mut state);
            let curr = state.position_variance();

            assert!(curr.0 > prev.0);
            assert!(curr.1 > prev.1);
            prev = curr;
        }
    }

    #[test]
    fn update_pulls_towards_measurement_and_reduces_uncertainty() {
        let kf = filter();
        let mut state = kf.initiate(&BBox::xyah(100.0, 100.0, 0.5, 120.0));
        kf.predict(&mut state);
        let before = state.position_variance();

        assert!(kf.update(&mut state, &BBox::xyah(110.0, 100.0, 0.5, 120.0)));

        let after = state.position_variance();
        assert!(state.mean[0] > 100.0 && state.mean[0] < 110.0);
        assert!(after.0 < before.0);
        assert!(after.1 < before.1);
    }

    #[test]
    fn gating_distance_grows_with_offset() {
        let kf = filter();
        let state = kf.initiate(&BBox::xyah(100.0, 100.0, 0.5, 120.0));

        let same = kf.gating_distance(&state, &BBox::xyah(100.0, 100.0, 0.5, 120.0), false);
        let near = kf.gating_distance(&state, &BBox::xyah(102.0, 100.0, 0.5, 120.0), false);
        let far = kf.gating_distance(&state, &BBox::xyah(300.0, 100.0, 0.5, 120.0), false);

        assert_nearly_eq!(same, 0.0, 1e-4);
        assert!(near < crate::math::CHI2INV95[3]);
        assert!(far > crate::math::CHI2INV95[3]);
    }

    #[test]
    fn position_only_gating_ignores_shape() {
        let kf = filter();
        let state = kf.initiate(&BBox::xyah(100.0, 100.0, 0.5, 120.0));
        let reshaped = BBox::xyah(100.0, 100.0, 0.9, 120.0);

        assert_nearly_eq!(kf.gating_distance(&state, &reshaped, true), 0.0, 1e-4);
        assert!(kf.gating_distance(&state, &reshaped, false) > 1.0);
    }

    #[test]
    fn to_box_round_trips_the_initial_measurement() {
        let kf = filter();
        let b = BBox::ltwh(10.0, 20.0, 50.0, 100.0);
        let state = kf.initiate(&b.as_xyah());

        let out = state.to_box();
        assert_nearly_eq!(out.left(), 10.0, 1e-4);
        assert_nearly_eq!(out.top(), 20.0, 1e-4);
        assert_nearly_eq!(out.right(), 60.0, 1e-4);
        assert_nearly_eq!(out.bottom(), 120.0, 1e-4);
    }
}
