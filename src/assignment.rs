//! Detection to track association: a matching cascade over appearance with
//! motion gating, followed by an IoU pass over whatever is left.

use std::collections::BTreeMap;

use crate::config::TrackerConfig;
use crate::detection::Detection;
use crate::kalman_filter::KalmanFilter;
use crate::scene::Tracklet;

use munkres::{solve_assignment, WeightMatrix};

/// Cost of a pairing that must never be matched
pub const INFEASIBLE: f32 = 1e5;

const PADDING: f32 = 1e5;

/// A view on a subset of a slice that remembers the original positions
pub struct IndexedSlice<'a, T> {
    pub slice: &'a [T],
    indexes: Vec<usize>,
}

impl<'a, T> IndexedSlice<'a, T> {
    pub fn new_with_indexes(slice: &'a [T], indexes: Vec<usize>) -> Self {
        Self { slice, indexes }
    }

    /// Position in the underlying slice of the `idx`-th element of the view
    #[inline]
    pub fn get_index(&self, idx: usize) -> usize {
        self.indexes[idx]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    #[inline]
    pub fn into_indexes(self) -> Vec<usize> {
        self.indexes
    }
}

impl<'a, T> std::ops::Index<usize> for IndexedSlice<'a, T> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.slice[self.indexes[index]]
    }
}

/// Outcome of one frame's association, indexes refer to the input slices
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Association {
    /// `(track, detection)` pairs
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

struct Matching {
    matches: Vec<(usize, usize, f32)>,
    unmatched_tracks: Vec<usize>,
    unmatched_detections: Vec<usize>,
}

/// Optimal assignment between `tracks` and `dets` under `cost`.
///
/// Costs above `max_cost` are clamped to just above it before solving and the
/// resulting pairs are rejected, so infeasible entries never bend the optimum.
fn min_cost_matching<T, D, C>(
    cost: C,
    max_cost: f32,
    tracks: IndexedSlice<'_, T>,
    dets: IndexedSlice<'_, D>,
) -> Matching
where
    C: Fn(&T, &D) -> f32,
{
    if tracks.is_empty() || dets.is_empty() {
        return Matching {
            matches: Vec::new(),
            unmatched_tracks: tracks.into_indexes(),
            unmatched_detections: dets.into_indexes(),
        };
    }

    let (rows, cols) = (tracks.len(), dets.len());
    let ceiling = max_cost + 1e-5;

    let mut costs = Vec::with_capacity(rows * cols);
    for r in 0..rows {
        for c in 0..cols {
            let value = cost(&tracks[r], &dets[c]);

            costs.push(if value.is_finite() && value <= max_cost {
                value
            } else {
                ceiling
            });
        }
    }

    let n = rows.max(cols);
    let mut mat = WeightMatrix::from_fn(n, |(r, c)| {
        if r < rows && c < cols {
            costs[r * cols + c]
        } else {
            PADDING
        }
    });

    let mut track_taken = vec![false; rows];
    let mut det_taken = vec![false; cols];
    let mut matches = Vec::new();

    match solve_assignment(&mut mat) {
        Ok(positions) => {
            for pos in positions {
                if pos.row >= rows || pos.column >= cols {
                    continue;
                }

                let value = costs[pos.row * cols + pos.column];
                if value > max_cost {
                    continue;
                }

                track_taken[pos.row] = true;
                det_taken[pos.column] = true;
                matches.push((
                    tracks.get_index(pos.row),
                    dets.get_index(pos.column),
                    value,
                ));
            }
        }
        Err(err) => {
            log::warn!("assignment could not be solved: {:?}", err);
        }
    }

    Matching {
        matches,
        unmatched_tracks: (0..rows)
            .filter(|&r| !track_taken[r])
            .map(|r| tracks.get_index(r))
            .collect(),
        unmatched_detections: (0..cols)
            .filter(|&c| !det_taken[c])
            .map(|c| dets.get_index(c))
            .collect(),
    }
}

/// Appearance distance between the track gallery and the detection feature,
/// or [`INFEASIBLE`] when either has no appearance or the detection lies
/// outside the track's motion gate.
pub fn gated_appearance_cost(
    kf: &KalmanFilter,
    config: &TrackerConfig,
    track: &Tracklet,
    det: &Detection,
) -> f32 {
    let feature = match &det.feature {
        Some(feature) => feature,
        None => return INFEASIBLE,
    };

    let distance = track.gallery.min_distance(feature.view());
    if !distance.is_finite() {
        return INFEASIBLE;
    }

    let gate = kf.gating_distance(&track.motion, &det.as_xyah(), config.gate_position_only);
    if !(gate <= config.gating_threshold) {
        return INFEASIBLE;
    }

    distance
}

/// `1 - IoU` between the predicted track box and the detection, disjoint boxes are infeasible
pub fn iou_cost(track: &Tracklet, det: &Detection) -> f32 {
    let iou = track.to_box().iou(&det.as_ltrb());

    if iou > 0.0 {
        1.0 - iou
    } else {
        INFEASIBLE
    }
}

/// Matches `detections` to the (already predicted) `tracks`.
///
/// Tracks are split into tiers by `time_since_update`, freshest first; each
/// tier claims from the detections left over by the previous ones using the
/// gated appearance cost. Tracks and detections still unmatched after the
/// cascade get a final pass on box overlap alone.
pub fn associate(
    kf: &KalmanFilter,
    config: &TrackerConfig,
    tracks: &[Tracklet],
    detections: &[Detection],
) -> Association {
    let mut tiers: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (idx, track) in tracks.iter().enumerate() {
        tiers.entry(track.time_since_update).or_default().push(idx);
    }

    let mut matches = Vec::new();
    let mut leftover = Vec::new();
    let mut unmatched_detections: Vec<usize> = (0..detections.len()).collect();

    for (_, tier) in tiers {
        if unmatched_detections.is_empty() {
            leftover.extend(tier);
            continue;
        }

        let matching = min_cost_matching(
            |t: &Tracklet, d: &Detection| gated_appearance_cost(kf, config, t, d),
            config.max_cosine_distance,
            IndexedSlice::new_with_indexes(tracks, tier),
            IndexedSlice::new_with_indexes(detections, unmatched_detections),
        );

        matches.extend(matching.matches.into_iter().map(|(t, d, _)| (t, d)));
        leftover.extend(matching.unmatched_tracks);
        unmatched_detections = matching.unmatched_detections;
    }

    leftover.sort_unstable();

    let matching = min_cost_matching(
        iou_cost,
        1.0 - config.min_iou,
        IndexedSlice::new_with_indexes(tracks, leftover),
        IndexedSlice::new_with_indexes(detections, unmatched_detections),
    );

    matches.extend(matching.matches.into_iter().map(|(t, d, _)| (t, d)));

    Association {
        matches,
        unmatched_tracks: matching.unmatched_tracks,
        unmatched_detections: matching.unmatched_detections,
    }
}
