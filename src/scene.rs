use crate::assignment;
use crate::bbox::{BBox, Ltrb};
use crate::config::TrackerConfig;
use crate::detection::Detection;
use crate::gallery::Gallery;
use crate::kalman_filter::{KalmanFilter, MotionState};
use crate::track::{Track, TrackState};

/// One live identity: its motion estimate, appearance history and counters.
#[derive(Debug, Clone)]
pub struct Tracklet {
    pub id: u32,
    pub state: TrackState,
    pub motion: MotionState,
    pub gallery: Gallery,
    pub hits: u32,
    pub age: u32,
    pub time_since_update: u32,
}

impl Tracklet {
    /// Tentative track seeded from an unmatched detection
    pub fn new(id: u32, kf: &KalmanFilter, det: &Detection, budget: Option<usize>) -> Self {
        let mut gallery = Gallery::new(budget);

        if let Some(feature) = &det.feature {
            gallery.add(feature.clone());
        }

        Self {
            id,
            state: TrackState::Tentative,
            motion: kf.initiate(&det.as_xyah()),
            gallery,
            hits: 1,
            age: 0,
            time_since_update: 0,
        }
    }

    #[inline]
    pub fn predict(&mut self, kf: &KalmanFilter) {
        kf.predict(&mut self.motion);
    }

    /// Applies a matched detection. Returns `true` when this promoted the track.
    pub fn update(&mut self, kf: &KalmanFilter, det: &Detection, n_init: u32) -> bool {
        if !kf.update(&mut self.motion, &det.as_xyah()) {
            log::warn!(
                "track {}: innovation covariance is degenerate, keeping prediction",
                self.id
            );
        }

        if let Some(feature) = &det.feature {
            self.gallery.add(feature.clone());
        }

        self.hits += 1;
        self.age += 1;
        self.time_since_update = 0;

        self.try_confirm(n_init)
    }

    /// No detection this frame
    pub fn mark_missed(&mut self, max_age: u32) {
        self.age += 1;

        match self.state {
            TrackState::Tentative => self.state = TrackState::Deleted,
            TrackState::Confirmed => {
                self.time_since_update += 1;

                if self.time_since_update > max_age {
                    self.state = TrackState::Deleted;
                }
            }
            TrackState::Deleted => (),
        }
    }

    fn try_confirm(&mut self, n_init: u32) -> bool {
        if self.state == TrackState::Tentative && self.hits >= n_init {
            self.state = TrackState::Confirmed;
            return true;
        }

        false
    }

    #[inline]
    pub fn is_confirmed(&self) -> bool {
        self.state == TrackState::Confirmed
    }

    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.state == TrackState::Deleted
    }

    /// Confirmed and not hidden for more than a frame
    #[inline]
    pub fn is_visible(&self) -> bool {
        self.is_confirmed() && self.time_since_update <= 1
    }

    #[inline]
    pub fn to_box(&self) -> BBox<Ltrb> {
        self.motion.to_box()
    }
}

impl From<&Tracklet> for Track {
    fn from(t: &Tracklet) -> Track {
        Track {
            track_id: t.id,
            state: t.state,
            bbox: t.to_box(),
            hits: t.hits,
            age: t.age,
            time_since_update: t.time_since_update,
            visible: t.is_visible(),
        }
    }
}

/// Owns every track of a session and applies the per-frame transitions.
pub struct Scene {
    config: TrackerConfig,
    kf: KalmanFilter,
    tracklets: Vec<Tracklet>,
    next_id: u32,
}

impl Scene {
    /// `config` must already be validated
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            kf: KalmanFilter::new(config.std_weight_position, config.std_weight_velocity),
            config,
            tracklets: Vec::with_capacity(64),
            next_id: 1,
        }
    }

    #[inline]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn predict(&mut self) {
        for t in &mut self.tracklets {
            t.predict(&self.kf);
        }
    }

    pub fn update(&mut self, detections: &[Detection]) {
        let mapping =
            assignment::associate(&self.kf, &self.config, &self.tracklets, detections);

        for &(i, j) in &mapping.matches {
            let t = &mut self.tracklets[i];

            if t.update(&self.kf, &detections[j], self.config.n_init) {
                log::debug!("track {} confirmed", t.id);
            }
        }

        for &i in &mapping.unmatched_tracks {
            self.tracklets[i].mark_missed(self.config.max_age);
        }

        for &j in &mapping.unmatched_detections {
            self.spawn(&detections[j]);
        }

        self.tracklets.retain(|t| {
            if t.is_deleted() {
                log::debug!("track {} deleted after {} frames", t.id, t.age);
            }

            !t.is_deleted()
        });
    }

    fn spawn(&mut self, det: &Detection) {
        let id = self.next_id;
        self.next_id += 1;

        let mut t = Tracklet::new(id, &self.kf, det, self.config.nn_budget);
        if t.try_confirm(self.config.n_init) {
            log::debug!("track {} confirmed on creation", id);
        }

        log::debug!("track {} created at {:?}", id, det.bbox.as_slice());
        self.tracklets.push(t);
    }

    /// Live tracks in creation order
    #[inline]
    pub fn tracklets(&self) -> &[Tracklet] {
        &self.tracklets
    }

    #[inline]
    pub fn get(&self, id: u32) -> Option<&Tracklet> {
        self.tracklets.iter().find(|t| t.id == id)
    }

    /// Identifier the next spawned track will receive
    #[inline]
    pub fn next_id(&self) -> u32 {
        self.next_id
    }

    pub fn tracks(&self) -> Vec<Track> {
        self.tracklets.iter().map(Into::into).collect()
    }
}
