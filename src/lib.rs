pub mod assignment;
pub mod bbox;
pub mod config;
pub mod detection;
pub mod detector;
pub mod error;
pub mod frame;
pub mod gallery;
pub mod kalman_filter;
pub mod math;
pub mod pipeline;
pub mod redact;
pub mod scene;
pub mod track;

mod circular_queue;

pub use config::{RedactConfig, RedactMode, TrackerConfig};
pub use detection::Detection;
pub use detector::{Detector, Embedder};
pub use error::{Error, Result};
pub use frame::Frame;
pub use pipeline::Pipeline;
pub use redact::Redactor;
pub use track::{Track, TrackState};

use bbox::{BBox, Ltrb};
use std::borrow::Cow;
use std::rc::Rc;

pub trait Tracking {
    /// Advances every live track's motion estimate by one frame
    fn predict(&mut self);

    /// Associates `frame` with the predicted tracks and applies the lifecycle
    fn update(&mut self, frame: &Frame);

    /// Every live track after the last update
    fn tracks(&self) -> Rc<[Track]>;
}

/// Multi-object tracker running one `predict` / `update` cycle per frame.
pub struct CascadeTracker {
    scene: scene::Scene,
    feature_len: Option<usize>,
}

impl CascadeTracker {
    /// Fails when `config` is invalid, the session never starts in that case
    pub fn new(config: TrackerConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            scene: scene::Scene::new(config),
            feature_len: None,
        })
    }

    #[inline]
    pub fn config(&self) -> &TrackerConfig {
        self.scene.config()
    }

    /// Confirmed tracks matched in the current or the previous frame, ordered by id
    pub fn visible_tracks(&self) -> Vec<Track> {
        self.scene
            .tracklets()
            .iter()
            .filter(|t| t.is_visible())
            .map(Into::into)
            .collect()
    }

    /// Box of track `track_id` if that track is visible right now
    pub fn visible_box(&self, track_id: u32) -> Option<BBox<Ltrb>> {
        self.scene
            .get(track_id)
            .filter(|t| t.is_visible())
            .map(|t| t.to_box())
    }

    /// Live track `track_id`, visible or not
    pub fn track(&self, track_id: u32) -> Option<Track> {
        self.scene.get(track_id).map(Into::into)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.scene.tracklets().is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.scene.tracklets().len()
    }

    #[inline]
    pub fn next_id(&self) -> u32 {
        self.scene.next_id()
    }

    /// The session wide feature length is fixed by the first feature seen
    fn check_features(&mut self, frame: &Frame) -> Result<()> {
        let mut expected = self.feature_len;

        for len in frame.iter().filter_map(Detection::feature_len) {
            match expected {
                Some(e) if e != len => {
                    return Err(Error::malformed(format!(
                        "appearance feature of length {}, session uses {}",
                        len, e
                    )));
                }
                _ => expected = Some(len),
            }
        }

        self.feature_len = expected;

        Ok(())
    }
}

/// Boxes with zero width or height carry no usable motion measurement
fn drop_degenerate(frame: &Frame) -> Cow<'_, [Detection]> {
    if !frame.iter().any(|d| d.bbox.is_degenerate()) {
        return Cow::Borrowed(&frame.detections);
    }

    Cow::Owned(
        frame
            .iter()
            .filter(|d| {
                if d.bbox.is_degenerate() {
                    log::debug!("skipping degenerate box {:?}", d.bbox.as_slice());
                }

                !d.bbox.is_degenerate()
            })
            .cloned()
            .collect(),
    )
}

impl Tracking for CascadeTracker {
    #[inline]
    fn predict(&mut self) {
        self.scene.predict();
    }

    fn update(&mut self, frame: &Frame) {
        match self.check_features(frame) {
            Ok(()) => self.scene.update(&drop_degenerate(frame)),
            Err(err) => {
                log::warn!("{}, treating frame as empty", err);
                self.scene.update(&[]);
            }
        }
    }

    #[inline]
    fn tracks(&self) -> Rc<[Track]> {
        self.scene.tracks().into_boxed_slice().into()
    }
}
