//! Per-frame glue: detect, embed, track and redact around one followed person.

use crate::bbox::{BBox, Ltrb, Ltwh};
use crate::config::{RedactConfig, TrackerConfig};
use crate::detector::{Detector, Embedder};
use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::redact::Redactor;
use crate::{CascadeTracker, Track, Tracking};
use image::RgbImage;
use std::rc::Rc;

/// What happened in one processed frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    pub index: u64,
    pub detections: usize,
    pub live_tracks: usize,
    pub visible_tracks: usize,
    pub target: Option<BBox<Ltrb>>,
}

pub struct Pipeline<D, E> {
    detector: D,
    embedder: E,
    tracker: CascadeTracker,
    redactor: Option<Redactor>,
    target: Option<u32>,
    history: Vec<Option<BBox<Ltrb>>>,
    frames: u64,
}

impl<D: Detector, E: Embedder> Pipeline<D, E> {
    pub fn new(detector: D, embedder: E, config: TrackerConfig) -> Result<Self> {
        Ok(Self {
            detector,
            embedder,
            tracker: CascadeTracker::new(config)?,
            redactor: None,
            target: None,
            history: Vec::new(),
            frames: 0,
        })
    }

    /// Follows track `track_id`
    pub fn with_target(mut self, track_id: u32) -> Self {
        self.target = Some(track_id);
        self
    }

    /// Redacts every frame outside the followed track
    pub fn with_redaction(mut self, config: RedactConfig) -> Result<Self> {
        self.redactor = Some(Redactor::new(config)?);
        Ok(self)
    }

    #[inline]
    pub fn tracker(&self) -> &CascadeTracker {
        &self.tracker
    }

    /// Followed track box for every processed frame, `None` where it was not visible
    #[inline]
    pub fn history(&self) -> &[Option<BBox<Ltrb>>] {
        &self.history
    }

    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Runs one frame through the tracker, then redacts `frame` around the
    /// target if it is visible.
    ///
    /// Collaborator failures are returned before the tracker is touched. A
    /// pipeline without a target still tracks the frame, then reports
    /// [`Error::MissingTrackId`].
    pub fn process_frame(&mut self, frame: &mut RgbImage) -> Result<FrameStats> {
        let detected = self.detector.detect(frame)?;
        let (boxes, scores): (Vec<BBox<Ltwh>>, Vec<f32>) = detected.into_iter().unzip();
        let features = if boxes.is_empty() {
            Vec::new()
        } else {
            self.embedder.embed(frame, &boxes)?
        };

        let dets = Frame::from_parts(&boxes, &scores, &features);

        self.tracker.predict();
        self.tracker.update(&dets);
        self.frames += 1;

        let track_id = self.target.ok_or(Error::MissingTrackId)?;
        let target = self.tracker.visible_box(track_id);

        if let (Some(redactor), Some(bbox)) = (&self.redactor, &target) {
            redactor.redact(frame, bbox);
        }

        self.history.push(target);

        let stats = FrameStats {
            index: self.frames,
            detections: dets.len(),
            live_tracks: self.tracker.len(),
            visible_tracks: self.tracker.visible_tracks().len(),
            target,
        };

        log::debug!(
            "frame {}: {} people, {} tracks, target {}",
            stats.index,
            stats.detections,
            stats.live_tracks,
            if target.is_some() { "visible" } else { "hidden" }
        );

        Ok(stats)
    }

    /// Snapshot of the live tracks after the last frame
    pub fn tracks(&self) -> Rc<[Track]> {
        self.tracker.tracks()
    }
}
