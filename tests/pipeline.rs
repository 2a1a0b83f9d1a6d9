use std::collections::VecDeque;

use deeptrack::bbox::{BBox, Ltwh};
use deeptrack::{Detector, Embedder, Error, Pipeline, RedactConfig, RedactMode, TrackerConfig};
use image::{Rgb, RgbImage};
use ndarray::{arr1, Array1};

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Replays a fixed list of per-frame detections
struct Replay(VecDeque<Vec<(BBox<Ltwh>, f32)>>);

impl Replay {
    fn repeat(boxes: Vec<(BBox<Ltwh>, f32)>, frames: usize) -> Self {
        Self((0..frames).map(|_| boxes.clone()).collect())
    }
}

impl Detector for Replay {
    fn detect(&mut self, _frame: &RgbImage) -> Result<Vec<(BBox<Ltwh>, f32)>, Error> {
        Ok(self.0.pop_front().unwrap_or_default())
    }
}

/// Embeds a box by which half of the frame it starts in
struct ByHalf;

impl Embedder for ByHalf {
    fn embed(&mut self, frame: &RgbImage, boxes: &[BBox<Ltwh>]) -> Result<Vec<Array1<f32>>, Error> {
        let half = frame.width() as f32 / 2.0;

        Ok(boxes
            .iter()
            .map(|b| {
                if b.left() < half {
                    arr1(&[1.0, 0.0])
                } else {
                    arr1(&[0.0, 1.0])
                }
            })
            .collect())
    }
}

struct Failing;

impl Detector for Failing {
    fn detect(&mut self, _frame: &RgbImage) -> Result<Vec<(BBox<Ltwh>, f32)>, Error> {
        Err(Error::Detector("model not loaded".into()))
    }
}

/// Always returns one embedding too few
struct Short;

impl Embedder for Short {
    fn embed(&mut self, _frame: &RgbImage, boxes: &[BBox<Ltwh>]) -> Result<Vec<Array1<f32>>, Error> {
        Ok(boxes.iter().skip(1).map(|_| arr1(&[1.0, 0.0])).collect())
    }
}

fn person() -> Vec<(BBox<Ltwh>, f32)> {
    vec![(BBox::ltwh(40.0, 40.0, 40.0, 80.0), 0.95)]
}

fn white() -> RgbImage {
    RgbImage::from_pixel(200, 200, WHITE)
}

fn masking() -> RedactConfig {
    RedactConfig {
        mode: RedactMode::Mask,
        expansion: 0.0,
    }
}

#[test]
fn target_is_redacted_once_confirmed() {
    let mut pipeline = Pipeline::new(Replay::repeat(person(), 3), ByHalf, TrackerConfig::default())
        .unwrap()
        .with_target(1)
        .with_redaction(masking())
        .unwrap();

    for _ in 0..2 {
        let mut frame = white();
        let stats = pipeline.process_frame(&mut frame).unwrap();

        assert_eq!(stats.detections, 1);
        assert!(stats.target.is_none());
        assert_eq!(*frame.get_pixel(0, 0), WHITE);
    }

    let mut frame = white();
    let stats = pipeline.process_frame(&mut frame).unwrap();

    assert_eq!(stats.index, 3);
    assert_eq!(stats.visible_tracks, 1);
    assert!(stats.target.is_some());
    assert_eq!(*frame.get_pixel(0, 0), BLACK);
    assert_eq!(*frame.get_pixel(199, 199), BLACK);
    assert_eq!(*frame.get_pixel(60, 80), WHITE);

    let history = pipeline.history();
    assert_eq!(history.len(), 3);
    assert!(history[0].is_none() && history[1].is_none());
    assert!(history[2].is_some());
}

#[test]
fn unknown_target_leaves_frames_untouched() {
    let mut pipeline = Pipeline::new(Replay::repeat(person(), 4), ByHalf, TrackerConfig::default())
        .unwrap()
        .with_target(7)
        .with_redaction(masking())
        .unwrap();

    for _ in 0..4 {
        let mut frame = white();
        let stats = pipeline.process_frame(&mut frame).unwrap();

        assert!(stats.target.is_none());
        assert_eq!(*frame.get_pixel(0, 0), WHITE);
    }

    assert_eq!(pipeline.tracks().len(), 1);
    assert!(pipeline.history().iter().all(Option::is_none));
}

#[test]
fn missing_target_still_tracks_the_frame() {
    let mut pipeline =
        Pipeline::new(Replay::repeat(person(), 1), ByHalf, TrackerConfig::default()).unwrap();
    let mut frame = white();

    assert!(matches!(
        pipeline.process_frame(&mut frame),
        Err(Error::MissingTrackId)
    ));
    assert_eq!(pipeline.frames(), 1);
    assert_eq!(pipeline.tracker().len(), 1);
    assert!(pipeline.history().is_empty());
}

#[test]
fn detector_failure_is_returned_before_tracking() {
    let mut pipeline = Pipeline::new(Failing, ByHalf, TrackerConfig::default())
        .unwrap()
        .with_target(1);
    let mut frame = white();

    assert!(matches!(
        pipeline.process_frame(&mut frame),
        Err(Error::Detector(_))
    ));
    assert_eq!(pipeline.frames(), 0);
}

#[test]
fn short_embedder_output_becomes_an_empty_frame() {
    let mut pipeline = Pipeline::new(Replay::repeat(person(), 2), Short, TrackerConfig::default())
        .unwrap()
        .with_target(1);
    let mut frame = white();

    let stats = pipeline.process_frame(&mut frame).unwrap();

    assert_eq!(stats.detections, 0);
    assert_eq!(stats.live_tracks, 0);
    assert!(pipeline.tracker().is_empty());
}

#[test]
fn borrowed_collaborators_can_drive_a_pipeline() {
    let mut detector = Replay::repeat(person(), 1);
    let mut embedder = ByHalf;

    let mut pipeline = Pipeline::new(&mut detector, &mut embedder, TrackerConfig::default())
        .unwrap()
        .with_target(1);
    let mut frame = white();

    pipeline.process_frame(&mut frame).unwrap();
    assert_eq!(pipeline.tracks()[0].track_id, 1);

    drop(pipeline);
    assert!(detector.0.is_empty());
}

#[test]
fn invalid_redaction_is_rejected() {
    let config = RedactConfig {
        mode: RedactMode::Blur { sigma: 0.0 },
        expansion: 0.1,
    };

    let result = Pipeline::new(Replay::repeat(person(), 1), ByHalf, TrackerConfig::default())
        .unwrap()
        .with_redaction(config);

    assert!(matches!(result, Err(Error::InvalidConfig { .. })));
}
