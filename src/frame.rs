use crate::bbox::{BBox, Ltwh};
use crate::detection::Detection;
use crate::error::{Error, Result};
use ndarray::Array1;

/// All detections of one video frame
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub detections: Vec<Detection>,
}

impl Frame {
    #[inline]
    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }

    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Assembles a frame from the parallel detector/embedder outputs.
    ///
    /// Any shape problem rejects the whole frame. Degenerate boxes (zero width
    /// or height) are skipped on their own.
    pub fn try_from_parts(
        boxes: &[BBox<Ltwh>],
        scores: &[f32],
        features: &[Array1<f32>],
    ) -> Result<Self> {
        if boxes.len() != scores.len() || boxes.len() != features.len() {
            return Err(Error::malformed(format!(
                "{} boxes, {} scores and {} features",
                boxes.len(),
                scores.len(),
                features.len()
            )));
        }

        if let Some(first) = features.first() {
            if features.iter().any(|f| f.len() != first.len()) {
                return Err(Error::malformed("appearance features differ in length"));
            }
        }

        let mut detections = Vec::with_capacity(boxes.len());

        for ((bbox, &score), feature) in boxes.iter().zip(scores).zip(features) {
            let det = Detection::new(*bbox, score, Some(feature.clone()))?;

            if det.bbox.is_degenerate() {
                log::debug!("skipping degenerate box {:?}", det.bbox.as_slice());
                continue;
            }

            detections.push(det);
        }

        Ok(Self { detections })
    }

    /// Like [`Frame::try_from_parts`], but a malformed frame becomes an empty one
    pub fn from_parts(boxes: &[BBox<Ltwh>], scores: &[f32], features: &[Array1<f32>]) -> Self {
        Self::try_from_parts(boxes, scores, features).unwrap_or_else(|err| {
            log::warn!("{}, treating frame as empty", err);
            Self::empty()
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.detections.len()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Detection> {
        self.detections.iter()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn builds_from_matching_parts() {
        let frame = Frame::from_parts(
            &[BBox::ltwh(0., 0., 10., 20.), BBox::ltwh(50., 0., 10., 20.)],
            &[0.9, 0.8],
            &[arr1(&[1., 0.]), arr1(&[0., 1.])],
        );

        assert_eq!(frame.len(), 2);
    }

    #[test]
    fn mismatched_counts_yield_empty_frame() {
        let frame = Frame::from_parts(
            &[BBox::ltwh(0., 0., 10., 20.), BBox::ltwh(50., 0., 10., 20.)],
            &[0.9],
            &[arr1(&[1., 0.]), arr1(&[0., 1.])],
        );

        assert!(frame.is_empty());
    }

    #[test]
    fn one_malformed_box_rejects_the_frame() {
        let frame = Frame::from_parts(
            &[BBox::ltwh(0., 0., 10., 20.), BBox::ltwh(50., 0., -10., 20.)],
            &[0.9, 0.8],
            &[arr1(&[1., 0.]), arr1(&[0., 1.])],
        );

        assert!(frame.is_empty());
    }

    #[test]
    fn mixed_feature_lengths_yield_empty_frame() {
        let result = Frame::try_from_parts(
            &[BBox::ltwh(0., 0., 10., 20.), BBox::ltwh(50., 0., 10., 20.)],
            &[0.9, 0.8],
            &[arr1(&[1., 0.]), arr1(&[0., 1., 0.])],
        );

        assert!(matches!(result, Err(Error::MalformedInput(_))));
    }

    #[test]
    fn degenerate_boxes_are_skipped() {
        let frame = Frame::from_parts(
            &[BBox::ltwh(0., 0., 0., 20.), BBox::ltwh(50., 0., 10., 20.)],
            &[0.9, 0.8],
            &[arr1(&[1., 0.]), arr1(&[0., 1.])],
        );

        assert_eq!(frame.len(), 1);
        assert_eq!(frame.detections[0].bbox.left(), 50.);
    }
}
