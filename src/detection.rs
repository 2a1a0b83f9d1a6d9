use crate::bbox::{BBox, Ltrb, Ltwh, Xyah};
use crate::error::{Error, Result};
use crate::math;
use ndarray::Array1;

/// A bounding box detection in a single image.
///
/// `bbox` is `(left, top, width, height)` in pixels, `confidence` is the
/// detector score and `feature`, when present, is the unit length appearance
/// embedding of the boxed image region.
#[derive(Debug, Clone)]
pub struct Detection {
    pub bbox: BBox<Ltwh>,
    pub confidence: f32,
    pub feature: Option<Array1<f32>>,
}

impl Detection {
    /// Validates the box and score and L2-normalizes the feature
    pub fn new(bbox: BBox<Ltwh>, confidence: f32, feature: Option<Array1<f32>>) -> Result<Self> {
        if !bbox.is_valid() {
            return Err(Error::malformed(format!("invalid box {:?}", bbox.as_slice())));
        }

        if !confidence.is_finite() {
            return Err(Error::malformed(format!("invalid score {}", confidence)));
        }

        let feature = match feature {
            Some(f) => Some(math::l2_normalize(f.view()).ok_or_else(|| {
                Error::malformed("appearance feature is empty, zero or not finite")
            })?),
            None => None,
        };

        Ok(Self {
            bbox,
            confidence,
            feature,
        })
    }

    #[inline]
    pub fn as_xyah(&self) -> BBox<Xyah> {
        self.bbox.as_xyah()
    }

    #[inline]
    pub fn as_ltrb(&self) -> BBox<Ltrb> {
        self.bbox.as_ltrb()
    }

    #[inline]
    pub fn feature_len(&self) -> Option<usize> {
        self.feature.as_ref().map(|f| f.len())
    }
}
