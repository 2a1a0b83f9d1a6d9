use crate::bbox::{BBox, Ltwh};
use crate::error::Error;
use image::RgbImage;
use ndarray::Array1;

/// Turns a frame into scored person boxes
pub trait Detector {
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<(BBox<Ltwh>, f32)>, Error>;
}

/// Turns boxed regions of a frame into appearance embeddings, one per box.
/// Every embedding of a session has the same length.
pub trait Embedder {
    fn embed(&mut self, frame: &RgbImage, boxes: &[BBox<Ltwh>]) -> Result<Vec<Array1<f32>>, Error>;
}

impl<D: Detector + ?Sized> Detector for &mut D {
    #[inline]
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<(BBox<Ltwh>, f32)>, Error> {
        (**self).detect(frame)
    }
}

impl<E: Embedder + ?Sized> Embedder for &mut E {
    #[inline]
    fn embed(&mut self, frame: &RgbImage, boxes: &[BBox<Ltwh>]) -> Result<Vec<Array1<f32>>, Error> {
        (**self).embed(frame, boxes)
    }
}
