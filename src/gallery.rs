use crate::circular_queue::CircularQueue;
use crate::math;
use ndarray::{Array1, ArrayView1};

/// Recent appearance features of one track, newest first.
#[derive(Debug, Clone)]
pub struct Gallery {
    features: CircularQueue<Array1<f32>>,
}

impl Gallery {
    pub fn new(budget: Option<usize>) -> Self {
        Self {
            features: CircularQueue::new(budget),
        }
    }

    /// Stores `feature`, evicting the oldest entry once the budget is exceeded
    #[inline]
    pub fn add(&mut self, feature: Array1<f32>) {
        self.features.push(feature);
    }

    /// Smallest cosine distance between `query` and any stored feature,
    /// `+inf` for an empty gallery.
    pub fn min_distance(&self, query: ArrayView1<'_, f32>) -> f32 {
        self.features
            .iter()
            .filter(|f| f.len() == query.len())
            .map(|f| math::cosine_distance(f.view(), query))
            .fold(f32::INFINITY, f32::min)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    #[inline]
    pub fn budget(&self) -> Option<usize> {
        self.features.capacity()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Array1<f32>> {
        self.features.iter()
    }
}
