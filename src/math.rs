use ndarray::{Array1, ArrayView1};
use num_traits::Float;

/// Chi-square 0.95 quantiles for 1 to 4 degrees of freedom,
/// the usual Mahalanobis gating bounds.
pub const CHI2INV95: [f32; 4] = [3.8415, 5.9915, 7.8147, 9.4877];

#[inline]
pub fn chi2inv95(dof: usize) -> Option<f32> {
    CHI2INV95.get(dof.checked_sub(1)?).copied()
}

#[inline]
pub fn dot<T: Float>(a: ArrayView1<'_, T>, b: ArrayView1<'_, T>) -> T {
    a.iter()
        .zip(b.iter())
        .fold(T::zero(), |acc, (&x, &y)| acc + x * y)
}

#[inline]
pub fn norm<T: Float>(a: ArrayView1<'_, T>) -> T {
    dot(a, a).sqrt()
}

/// `1 - cos(a, b)`, in `[0, 2]`. A zero vector is treated as orthogonal to everything.
pub fn cosine_distance<T: Float>(a: ArrayView1<'_, T>, b: ArrayView1<'_, T>) -> T {
    let na = norm(a);
    let nb = norm(b);

    if na == T::zero() || nb == T::zero() {
        return T::one();
    }

    let cos = dot(a, b) / (na * nb);

    T::one() - cos.max(-T::one()).min(T::one())
}

/// Scales `v` to unit length, `None` for zero or non-finite vectors
pub fn l2_normalize<T: Float>(v: ArrayView1<'_, T>) -> Option<Array1<T>> {
    let n = norm(v);

    if !n.is_finite() || n == T::zero() {
        return None;
    }

    Some(v.mapv(|x| x / n))
}

/// Converts an OpenCV style odd Gaussian kernel size into the sigma it implies
#[inline]
pub fn sigma_for_kernel(ksize: u32) -> f32 {
    0.3 * ((ksize.max(1) as f32 - 1.0) * 0.5 - 1.0) + 0.8
}
