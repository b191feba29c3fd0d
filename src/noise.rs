#![allow(non_snake_case)]

//! Additive noise models.
//!
//! Linear Noise models are represented as structs. The filter takes its process and measurement noise
//! covariances as [`CorrelatedNoise`], the other representations convert into it.

use nalgebra as na;
use na::{allocator::Allocator, DefaultAllocator, Dim, MatrixMN, MatrixN, RealField, U1, VectorN};
use na::storage::Storage;
use rand_core::RngCore;
use rand_distr::{Distribution, StandardNormal};

use crate::linalg::{self, MatrixResult};

/// Independent additive noise, one variance per dimension.
pub struct UncorrelatedNoise<N: RealField, QD: Dim>
    where
        DefaultAllocator: Allocator<N, QD>,
{
    /// Variances
    pub q: VectorN<N, QD>,
}

/// Additive noise with a full covariance matrix.
///
/// The form taken by the filter for its process and measurement noise.
#[derive(PartialEq, Clone)]
pub struct CorrelatedNoise<N: RealField, D: Dim>
    where
        DefaultAllocator: Allocator<N, D, D>,
{
    /// Covariance, symmetric positive semi-definite
    pub Q: MatrixN<N, D>,
}

/// Additive noise entering the system through a coupling matrix.
///
/// Independent sources with variances q are coupled into the D dimensions by G, the covariance is G.q.G'.
pub struct CoupledNoise<N: RealField, D: Dim, QD: Dim>
    where
        DefaultAllocator: Allocator<N, D, QD> + Allocator<N, QD>,
{
    /// Source variances
    pub q: VectorN<N, QD>,
    /// Coupling of each source into the system
    pub G: MatrixMN<N, D, QD>,
}

impl<N: RealField, D: Dim> CorrelatedNoise<N, D>
    where
        DefaultAllocator: Allocator<N, D, D> + Allocator<N, D>,
{
    /// The covariance G.q.G' of coupled noise.
    pub fn from_coupled<QD: Dim>(coupled: &CoupledNoise<N, D, QD>) -> Self
        where
            DefaultAllocator: Allocator<N, D, QD> + Allocator<N, QD>,
    {
        let d = coupled.G.data.shape().0;
        let mut Q = MatrixN::zeros_generic(d, d);
        for k in 0..coupled.q.nrows() {
            Q.ger(coupled.q[k], &coupled.G.column(k), &coupled.G.column(k), N::one());
        }
        CorrelatedNoise { Q }
    }

    /// The diagonal covariance of independent noise.
    pub fn from_uncorrelated(uncorrelated: &UncorrelatedNoise<N, D>) -> Self {
        CorrelatedNoise { Q: MatrixN::from_diagonal(&uncorrelated.q) }
    }

    /// A sampler drawing zero mean Gaussian noise with covariance Q.
    ///
    /// Q must be positive definite.
    pub fn sampler(&self) -> MatrixResult<NoiseSampler<N, D>> {
        let mut L = self.Q.clone();
        linalg::cholesky_lower(&mut L)?;
        Ok(NoiseSampler { L })
    }
}

/// Draws correlated noise samples as L.s where L is the lower Cholesky factor of the covariance
/// and s is distributed as standard normal.
pub struct NoiseSampler<N: RealField, D: Dim>
    where
        DefaultAllocator: Allocator<N, D, D>,
{
    L: MatrixN<N, D>,
}

impl<N: RealField, D: Dim> NoiseSampler<N, D>
    where
        DefaultAllocator: Allocator<N, D, D> + Allocator<N, D>,
{
    pub fn sample<R: RngCore>(&self, rng: &mut R) -> VectorN<N, D> {
        let d = self.L.data.shape().0;
        let s = VectorN::<N, D>::from_fn_generic(d, U1, |_, _| {
            let n: f64 = StandardNormal.sample(&mut *rng);
            na::convert(n)
        });
        &self.L * s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use na::{Matrix2, Vector1, Vector2, Matrix2x1};
    use rand::SeedableRng;

    #[test]
    fn coupled_noise_is_gqg() {
        let coupled = CoupledNoise { q: Vector1::new(0.5), G: Matrix2x1::new(1., 2.) };
        let correlated = CorrelatedNoise::from_coupled(&coupled);
        assert_relative_eq!(correlated.Q, Matrix2::new(0.5, 1., 1., 2.));

        let diagonal = CorrelatedNoise::from_uncorrelated(&UncorrelatedNoise { q: Vector2::new(1., 3.) });
        assert_relative_eq!(diagonal.Q, Matrix2::new(1., 0., 0., 3.));
    }

    #[test]
    fn samples_have_the_noise_covariance() {
        let noise = CorrelatedNoise { Q: Matrix2::new(2., 0.5, 0.5, 1.) };
        let sampler = noise.sampler().unwrap();
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);

        let count = 20000;
        let mut sum = Matrix2::<f64>::zeros();
        for _ in 0..count {
            let s = sampler.sample(&mut rng);
            sum += s * s.transpose();
        }
        let estimate = sum / count as f64;
        assert_relative_eq!(estimate, noise.Q, epsilon = 0.1);
    }

    #[test]
    fn sampler_needs_positive_definite() {
        let noise = CorrelatedNoise { Q: Matrix2::new(1., 0., 0., -1.) };
        assert!(noise.sampler().is_err());
    }
}
