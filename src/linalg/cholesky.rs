#![allow(non_snake_case)]

//! Lower triangular Cholesky factorisation.
//!
//! LL' factorisation of a symmetric positive definite matrix M, where L is lower triangular.
//!
//! Storage:
//! lower_triangle(M) = L, strict_upper_triangle(M) zeroed.

use nalgebra as na;
use na::{Dim, Matrix, RealField};
use na::storage::{Storage, StorageMut};

use super::{check_shape, MatrixError, MatrixResult};

/// In place lower triangular Cholesky factor of a positive definite matrix M.
///
/// Input: M, strict upper triangle of M is ignored in computation
///
/// Output: M as L, such that L*L' equals the original M. Only valid if the result is Ok,
/// on failure the columns before the failing column have already been overwritten.
///
/// Return: reciprocal condition number estimate of the original M
pub fn cholesky_lower<N, R, C, S>(M: &mut Matrix<N, R, C, S>) -> MatrixResult<N>
    where N: RealField, R: Dim, C: Dim, S: StorageMut<N, R, C>
{
    let n = M.nrows();
    check_shape("cholesky_lower", (n, n), M.shape())?;

    for j in 0..n {
        let mut d = M[(j, j)];
        for k in 0..j {
            let t = M[(j, k)];
            d -= t * t;
        }
        // Not positive (or NaN)
        if !(d > N::zero()) {
            return Err(MatrixError::NotPositiveDefinite { column: j });
        }
        d = d.sqrt();
        M[(j, j)] = d;

        for i in j + 1..n {
            let mut e = M[(i, j)];
            for k in 0..j {
                e -= M[(i, k)] * M[(j, k)];
            }
            M[(i, j)] = e / d;
        }
    }

    for j in 1..n {
        for i in 0..j {
            M[(i, j)] = N::zero();
        }
    }

    Ok(factor_rcond(M))
}

/// Estimate the reciprocal condition number of LL' from the diagonal of L.
///
/// The rcond of the diagonal is min/max, squared to give the rcond of the original matrix.
/// Defined to be 0 for an empty matrix.
fn factor_rcond<N, R, C, S>(L: &Matrix<N, R, C, S>) -> N
    where N: RealField, R: Dim, C: Dim, S: Storage<N, R, C>
{
    if L.nrows() == 0 {
        return N::zero();
    }
    let mut mind = L[(0, 0)];
    let mut maxd = mind;
    for i in 1..L.nrows() {
        let d = L[(i, i)];
        if d < mind {
            mind = d;
        }
        if d > maxd {
            maxd = d;
        }
    }
    let rcond = mind / maxd;
    rcond * rcond
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use na::{DMatrix, Matrix2, Matrix3};

    #[test]
    fn factor_recomposes() {
        let m = Matrix3::new(4., 2., 0.6, 2., 5., 1., 0.6, 1., 3.);
        let mut l = m;
        let rcond = cholesky_lower(&mut l).unwrap();
        assert!(rcond > 0. && rcond <= 1.);
        assert_relative_eq!(l[(0, 1)], 0.);
        assert_relative_eq!(l[(0, 0)], 2.);
        assert_relative_eq!(l * l.transpose(), m, epsilon = 1e-12);
    }

    #[test]
    fn matches_nalgebra() {
        let m = DMatrix::from_row_slice(2, 2, &[2., -1., -1., 2.]);
        let mut l = m.clone();
        cholesky_lower(&mut l).unwrap();
        assert_relative_eq!(l, m.cholesky().unwrap().l(), epsilon = 1e-12);
    }

    #[test]
    fn rejects_indefinite() {
        let mut m = Matrix2::new(1., 2., 2., 1.);
        assert_eq!(cholesky_lower(&mut m), Err(MatrixError::NotPositiveDefinite { column: 1 }));

        let mut semi = Matrix2::new(1., 0., 0., 0.);
        assert_eq!(cholesky_lower(&mut semi), Err(MatrixError::NotPositiveDefinite { column: 1 }));

        let mut nan = Matrix2::new(f64::NAN, 0., 0., 1.);
        assert_eq!(cholesky_lower(&mut nan), Err(MatrixError::NotPositiveDefinite { column: 0 }));
    }
}
