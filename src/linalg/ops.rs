#![allow(non_snake_case)]

//! Elementwise and product operations.
//!
//! Operands are any nalgebra matrices (owned or slices). Shapes are checked at run time so that
//! `Dynamic` dimensioned buffers are validated the same way as fixed ones.

use nalgebra as na;
use na::{Dim, Matrix, RealField};
use na::storage::{Storage, StorageMut};

use super::{check_shape, MatrixError, MatrixResult};

/// Copy `src` into `dst`.
pub fn copy<N, R1, C1, S1, R2, C2, S2>(dst: &mut Matrix<N, R1, C1, S1>, src: &Matrix<N, R2, C2, S2>) -> MatrixResult
    where
        N: RealField,
        R1: Dim, C1: Dim, S1: StorageMut<N, R1, C1>,
        R2: Dim, C2: Dim, S2: Storage<N, R2, C2>
{
    check_shape("copy", dst.shape(), src.shape())?;

    for j in 0..dst.ncols() {
        for i in 0..dst.nrows() {
            dst[(i, j)] = src[(i, j)];
        }
    }
    Ok(())
}

/// Fill `m` with zeros. Cannot fail.
pub fn zero<N, R, C, S>(m: &mut Matrix<N, R, C, S>)
    where N: RealField, R: Dim, C: Dim, S: StorageMut<N, R, C>
{
    m.fill(N::zero());
}

/// Multiply `m` by the scalar `s` in place. Cannot fail.
pub fn scale<N, R, C, S>(m: &mut Matrix<N, R, C, S>, s: N)
    where N: RealField, R: Dim, C: Dim, S: StorageMut<N, R, C>
{
    for j in 0..m.ncols() {
        for i in 0..m.nrows() {
            m[(i, j)] *= s;
        }
    }
}

/// a += b
pub fn add<N, R1, C1, S1, R2, C2, S2>(a: &mut Matrix<N, R1, C1, S1>, b: &Matrix<N, R2, C2, S2>) -> MatrixResult
    where
        N: RealField,
        R1: Dim, C1: Dim, S1: StorageMut<N, R1, C1>,
        R2: Dim, C2: Dim, S2: Storage<N, R2, C2>
{
    check_shape("add", a.shape(), b.shape())?;

    for j in 0..a.ncols() {
        for i in 0..a.nrows() {
            a[(i, j)] += b[(i, j)];
        }
    }
    Ok(())
}

/// a -= b
pub fn sub<N, R1, C1, S1, R2, C2, S2>(a: &mut Matrix<N, R1, C1, S1>, b: &Matrix<N, R2, C2, S2>) -> MatrixResult
    where
        N: RealField,
        R1: Dim, C1: Dim, S1: StorageMut<N, R1, C1>,
        R2: Dim, C2: Dim, S2: Storage<N, R2, C2>
{
    check_shape("sub", a.shape(), b.shape())?;

    for j in 0..a.ncols() {
        for i in 0..a.nrows() {
            a[(i, j)] -= b[(i, j)];
        }
    }
    Ok(())
}

/// out = a * b
pub fn mul<N, R1, C1, S1, R2, C2, S2, R3, C3, S3>(
    a: &Matrix<N, R1, C1, S1>,
    b: &Matrix<N, R2, C2, S2>,
    out: &mut Matrix<N, R3, C3, S3>,
) -> MatrixResult
    where
        N: RealField,
        R1: Dim, C1: Dim, S1: Storage<N, R1, C1>,
        R2: Dim, C2: Dim, S2: Storage<N, R2, C2>,
        R3: Dim, C3: Dim, S3: StorageMut<N, R3, C3>
{
    check_shape("mul", (a.ncols(), b.ncols()), b.shape())?;
    check_shape("mul", (a.nrows(), b.ncols()), out.shape())?;

    for i in 0..a.nrows() {
        for j in 0..b.ncols() {
            let mut e = N::zero();
            for k in 0..a.ncols() {
                e += a[(i, k)] * b[(k, j)];
            }
            out[(i, j)] = e;
        }
    }
    Ok(())
}

/// out = a * b' where the second operand is implicitly transposed.
pub fn mul_tr<N, R1, C1, S1, R2, C2, S2, R3, C3, S3>(
    a: &Matrix<N, R1, C1, S1>,
    b: &Matrix<N, R2, C2, S2>,
    out: &mut Matrix<N, R3, C3, S3>,
) -> MatrixResult
    where
        N: RealField,
        R1: Dim, C1: Dim, S1: Storage<N, R1, C1>,
        R2: Dim, C2: Dim, S2: Storage<N, R2, C2>,
        R3: Dim, C3: Dim, S3: StorageMut<N, R3, C3>
{
    check_shape("mul_tr", (b.nrows(), a.ncols()), b.shape())?;
    check_shape("mul_tr", (a.nrows(), b.nrows()), out.shape())?;

    for i in 0..a.nrows() {
        for j in 0..b.nrows() {
            let mut e = N::zero();
            for k in 0..a.ncols() {
                e += a[(i, k)] * b[(j, k)];
            }
            out[(i, j)] = e;
        }
    }
    Ok(())
}

/// Fill the square matrix `m` with the identity.
pub fn identity<N, R, C, S>(m: &mut Matrix<N, R, C, S>) -> MatrixResult
    where N: RealField, R: Dim, C: Dim, S: StorageMut<N, R, C>
{
    check_shape("identity", (m.nrows(), m.nrows()), m.shape())?;
    m.fill_with_identity();
    Ok(())
}

/// In place Gauss-Jordan inversion with row equilibration and partial pivoting.
///
/// Input: M square matrix, destroyed by the elimination. I must hold the identity of the same size.
///
/// Output: I holds inv(M), only meaningful if the result is Ok.
///
/// Rows are first scaled to a largest magnitude of one, so rows in disparate units are treated alike.
/// A zero row, or a scaled pivot no larger than epsilon, is treated as singular.
pub fn invert<N, R1, C1, S1, R2, C2, S2>(M: &mut Matrix<N, R1, C1, S1>, I: &mut Matrix<N, R2, C2, S2>) -> MatrixResult
    where
        N: RealField,
        R1: Dim, C1: Dim, S1: StorageMut<N, R1, C1>,
        R2: Dim, C2: Dim, S2: StorageMut<N, R2, C2>
{
    let n = M.nrows();
    check_shape("invert", (n, n), M.shape())?;
    check_shape("invert", (n, n), I.shape())?;

    // Equilibrate, each row of M and I is divided by the largest magnitude element of the M row
    for r in 0..n {
        let mut largest = N::zero();
        for j in 0..n {
            // NaN never compares greater and is caught as a zero pivot below
            let e = M[(r, j)].abs();
            if e > largest {
                largest = e;
            }
        }
        if largest.is_zero() {
            return Err(MatrixError::Singular { pivot: r });
        }
        let s = N::one() / largest;
        for j in 0..n {
            M[(r, j)] *= s;
            I[(r, j)] *= s;
        }
    }

    for col in 0..n {
        // Partial pivot
        let mut pivot_row = col;
        let mut pivot = M[(col, col)].abs();
        for r in col + 1..n {
            let e = M[(r, col)].abs();
            if e > pivot {
                pivot = e;
                pivot_row = r;
            }
        }
        if !(pivot > N::default_epsilon()) {
            return Err(MatrixError::Singular { pivot: col });
        }
        if pivot_row != col {
            for j in 0..n {
                let t = M[(col, j)];
                M[(col, j)] = M[(pivot_row, j)];
                M[(pivot_row, j)] = t;
                let t = I[(col, j)];
                I[(col, j)] = I[(pivot_row, j)];
                I[(pivot_row, j)] = t;
            }
        }

        let d = N::one() / M[(col, col)];
        for j in 0..n {
            M[(col, j)] *= d;
            I[(col, j)] *= d;
        }

        // Eliminate the column from every other row
        for r in 0..n {
            if r == col {
                continue;
            }
            let f = M[(r, col)];
            if f.is_zero() {
                continue;
            }
            for j in 0..n {
                let t = f * M[(col, j)];
                M[(r, j)] -= t;
                let t = f * I[(col, j)];
                I[(r, j)] -= t;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use na::{DMatrix, Matrix2, Matrix2x3, Matrix3, Vector2};

    #[test]
    fn mul_tr_matches_explicit_transpose() {
        let a = Matrix2x3::new(1., 2., 3., 4., 5., 6.);
        let b = Matrix2x3::new(0.5, -1., 2., 3., 0., 1.);
        let mut out = Matrix2::zeros();
        mul_tr(&a, &b, &mut out).unwrap();
        assert_relative_eq!(out, a * b.transpose());

        let mut product = Matrix2::zeros();
        mul(&a, &b.transpose(), &mut product).unwrap();
        assert_relative_eq!(product, out);
    }

    #[test]
    fn mul_rejects_wrong_output_shape() {
        let a = DMatrix::<f64>::zeros(2, 3);
        let b = DMatrix::<f64>::zeros(3, 2);
        let mut out = DMatrix::<f64>::zeros(3, 3);
        assert_eq!(
            mul(&a, &b, &mut out),
            Err(MatrixError::ShapeMismatch { op: "mul", expected: (2, 2), found: (3, 3) })
        );
    }

    #[test]
    fn invert_needs_pivoting() {
        let m = Matrix3::new(0., 2., 1., 1., 1., 0., 3., 0., 1.);
        let mut scratch = m;
        let mut inv = Matrix3::zeros();
        identity(&mut inv).unwrap();
        invert(&mut scratch, &mut inv).unwrap();
        assert_relative_eq!(m * inv, Matrix3::identity(), epsilon = 1e-12);
    }

    #[test]
    fn invert_reports_singular() {
        let mut m = Matrix2::new(1., 2., 2., 4.);
        let mut inv = Matrix2::identity();
        assert_eq!(invert(&mut m, &mut inv), Err(MatrixError::Singular { pivot: 1 }));

        let mut z = Matrix2::<f64>::zeros();
        let mut inv = Matrix2::identity();
        assert_eq!(invert(&mut z, &mut inv), Err(MatrixError::Singular { pivot: 0 }));
    }

    #[test]
    fn invert_badly_scaled_diagonal() {
        let m = Matrix2::new(1e9, 0., 0., 1e-9);
        let mut scratch = m;
        let mut inv = Matrix2::identity();
        invert(&mut scratch, &mut inv).unwrap();
        assert_relative_eq!(inv, Matrix2::new(1e-9, 0., 0., 1e9), max_relative = 1e-12);

        // Coupled rows in disparate units
        let m = Matrix2::new(1e9, 1., 1., 2e-9);
        let mut scratch = m;
        let mut inv = Matrix2::identity();
        invert(&mut scratch, &mut inv).unwrap();
        assert_relative_eq!(inv, Matrix2::new(2e-9, -1., -1., 1e9), max_relative = 1e-9);
    }

    #[test]
    fn elementwise_operations() {
        let mut a = Vector2::new(1., 2.);
        add(&mut a, &Vector2::new(0.5, 0.5)).unwrap();
        sub(&mut a, &Vector2::new(1., 1.)).unwrap();
        scale(&mut a, 4.);
        assert_relative_eq!(a, Vector2::new(2., 6.));

        let mut d = DMatrix::<f64>::zeros(2, 1);
        assert!(copy(&mut d, &a).is_ok());
        zero(&mut d);
        assert_relative_eq!(d[(1, 0)], 0.);
        assert!(copy(&mut d, &Matrix2::<f64>::zeros()).is_err());
    }
}
