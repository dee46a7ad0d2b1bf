//! Constrained weighted least squares for Kernel SHAP.
//!
//! Minimizes `Σ w(z) · (v(z) − base − Σ_j z_j φ_j)²` subject to
//! `Σ_j φ_j = fx − base`. The constraint is folded in by eliminating the
//! last feature, which leaves an unconstrained `(k − 1)`-dimensional system.

use cadrisk_contracts::error::{CadError, CadResult};

use crate::coalition::Coalition;

/// Solve for `k` contributions given the coalition values `values[i]` of
/// `plan[i]`, the baseline, and the explained output.
pub fn solve_constrained(
    plan: &[Coalition],
    values: &[f64],
    base: f64,
    fx: f64,
) -> CadResult<Vec<f64>> {
    let k = plan.first().map(|c| c.mask.len()).unwrap_or(0);
    let total = fx - base;
    if k == 0 {
        return Ok(Vec::new());
    }
    if k == 1 {
        return Ok(vec![total]);
    }

    let last = k - 1;
    let n = k - 1;
    let mut a = vec![vec![0.0; n]; n];
    let mut b = vec![0.0; n];

    for (coalition, value) in plan.iter().zip(values) {
        let z_last = indicator(coalition.mask[last]);
        let y = value - base - z_last * total;
        let x: Vec<f64> = (0..n)
            .map(|j| indicator(coalition.mask[j]) - z_last)
            .collect();
        for r in 0..n {
            if x[r] == 0.0 {
                continue;
            }
            let wx = coalition.weight * x[r];
            b[r] += wx * y;
            for c in 0..n {
                a[r][c] += wx * x[c];
            }
        }
    }

    let mut phi = gaussian_solve(a, b)?;
    let rest: f64 = phi.iter().sum();
    phi.push(total - rest);
    Ok(phi)
}

fn indicator(on: bool) -> f64 {
    if on {
        1.0
    } else {
        0.0
    }
}

/// Solve `a · x = b` with partial pivoting.
pub fn gaussian_solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> CadResult<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() < 1e-12 {
            return Err(CadError::Explanation {
                reason: format!(
                    "attribution system is singular at column {}; too few coalitions",
                    col
                ),
            });
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for c in col..n {
                a[row][c] -= factor * a[col][c];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|c| a[row][c] * x[c]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coalition::enumerate;

    #[test]
    fn gaussian_solve_small_system() {
        let a = vec![vec![2.0, 1.0], vec![1.0, 3.0]];
        let b = vec![5.0, 10.0];
        let x = gaussian_solve(a, b).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-12);
        assert!((x[1] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn gaussian_solve_needs_pivoting() {
        let a = vec![vec![0.0, 1.0], vec![1.0, 0.0]];
        let x = gaussian_solve(a, vec![4.0, 2.0]).unwrap();
        assert_eq!(x, vec![2.0, 4.0]);
    }

    #[test]
    fn singular_system_is_an_explanation_error() {
        let a = vec![vec![1.0, 2.0], vec![2.0, 4.0]];
        let err = gaussian_solve(a, vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, CadError::Explanation { .. }));
    }

    #[test]
    fn additive_game_recovers_its_weights() {
        // v(z) = base + Σ z_j · c_j is its own Shapley decomposition.
        let c = [0.3, -0.1, 0.05, 0.2];
        let base = 0.4;
        let plan = enumerate(4);
        let values: Vec<f64> = plan
            .iter()
            .map(|z| base + z.mask.iter().zip(c).filter(|(m, _)| **m).map(|(_, c)| c).sum::<f64>())
            .collect();
        let fx = base + c.iter().sum::<f64>();
        let phi = solve_constrained(&plan, &values, base, fx).unwrap();
        for (got, want) in phi.iter().zip(c) {
            assert!((got - want).abs() < 1e-10, "got {got}, want {want}");
        }
    }
}
