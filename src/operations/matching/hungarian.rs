use nalgebra::DMatrix;

/// Exact minimum-cost assignment (Kuhn-Munkres with row/column potentials).
///
/// Works on rectangular matrices: every row is assigned when
/// `rows <= cols`, every column otherwise. Returns, per row, the assigned
/// column. Costs must be finite. Ties resolve towards lower column indices,
/// so equal inputs always give equal outputs.
#[must_use]
pub fn min_cost_assignment(cost: &DMatrix<f64>) -> Vec<Option<usize>> {
    let (rows, cols) = cost.shape();
    if rows == 0 || cols == 0 {
        return vec![None; rows];
    }
    if rows <= cols {
        return solve_wide(cost).into_iter().map(Some).collect();
    }
    let col_to_row = solve_wide(&cost.transpose());
    let mut row_to_col = vec![None; rows];
    for (col, row) in col_to_row.into_iter().enumerate() {
        row_to_col[row] = Some(col);
    }
    row_to_col
}

/// Sum of the assigned entries.
#[must_use]
pub fn assignment_cost(cost: &DMatrix<f64>, assignment: &[Option<usize>]) -> f64 {
    assignment
        .iter()
        .enumerate()
        .filter_map(|(r, c)| c.map(|c| cost[(r, c)]))
        .sum()
}

/// Shortest augmenting path variant for `rows <= cols`.
///
/// Uses 1-based indices internally; column 0 is the virtual source.
fn solve_wide(cost: &DMatrix<f64>) -> Vec<usize> {
    let (n, m) = cost.shape();
    let mut u = vec![0.0; n + 1];
    let mut v = vec![0.0; m + 1];
    // p[j]: row matched to column j (0 = free).
    let mut p = vec![0usize; m + 1];
    let mut way = vec![0usize; m + 1];

    for i in 1..=n {
        p[0] = i;
        let mut j0 = 0usize;
        let mut minv = vec![f64::INFINITY; m + 1];
        let mut used = vec![false; m + 1];
        loop {
            used[j0] = true;
            let i0 = p[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0usize;
            for j in 1..=m {
                if used[j] {
                    continue;
                }
                let cur = cost[(i0 - 1, j - 1)] - u[i0] - v[j];
                if cur < minv[j] {
                    minv[j] = cur;
                    way[j] = j0;
                }
                if minv[j] < delta {
                    delta = minv[j];
                    j1 = j;
                }
            }
            for j in 0..=m {
                if used[j] {
                    u[p[j]] += delta;
                    v[j] -= delta;
                } else {
                    minv[j] -= delta;
                }
            }
            j0 = j1;
            if p[j0] == 0 {
                break;
            }
        }
        // Flip the augmenting path back to the source.
        loop {
            let j1 = way[j0];
            p[j0] = p[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut row_to_col = vec![0usize; n];
    for j in 1..=m {
        if p[j] != 0 {
            row_to_col[p[j] - 1] = j - 1;
        }
    }
    row_to_col
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Exhaustive minimum over all injective row → column maps.
    fn brute_force(cost: &DMatrix<f64>) -> f64 {
        fn rec(cost: &DMatrix<f64>, row: usize, used: &mut Vec<bool>) -> f64 {
            if row == cost.nrows() {
                return 0.0;
            }
            let mut best = f64::INFINITY;
            for c in 0..cost.ncols() {
                if !used[c] {
                    used[c] = true;
                    best = best.min(cost[(row, c)] + rec(cost, row + 1, used));
                    used[c] = false;
                }
            }
            best
        }
        rec(cost, 0, &mut vec![false; cost.ncols()])
    }

    #[test]
    fn classic_three_by_three() {
        let cost = DMatrix::from_row_slice(3, 3, &[4.0, 1.0, 3.0, 2.0, 0.0, 5.0, 3.0, 2.0, 2.0]);
        let a = min_cost_assignment(&cost);
        assert_eq!(a, vec![Some(1), Some(0), Some(2)]);
        assert!((assignment_cost(&cost, &a) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn beats_greedy() {
        // Greedy takes (0,0)=1 and is then forced into (1,1)=100.
        let cost = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 100.0]);
        assert_eq!(min_cost_assignment(&cost), vec![Some(1), Some(0)]);
    }

    #[test]
    fn tall_matrix_leaves_rows_unassigned() {
        let cost = DMatrix::from_row_slice(3, 2, &[5.0, 5.0, 1.0, 9.0, 9.0, 1.0]);
        assert_eq!(min_cost_assignment(&cost), vec![None, Some(0), Some(1)]);
    }

    #[test]
    fn ties_prefer_identity() {
        let cost = DMatrix::from_element(3, 3, 1.0);
        assert_eq!(min_cost_assignment(&cost), vec![Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn empty_matrix() {
        let cost = DMatrix::<f64>::zeros(2, 0);
        assert_eq!(min_cost_assignment(&cost), vec![None, None]);
    }

    proptest! {
        #[test]
        fn matches_brute_force(
            rows in 1usize..5,
            extra in 0usize..3,
            seed in proptest::collection::vec(0u32..50, 32),
        ) {
            let cols = rows + extra;
            let cost = DMatrix::from_fn(rows, cols, |r, c| f64::from(seed[(r * cols + c) % seed.len()]));
            let a = min_cost_assignment(&cost);
            let mut seen = vec![false; cols];
            for c in a.iter().flatten() {
                prop_assert!(!seen[*c]);
                seen[*c] = true;
            }
            prop_assert!(a.iter().all(Option::is_some));
            prop_assert!((assignment_cost(&cost, &a) - brute_force(&cost)).abs() < 1e-9);
        }
    }
}
