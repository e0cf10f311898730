//! Simulation step - full-grid recomputation from `current` into `next`.
//!
//! Rule, per cell:
//! - the material tag is carried over unchanged;
//! - walls and fluid sources keep their intensity;
//! - empty cells diffuse with their open 4-neighbours:
//!   `next = (c * (5 - open) + sum(open)) / 5`.
//!
//! A neighbour is open when it lies inside the grid and is not a wall, so the
//! grid edge behaves like a wall. The rule is a radius-1 stencil reading only
//! `current`, which makes every output cell independent of the others. The
//! WGSL step shader implements the same integer arithmetic.

use rayon::prelude::*;

use crate::cell::Cell;
use crate::grid::GridDims;

const NEIGHBOURS: [(i64, i64); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Next value of the cell at `(x, y)`.
#[inline]
pub fn step_cell(current: &[Cell], dims: GridDims, x: u32, y: u32) -> Cell {
    let w = dims.width() as usize;
    let cell = current[y as usize * w + x as usize];
    if !cell.material().diffuses() {
        return cell;
    }

    let mut open = 0u32;
    let mut sum = 0u32;
    for (dx, dy) in NEIGHBOURS {
        let Some(i) = dims.index(x as i64 + dx, y as i64 + dy) else {
            continue;
        };
        let n = current[i];
        if !n.is_wall() {
            open += 1;
            sum += n.intensity as u32;
        }
    }

    let c = cell.intensity as u32;
    Cell {
        material: cell.material,
        intensity: ((c * (5 - open) + sum) / 5) as u8,
    }
}

fn step_row(current: &[Cell], dims: GridDims, y: u32, row: &mut [Cell]) {
    for (x, out) in row.iter_mut().enumerate() {
        *out = step_cell(current, dims, x as u32, y);
    }
}

fn check_sizes(current: &[Cell], next: &[Cell], dims: GridDims) {
    assert_eq!(current.len(), dims.cell_count(), "current buffer size mismatch");
    assert_eq!(next.len(), dims.cell_count(), "next buffer size mismatch");
}

/// One full step, rows computed in parallel.
pub fn step(current: &[Cell], next: &mut [Cell], dims: GridDims) {
    check_sizes(current, next, dims);
    next.par_chunks_mut(dims.width() as usize)
        .enumerate()
        .for_each(|(y, row)| step_row(current, dims, y as u32, row));
}

/// One full step on the calling thread, visiting rows in `rows` order.
///
/// Produces the same grid as [`step`] for any permutation of rows; used to
/// check that the rule does not depend on evaluation order.
pub fn step_in_order(
    current: &[Cell],
    next: &mut [Cell],
    dims: GridDims,
    rows: impl IntoIterator<Item = u32>,
) {
    check_sizes(current, next, dims);
    let w = dims.width() as usize;
    for y in rows {
        let start = y as usize * w;
        step_row(current, dims, y, &mut next[start..start + w]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::HostGrid;
    use crate::material::Material;

    fn stepped(grid: &mut HostGrid) {
        let dims = grid.dims();
        let (cur, next) = grid.split();
        step(cur, next, dims);
        grid.swap();
    }

    #[test]
    fn isolated_empty_cell_spreads() {
        let dims = GridDims::new(6, 6).unwrap();
        let mut grid = HostGrid::create(dims);
        grid.set(2, 2, Cell::new(Material::Empty, 250)).unwrap();
        stepped(&mut grid);
        // Centre keeps 1/5, each neighbour gets 1/5
        assert_eq!(grid.get(2, 2).unwrap().intensity, 50);
        assert_eq!(grid.get(3, 2).unwrap().intensity, 50);
        assert_eq!(grid.get(2, 1).unwrap().intensity, 50);
        assert_eq!(grid.get(3, 3).unwrap().intensity, 0);
    }

    #[test]
    fn walls_block_and_keep_their_state() {
        let dims = GridDims::new(4, 2).unwrap();
        let mut grid = HostGrid::create(dims);
        grid.set(1, 0, Cell::new(Material::Wall, 77)).unwrap();
        grid.set(0, 0, Cell::new(Material::Empty, 100)).unwrap();
        stepped(&mut grid);
        assert_eq!(grid.get(1, 0).unwrap(), Cell::new(Material::Wall, 77));
        // (0,0) has one open neighbour (0,1): (100*4 + 0) / 5
        assert_eq!(grid.get(0, 0).unwrap().intensity, 80);
        assert_eq!(grid.get(2, 0).unwrap().intensity, 0);
    }

    #[test]
    fn sources_hold_intensity() {
        let dims = GridDims::new(64, 64).unwrap();
        let mut grid = HostGrid::new(dims);
        for _ in 0..16 {
            stepped(&mut grid);
        }
        assert_eq!(grid.get(20, 20).unwrap(), Cell::SOURCE);
        // Fluid has started leaking into the empty cell next to the seed
        assert!(grid.get(40, 20).unwrap().intensity > 0);
    }

    #[test]
    fn step_does_not_touch_current() {
        let dims = GridDims::new(32, 32).unwrap();
        let current = dims.initial_cells();
        let snapshot = current.clone();
        let mut next = vec![Cell::EMPTY; dims.cell_count()];
        step(&current, &mut next, dims);
        assert_eq!(current, snapshot);
    }

    #[test]
    fn parallel_matches_any_row_order() {
        let dims = GridDims::new(48, 40).unwrap();
        let mut current = dims.initial_cells();
        for (i, c) in current.iter_mut().enumerate() {
            if !c.is_wall() {
                c.intensity = (i * 37 % 256) as u8;
            }
        }
        let mut a = vec![Cell::EMPTY; dims.cell_count()];
        let mut b = vec![Cell::WALL; dims.cell_count()];
        let mut c = vec![Cell::SOURCE; dims.cell_count()];
        step(&current, &mut a, dims);
        step_in_order(&current, &mut b, dims, (0..40).rev());
        step_in_order(&current, &mut c, dims, (0..40).map(|y| (y * 7) % 40));
        assert_eq!(a, b);
        assert_eq!(a, c);
    }
}
