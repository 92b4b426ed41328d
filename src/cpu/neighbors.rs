use std::collections::HashMap;

use glam::{IVec3, Vec3};

use crate::particle::Particle;

type Cell = IVec3;

#[inline]
fn cell(pos: Vec3, h: f32) -> Cell {
    (pos / h).floor().as_ivec3()
}

/// Uniform hash grid with cell size h; a query only has to look at the
/// 3 x 3 x 3 block around the particle's own cell.
pub struct NeighborGrid {
    h: f32,
    cells: HashMap<Cell, Vec<usize>>,
}

impl NeighborGrid {
    pub fn build(particles: &[Particle], h: f32) -> Self {
        let mut cells: HashMap<Cell, Vec<usize>> = HashMap::with_capacity(particles.len());
        for (i, p) in particles.iter().enumerate() {
            cells.entry(cell(p.position(), h)).or_default().push(i);
        }
        Self { h, cells }
    }

    /// Calls `f` with every index whose cell touches `pos`'s cell. Callers still
    /// filter by distance.
    pub fn for_each_candidate(&self, pos: Vec3, mut f: impl FnMut(usize)) {
        let c = cell(pos, self.h);
        for ox in -1..=1 {
            for oy in -1..=1 {
                for oz in -1..=1 {
                    if let Some(list) = self.cells.get(&(c + IVec3::new(ox, oy, oz))) {
                        for &j in list {
                            f(j);
                        }
                    }
                }
            }
        }
    }
}
