//! Occupancy Grid - non-overlapping rectangle placement
//!
//! Tracks which cells are taken and keeps a list of free cells so a random
//! anchor can be drawn in O(1). Footprints are packed by bounded random
//! rejection: draw a free anchor, test the rectangle, retry on overlap.

use rand::Rng;

use crate::components::Position;

pub struct OccupancyGrid {
    width: u32,
    height: u32,
    occupied: Vec<bool>,
    /// Free cells, in no particular order once placement has started
    free: Vec<Position>,
    /// Cell index -> slot in `free`
    free_slot: Vec<Option<usize>>,
}

impl OccupancyGrid {
    /// Create an empty grid. The free list starts x-major.
    pub fn new(width: u32, height: u32) -> Self {
        let cells = width as usize * height as usize;
        let mut free = Vec::with_capacity(cells);
        let mut free_slot = vec![None; cells];
        for x in 0..width {
            for y in 0..height {
                let pos = Position::new(x, y);
                free_slot[(y * width + x) as usize] = Some(free.len());
                free.push(pos);
            }
        }
        Self {
            width,
            height,
            occupied: vec![false; cells],
            free,
            free_slot,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    pub fn occupied_count(&self) -> usize {
        self.occupied.len() - self.free.len()
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    /// Out-of-bounds cells count as occupied
    pub fn is_occupied(&self, pos: Position) -> bool {
        match self.index(pos) {
            Some(i) => self.occupied[i],
            None => true,
        }
    }

    /// Try to place a `width` x `height` footprint on free cells.
    ///
    /// Returns the claimed cells in column-major order (dx outer, dy inner),
    /// or `None` when the grid has too few free cells or every attempt hit the
    /// edge or another footprint.
    pub fn try_place<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        width: u32,
        height: u32,
        max_attempts: u32,
    ) -> Option<Vec<Position>> {
        let needed = width as usize * height as usize;
        if needed == 0 || self.free.len() < needed {
            return None;
        }

        let mut cells = Vec::with_capacity(needed);
        for _ in 0..max_attempts {
            let anchor = self.free[rng.gen_range(0..self.free.len())];
            cells.clear();
            if self.collect_footprint(anchor, width, height, &mut cells) {
                self.occupy(&cells);
                return Some(cells);
            }
        }
        None
    }

    /// Claim one uniformly random free cell
    pub fn take_random_free<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Position> {
        if self.free.is_empty() {
            return None;
        }
        let pos = self.free[rng.gen_range(0..self.free.len())];
        self.occupy(&[pos]);
        Some(pos)
    }

    /// Mark cells occupied. Cells already taken or out of bounds are ignored.
    pub fn occupy(&mut self, cells: &[Position]) {
        for &pos in cells {
            let Some(i) = self.index(pos) else { continue };
            if self.occupied[i] {
                continue;
            }
            self.occupied[i] = true;
            if let Some(slot) = self.free_slot[i].take() {
                self.free.swap_remove(slot);
                if let Some(&moved) = self.free.get(slot) {
                    let moved_idx = (moved.y * self.width + moved.x) as usize;
                    self.free_slot[moved_idx] = Some(slot);
                }
            }
        }
    }

    fn collect_footprint(
        &self,
        anchor: Position,
        width: u32,
        height: u32,
        cells: &mut Vec<Position>,
    ) -> bool {
        for dx in 0..width {
            for dy in 0..height {
                let pos = Position::new(anchor.x + dx, anchor.y + dy);
                if self.is_occupied(pos) {
                    return false;
                }
                cells.push(pos);
            }
        }
        true
    }

    fn index(&self, pos: Position) -> Option<usize> {
        self.in_bounds(pos)
            .then(|| (pos.y * self.width + pos.x) as usize)
    }
}
