use eframe::egui::Pos2;

use super::particles::Particle;

const GRID_MAX_SIDE: usize = 512;

/// Uniform bucket grid over the surface, rebuilt every frame into reused buffers.
///
/// Cells are at least as wide as the query threshold, so any pair closer than
/// the threshold lands in the same or adjacent cells. Particles outside the
/// surface are clamped into the border cells, which keeps that property.
#[derive(Default)]
pub(super) struct UniformGrid {
    cell_width: f32,
    cell_height: f32,
    columns: usize,
    rows: usize,
    cell_starts: Vec<usize>,
    cell_cursor: Vec<usize>,
    entries: Vec<usize>,
    cell_of: Vec<usize>,
}

impl UniformGrid {
    pub(super) fn rebuild(
        &mut self,
        particles: &[Particle],
        width: f32,
        height: f32,
        threshold: f32,
    ) {
        let width = width.max(1.0);
        let height = height.max(1.0);
        self.cell_width = threshold.max(width / GRID_MAX_SIDE as f32);
        self.cell_height = threshold.max(height / GRID_MAX_SIDE as f32);
        self.columns = ((width / self.cell_width).ceil() as usize).clamp(1, GRID_MAX_SIDE);
        self.rows = ((height / self.cell_height).ceil() as usize).clamp(1, GRID_MAX_SIDE);
        let cell_count = self.columns * self.rows;

        self.cell_starts.clear();
        self.cell_starts.resize(cell_count + 1, 0);
        self.cell_of.clear();
        self.cell_of.reserve(particles.len().saturating_sub(self.cell_of.capacity()));
        for particle in particles {
            let cell = self.cell_index(particle.position);
            self.cell_of.push(cell);
            self.cell_starts[cell + 1] += 1;
        }

        for cell in 0..cell_count {
            self.cell_starts[cell + 1] += self.cell_starts[cell];
        }

        self.cell_cursor.clear();
        self.cell_cursor.extend_from_slice(&self.cell_starts[..cell_count]);
        self.entries.clear();
        self.entries.resize(particles.len(), 0);
        for (index, &cell) in self.cell_of.iter().enumerate() {
            self.entries[self.cell_cursor[cell]] = index;
            self.cell_cursor[cell] += 1;
        }
    }

    fn column_row(&self, position: Pos2) -> (usize, usize) {
        let column = (position.x / self.cell_width).floor();
        let row = (position.y / self.cell_height).floor();
        (
            column.clamp(0.0, (self.columns - 1) as f32) as usize,
            row.clamp(0.0, (self.rows - 1) as f32) as usize,
        )
    }

    fn cell_index(&self, position: Pos2) -> usize {
        let (column, row) = self.column_row(position);
        row * self.columns + column
    }

    /// Collects every `j > index` closer than `threshold`, sorted by `j`.
    pub(super) fn neighbors_after(
        &self,
        index: usize,
        particles: &[Particle],
        threshold: f32,
        out: &mut Vec<(usize, f32)>,
    ) {
        out.clear();
        let origin = particles[index].position;
        let (column, row) = self.column_row(origin);

        for cell_row in row.saturating_sub(1)..=(row + 1).min(self.rows - 1) {
            for cell_column in column.saturating_sub(1)..=(column + 1).min(self.columns - 1) {
                let cell = cell_row * self.columns + cell_column;
                let members = &self.entries[self.cell_starts[cell]..self.cell_starts[cell + 1]];
                for &other in members {
                    if other <= index {
                        continue;
                    }
                    let distance = super::proximity::distance(origin, particles[other].position);
                    if distance < threshold {
                        out.push((other, distance));
                    }
                }
            }
        }

        out.sort_unstable_by_key(|&(other, _)| other);
    }
}
