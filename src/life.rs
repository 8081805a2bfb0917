//! Conway's Game of Life on a 16×16 torus.
//!
//! The engine steps on its own interval, remembers the last
//! [`HISTORY_SIZE`] generations, and reseeds itself when the board has been
//! static or looping for too long. That reseed is its only recovery action.

use crate::clock::FrameGate;
use crate::matrix::Canvas;
use crate::rng::Rng;
use crate::{HEIGHT, WIDTH};
use std::collections::VecDeque;
use std::time::Duration;

pub const DEFAULT_STEP_INTERVAL: Duration = Duration::from_millis(200);
/// Generations remembered for oscillation detection. Periods longer than
/// this are only caught by the "nothing changed" check. History starts out
/// as empty boards, so a board that dies out repeats on the step it dies.
pub const HISTORY_SIZE: usize = 5;
/// Consecutive stagnant steps tolerated before reseeding.
pub const DEFAULT_STAGNATION_THRESHOLD: u8 = 25;
/// Fill percentage used when reseeding.
pub const RESEED_FILL_PERCENT: u32 = 30;

// ── CellGrid ─────────────────────────────────────────────────────────

/// One generation: 256 binary cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CellGrid {
    cells: [[bool; WIDTH]; HEIGHT],
}

impl CellGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grid with exactly the listed cells alive.
    pub fn from_cells(live: &[(usize, usize)]) -> Self {
        let mut grid = Self::new();
        for &(x, y) in live {
            grid.set(x, y, true);
        }
        grid
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        x < WIDTH && y < HEIGHT && self.cells[y][x]
    }

    /// Out-of-range coordinates are ignored.
    pub fn set(&mut self, x: usize, y: usize, alive: bool) {
        if x < WIDTH && y < HEIGHT {
            self.cells[y][x] = alive;
        }
    }

    pub fn toggle(&mut self, x: usize, y: usize) {
        if x < WIDTH && y < HEIGHT {
            self.cells[y][x] = !self.cells[y][x];
        }
    }

    pub fn live_count(&self) -> usize {
        self.cells.iter().flatten().filter(|&&c| c).count()
    }

    /// Coordinates of every live cell, row by row.
    pub fn live_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells.iter().enumerate().flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, alive)| **alive)
                .map(move |(x, _)| (x, y))
        })
    }

    /// Live cells among the 8 neighbours, wrapping at the edges.
    pub fn neighbors(&self, x: usize, y: usize) -> u8 {
        let mut count = 0;
        for dy in [HEIGHT - 1, 0, 1] {
            for dx in [WIDTH - 1, 0, 1] {
                if dx == 0 && dy == 0 {
                    continue;
                }
                if self.cells[(y + dy) % HEIGHT][(x + dx) % WIDTH] {
                    count += 1;
                }
            }
        }
        count
    }

    /// The next generation under B3/S23. Computed into a fresh grid so no
    /// cell sees a half-updated neighbourhood.
    pub fn next_generation(&self) -> Self {
        let mut next = Self::new();
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                next.cells[y][x] = matches!(
                    (self.cells[y][x], self.neighbors(x, y)),
                    (true, 2) | (true, 3) | (false, 3)
                );
            }
        }
        next
    }

    fn randomize(&mut self, rng: &mut Rng, fill_percent: u32) {
        let fill = fill_percent.min(100);
        for cell in self.cells.iter_mut().flatten() {
            *cell = rng.chance(fill);
        }
    }
}

// ── Life engine ──────────────────────────────────────────────────────

/// What a single [`Life::step`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// The board changed and didn't repeat a recent generation.
    Evolved,
    /// Unchanged or repeating; carries the consecutive stagnant count.
    Stagnant(u16),
    /// Stagnant for too long; the board was reseeded.
    Reseeded,
}

pub struct Life {
    grid: CellGrid,
    history: VecDeque<CellGrid>,
    // Wider than the threshold so every threshold can be exceeded.
    stagnant: u16,
    threshold: u8,
    auto_reset: bool,
    running: bool,
    gate: FrameGate,
    generation: u64,
    reseeds: u64,
    rng: Rng,
}

impl Life {
    pub fn new(step_interval: Duration, rng: Rng) -> Self {
        Self {
            grid: CellGrid::new(),
            history: VecDeque::from([CellGrid::new(); HISTORY_SIZE]),
            stagnant: 0,
            threshold: DEFAULT_STAGNATION_THRESHOLD,
            auto_reset: true,
            running: false,
            gate: FrameGate::new(step_interval),
            generation: 0,
            reseeds: 0,
            rng,
        }
    }

    pub fn start(&mut self, now: Duration) {
        self.running = true;
        self.gate.restart(now);
        tracing::info!("Life started ({} live cells)", self.grid.live_count());
    }

    /// Stop stepping and blank the panel. Safe to call at any time.
    pub fn stop<C: Canvas + ?Sized>(&mut self, canvas: &mut C) {
        self.running = false;
        canvas.clear();
        canvas.render();
        tracing::info!("Life stopped after {} generations", self.generation);
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn grid(&self) -> &CellGrid {
        &self.grid
    }

    /// Replace the board. History and the stagnation count are kept.
    pub fn load(&mut self, grid: CellGrid) {
        self.grid = grid;
    }

    pub fn clear(&mut self) {
        self.grid = CellGrid::new();
    }

    pub fn randomize(&mut self, fill_percent: u32) {
        self.grid.randomize(&mut self.rng, fill_percent);
    }

    pub fn set_cell(&mut self, x: usize, y: usize, alive: bool) {
        self.grid.set(x, y, alive);
    }

    pub fn toggle_cell(&mut self, x: usize, y: usize) {
        self.grid.toggle(x, y);
    }

    /// Clear the board and drop a glider with its bounding box at `(x, y)`,
    /// wrapping around the edges.
    pub fn spawn_glider(&mut self, x: usize, y: usize) {
        self.clear();
        //  . O .
        //  . . O
        //  O O O
        for (dx, dy) in [(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)] {
            self.grid.set((x % WIDTH + dx) % WIDTH, (y % HEIGHT + dy) % HEIGHT, true);
        }
    }

    pub fn step_interval(&self) -> Duration {
        self.gate.period()
    }

    pub fn set_step_interval(&mut self, interval: Duration) {
        self.gate.set_period(interval);
    }

    pub fn set_auto_reset(&mut self, enabled: bool) {
        self.auto_reset = enabled;
    }

    pub fn set_stagnation_threshold(&mut self, threshold: u8) {
        self.threshold = threshold;
    }

    pub fn stagnant_steps(&self) -> u16 {
        self.stagnant
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn reseeds(&self) -> u64 {
        self.reseeds
    }

    /// Advance one generation and apply the stagnation policy.
    pub fn step(&mut self) -> StepOutcome {
        let next = self.grid.next_generation();
        let changed = next != self.grid;
        self.grid = next;
        self.generation += 1;

        let repeating = self.history.iter().any(|past| *past == self.grid);
        if self.history.len() == HISTORY_SIZE {
            self.history.pop_front();
        }
        self.history.push_back(self.grid);

        if !changed || repeating {
            self.stagnant = self.stagnant.saturating_add(1);
        } else {
            self.stagnant = 0;
        }

        if self.auto_reset && self.stagnant > u16::from(self.threshold) {
            self.stagnant = 0;
            self.randomize(RESEED_FILL_PERCENT);
            self.reseeds += 1;
            tracing::debug!(
                "Life stagnated at generation {}, reseeded ({} live cells)",
                self.generation,
                self.grid.live_count()
            );
            return StepOutcome::Reseeded;
        }

        if self.stagnant > 0 {
            StepOutcome::Stagnant(self.stagnant)
        } else {
            StepOutcome::Evolved
        }
    }

    /// Step and redraw if the interval has elapsed. Returns whether a step
    /// happened.
    pub fn update<C: Canvas + ?Sized>(&mut self, now: Duration, canvas: &mut C) -> bool {
        if !self.running || !self.gate.ready(now) {
            return false;
        }
        self.step();
        self.draw(canvas);
        true
    }

    /// Live cells become lit pixels. Commits once.
    pub fn draw<C: Canvas + ?Sized>(&self, canvas: &mut C) {
        canvas.clear();
        for (x, y) in self.grid.live_cells() {
            canvas.set_pixel(x as i32, y as i32, true);
        }
        canvas.render();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::SimulatedMatrix;
    use crate::surface::Orientation;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const MS: Duration = Duration::from_millis(1);

    fn life() -> Life {
        Life::new(DEFAULT_STEP_INTERVAL, Rng::new(1234))
    }

    fn blinker_horizontal() -> CellGrid {
        CellGrid::from_cells(&[(6, 7), (7, 7), (8, 7)])
    }

    fn blinker_vertical() -> CellGrid {
        CellGrid::from_cells(&[(7, 6), (7, 7), (7, 8)])
    }

    fn block() -> CellGrid {
        CellGrid::from_cells(&[(4, 4), (5, 4), (4, 5), (5, 5)])
    }

    #[test]
    fn blinker_oscillates() {
        let mut life = life();
        life.load(blinker_horizontal());

        life.step();
        assert_eq!(life.grid(), &blinker_vertical());

        life.step();
        assert_eq!(life.grid(), &blinker_horizontal());
    }

    #[test]
    fn lonely_cell_dies() {
        let grid = CellGrid::from_cells(&[(3, 3)]);
        assert_eq!(grid.next_generation().live_count(), 0);
    }

    #[test]
    fn block_is_still_life() {
        assert_eq!(block().next_generation(), block());
    }

    #[test]
    fn step_is_deterministic() {
        let mut rng = Rng::new(77);
        let mut seed = CellGrid::new();
        seed.randomize(&mut rng, 40);
        assert_eq!(seed.next_generation(), seed.next_generation());
    }

    #[rstest]
    #[case(0, 0, 3)]
    #[case(15, 15, 3)]
    #[case(0, 15, 3)]
    #[case(15, 0, 3)]
    fn neighbours_wrap_around_corners(#[case] x: usize, #[case] y: usize, #[case] expected: u8) {
        // All four corners alive: on a torus they are mutual neighbours.
        let grid = CellGrid::from_cells(&[(0, 0), (15, 0), (0, 15), (15, 15)]);
        assert_eq!(grid.neighbors(x, y), expected);
    }

    #[test]
    fn glider_wraps_across_the_edge() {
        let mut life = life();
        life.spawn_glider(15, 15);
        let cells: Vec<_> = life.grid().live_cells().collect();
        assert_eq!(cells.len(), 5);
        assert!(life.grid().get(0, 15));
        assert!(life.grid().get(1, 0));
        assert!(life.grid().get(15, 1));
    }

    #[test]
    fn glider_keeps_five_cells_while_travelling() {
        let mut life = life();
        life.spawn_glider(5, 5);
        for _ in 0..40 {
            assert_eq!(life.step(), StepOutcome::Evolved);
            assert_eq!(life.grid().live_count(), 5);
        }
    }

    #[test]
    fn still_life_reseeds_exactly_after_threshold() {
        let mut life = life();
        life.load(block());

        for n in 1..=u16::from(DEFAULT_STAGNATION_THRESHOLD) {
            assert_eq!(life.step(), StepOutcome::Stagnant(n));
            assert_eq!(life.grid(), &block());
        }
        assert_eq!(life.step(), StepOutcome::Reseeded);
        assert_eq!(life.reseeds(), 1);
        assert_eq!(life.stagnant_steps(), 0);
    }

    #[test]
    fn highest_threshold_still_reseeds() {
        let mut life = life();
        life.set_stagnation_threshold(u8::MAX);
        life.load(block());
        for _ in 0..u8::MAX {
            assert!(matches!(life.step(), StepOutcome::Stagnant(_)));
        }
        assert_eq!(life.stagnant_steps(), 255);
        assert_eq!(life.step(), StepOutcome::Reseeded);
        assert_eq!(life.reseeds(), 1);
    }

    #[test]
    fn dying_board_matches_the_empty_history() {
        let mut life = life();
        life.load(CellGrid::from_cells(&[(3, 3)]));
        assert_eq!(life.step(), StepOutcome::Stagnant(1));
        assert_eq!(life.grid().live_count(), 0);
        assert_eq!(life.step(), StepOutcome::Stagnant(2));
    }

    #[test]
    fn glider_anchor_wraps_for_any_coordinate() {
        let mut life = life();
        life.spawn_glider(usize::MAX, 3);
        // usize::MAX % 16 == 15
        let mut expected = *life.grid();
        life.spawn_glider(15, 3);
        assert_eq!(life.grid(), &expected);

        life.spawn_glider(usize::MAX, usize::MAX);
        expected = *life.grid();
        life.spawn_glider(15, 15);
        assert_eq!(life.grid(), &expected);
        assert_eq!(life.grid().live_count(), 5);
    }

    #[test]
    fn short_oscillation_counts_as_stagnant() {
        let mut life = life();
        life.load(blinker_horizontal());

        // The loaded grid never entered history, so both phases are new once.
        assert_eq!(life.step(), StepOutcome::Evolved);
        assert_eq!(life.step(), StepOutcome::Evolved);
        assert_eq!(life.step(), StepOutcome::Stagnant(1));
        assert_eq!(life.step(), StepOutcome::Stagnant(2));
    }

    #[test]
    fn auto_reset_can_be_disabled() {
        let mut life = life();
        life.set_auto_reset(false);
        life.load(block());
        for _ in 0..100 {
            assert!(matches!(life.step(), StepOutcome::Stagnant(_)));
        }
        assert_eq!(life.reseeds(), 0);
    }

    #[test]
    fn update_is_gated_by_step_interval() {
        let mut canvas = SimulatedMatrix::simulated(Orientation::Normal);
        let mut life = life();
        life.load(blinker_horizontal());
        life.start(Duration::ZERO);

        assert!(!life.update(199 * MS, &mut canvas));
        assert_eq!(canvas.commits(), 0);
        assert!(life.update(200 * MS, &mut canvas));
        assert_eq!(canvas.commits(), 1);
        assert!(!life.update(250 * MS, &mut canvas));
        assert_eq!(life.generation(), 1);
    }

    #[test]
    fn stopped_engine_ignores_updates() {
        let mut canvas = SimulatedMatrix::simulated(Orientation::Normal);
        let mut life = life();
        life.load(block());
        assert!(!life.update(Duration::from_secs(10), &mut canvas));
        assert_eq!(life.generation(), 0);
    }

    #[test]
    fn draw_commits_once_and_stop_blanks() {
        let mut canvas = SimulatedMatrix::simulated(Orientation::Rotated180);
        let mut life = life();
        life.load(block());
        life.start(Duration::ZERO);

        life.draw(&mut canvas);
        assert_eq!(canvas.commits(), 1);
        assert_eq!(canvas.surface().lit_count(), 4);
        assert!(canvas.surface().is_lit(4, 4));

        life.stop(&mut canvas);
        assert!(!life.is_running());
        assert_eq!(canvas.surface().lit_count(), 0);
        assert_eq!(canvas.sink().latched().lit_count(), 0);
    }

    #[test]
    fn randomize_respects_extremes() {
        let mut life = life();
        life.randomize(0);
        assert_eq!(life.grid().live_count(), 0);
        life.randomize(100);
        assert_eq!(life.grid().live_count(), 256);
    }
}
