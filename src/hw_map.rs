//! Logical-to-physical bit mapping for the panel's shift register chain.
//!
//! The panel is four 8×8 quadrants wired in a serpentine, so logical
//! neighbours are rarely neighbours on the wire. [`HARDWARE_INDEX`] gives the
//! position in the 256-bit shift sequence for every storage cell.
//! [`PhysicalFrame::from_surface`] is pure so the mapping can be tested
//! without any pins.

use crate::surface::PixelSurface;
use crate::{HEIGHT, PIXEL_COUNT, WIDTH};

/// Shift position for each storage cell, indexed `[y][x]`.
pub const HARDWARE_INDEX: [[u8; WIDTH]; HEIGHT] = [
    [255, 254, 253, 252, 251, 250, 249, 248, 239, 238, 237, 236, 235, 234, 233, 232],
    [240, 241, 242, 243, 244, 245, 246, 247, 224, 225, 226, 227, 228, 229, 230, 231],
    [207, 206, 205, 204, 203, 202, 201, 200, 223, 222, 221, 220, 219, 218, 217, 216],
    [192, 193, 194, 195, 196, 197, 198, 199, 208, 209, 210, 211, 212, 213, 214, 215],
    [191, 190, 189, 188, 187, 186, 185, 184, 175, 174, 173, 172, 171, 170, 169, 168],
    [176, 177, 178, 179, 180, 181, 182, 183, 160, 161, 162, 163, 164, 165, 166, 167],
    [143, 142, 141, 140, 139, 138, 137, 136, 159, 158, 157, 156, 155, 154, 153, 152],
    [128, 129, 130, 131, 132, 133, 134, 135, 144, 145, 146, 147, 148, 149, 150, 151],
    [127, 126, 125, 124, 123, 122, 121, 120, 111, 110, 109, 108, 107, 106, 105, 104],
    [112, 113, 114, 115, 116, 117, 118, 119, 96, 97, 98, 99, 100, 101, 102, 103],
    [79, 78, 77, 76, 75, 74, 73, 72, 95, 94, 93, 92, 91, 90, 89, 88],
    [64, 65, 66, 67, 68, 69, 70, 71, 80, 81, 82, 83, 84, 85, 86, 87],
    [63, 62, 61, 60, 59, 58, 57, 56, 47, 46, 45, 44, 43, 42, 41, 40],
    [48, 49, 50, 51, 52, 53, 54, 55, 32, 33, 34, 35, 36, 37, 38, 39],
    [15, 14, 13, 12, 11, 10, 9, 8, 31, 30, 29, 28, 27, 26, 25, 24],
    [0, 1, 2, 3, 4, 5, 6, 7, 16, 17, 18, 19, 20, 21, 22, 23],
];

/// Shift position of the storage cell at `(x, y)`.
///
/// Coordinates are storage coordinates, already rotated; callers must keep
/// them below 16.
pub fn physical_index(x: usize, y: usize) -> usize {
    usize::from(HARDWARE_INDEX[y][x])
}

const FRAME_BYTES: usize = PIXEL_COUNT / 8;

/// The 256 bits exactly as they will be clocked into the register chain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PhysicalFrame {
    bits: [u8; FRAME_BYTES],
}

impl PhysicalFrame {
    /// Build the physical bit vector for the current surface contents.
    pub fn from_surface(surface: &PixelSurface) -> Self {
        let mut frame = Self::default();
        for (y, row) in surface.storage_rows().iter().enumerate() {
            for (x, &intensity) in row.iter().enumerate() {
                if intensity > 0 {
                    frame.set(physical_index(x, y));
                }
            }
        }
        frame
    }

    fn set(&mut self, index: usize) {
        self.bits[index / 8] |= 1 << (index % 8);
    }

    /// Bit at shift position `index`. Positions past 255 read as off.
    pub fn bit(&self, index: usize) -> bool {
        self.bits
            .get(index / 8)
            .is_some_and(|byte| byte & (1 << (index % 8)) != 0)
    }

    /// Bits in shift order, position 0 first.
    pub fn iter_bits(&self) -> impl Iterator<Item = bool> + '_ {
        (0..PIXEL_COUNT).map(|i| self.bit(i))
    }

    pub fn lit_count(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Render the frame as 16 lines of `#`/`.` in storage layout.
    /// Used for trace logging in the simulator.
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity(PIXEL_COUNT + HEIGHT);
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                out.push(if self.bit(physical_index(x, y)) { '#' } else { '.' });
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Orientation;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn hardware_index_is_a_bijection() {
        let mut seen = [false; PIXEL_COUNT];
        for row in HARDWARE_INDEX.iter() {
            for &index in row {
                let index = usize::from(index);
                assert!(!seen[index], "shift position {index} mapped twice");
                seen[index] = true;
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[rstest]
    #[case(0, 0, 255)]
    #[case(15, 15, 23)]
    #[case(0, 15, 0)]
    #[case(8, 1, 224)]
    fn storage_cell_maps_to_expected_bit(#[case] x: usize, #[case] y: usize, #[case] bit: usize) {
        assert_eq!(physical_index(x, y), bit);
    }

    #[test]
    fn frame_follows_rotation() {
        let mut surface = PixelSurface::new(Orientation::Rotated180);
        // Logical (15, 0) is stored at (0, 15), the first bit on the wire.
        surface.set_pixel(15, 0, true);
        let frame = PhysicalFrame::from_surface(&surface);
        assert!(frame.bit(0));
        assert_eq!(frame.lit_count(), 1);
    }

    #[test]
    fn empty_surface_builds_empty_frame() {
        let frame = PhysicalFrame::from_surface(&PixelSurface::default());
        assert_eq!(frame.lit_count(), 0);
        assert_eq!(frame.iter_bits().count(), PIXEL_COUNT);
    }

    #[test]
    fn full_surface_sets_every_bit() {
        let mut surface = PixelSurface::new(Orientation::Normal);
        for y in 0..16 {
            for x in 0..16 {
                surface.set_pixel(x, y, true);
            }
        }
        let frame = PhysicalFrame::from_surface(&surface);
        assert!(frame.iter_bits().all(|b| b));
    }

    #[test]
    fn ascii_dump_matches_storage_layout() {
        let mut surface = PixelSurface::new(Orientation::Normal);
        surface.set_pixel(1, 0, true);
        let ascii = PhysicalFrame::from_surface(&surface).to_ascii();
        assert_eq!(ascii.lines().next(), Some(".#.............."));
        assert_eq!(ascii.lines().count(), 16);
    }
}
