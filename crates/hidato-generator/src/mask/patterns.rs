use std::{
    fmt::{self, Display},
    str::FromStr,
};

use hidato_core::Position;
use rand::{Rng, RngExt as _};

use crate::difficulty::UnknownOption;

/// A named blocked-cell layout.
///
/// Each template produces a candidate for a given board size and cell count;
/// the candidate still has to pass mask validation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MaskTemplate {
    /// Walls grown from alternating board edges, forming a winding corridor.
    Corridor,
    /// A rectangle outline with a gap.
    Ring,
    /// An inward spiral arm.
    Spiral,
    /// A plus sign.
    Cross,
}

impl MaskTemplate {
    /// All templates.
    pub const ALL: [Self; 4] = [Self::Corridor, Self::Ring, Self::Spiral, Self::Cross];

    /// Returns the template name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Corridor => "corridor",
            Self::Ring => "ring",
            Self::Spiral => "spiral",
            Self::Cross => "cross",
        }
    }

    /// Returns the smallest board side the template applies to.
    #[must_use]
    pub const fn min_size(self) -> usize {
        match self {
            Self::Corridor | Self::Cross => 5,
            Self::Ring => 6,
            Self::Spiral => 7,
        }
    }

    /// Returns the largest density the template is designed for.
    #[must_use]
    pub const fn max_density(self) -> f64 {
        match self {
            Self::Corridor => 0.15,
            Self::Ring => 0.12,
            Self::Spiral => 0.18,
            Self::Cross => 0.10,
        }
    }

    /// Produces up to `count` cells on a `rows` x `cols` board.
    pub fn generate<R>(self, rows: usize, cols: usize, count: usize, rng: &mut R) -> Vec<Position>
    where
        R: Rng + ?Sized,
    {
        if rows.min(cols) < self.min_size() || count == 0 {
            return Vec::new();
        }
        let transpose = rng.random_bool(0.5);
        let (r, c) = if transpose { (cols, rows) } else { (rows, cols) };
        let cells = match self {
            Self::Corridor => corridor(r, c, count, rng),
            Self::Ring => ring(r, c, count, rng),
            Self::Spiral => spiral(r, c, count, rng),
            Self::Cross => cross(r, c, count, rng),
        };
        cells
            .into_iter()
            .take(count)
            .map(|(row, col)| if transpose { cell(col, row) } else { cell(row, col) })
            .collect()
    }
}

impl Display for MaskTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MaskTemplate {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| UnknownOption::new("mask template", s))
    }
}

#[expect(clippy::cast_possible_truncation)]
fn cell(row: usize, col: usize) -> Position {
    Position::new(row as u8, col as u8)
}

/// Vertical walls two columns apart, grown alternately from the top and the
/// bottom edge, each leaving a two-cell gap.
fn corridor<R>(rows: usize, cols: usize, count: usize, rng: &mut R) -> Vec<(usize, usize)>
where
    R: Rng + ?Sized,
{
    let wall = rows - 2;
    let mut from_top = rng.random_bool(0.5);
    let mut out = Vec::with_capacity(count);
    let mut col = rng.random_range(1..=2);
    while out.len() < count && col + 1 < cols {
        for i in 0..wall {
            let row = if from_top { i } else { rows - 1 - i };
            out.push((row, col));
        }
        from_top = !from_top;
        col += 2;
    }
    out
}

/// The outline of the smallest square that fits `count` cells plus a gap,
/// starting after a random gap position.
fn ring<R>(rows: usize, cols: usize, count: usize, rng: &mut R) -> Vec<(usize, usize)>
where
    R: Rng + ?Sized,
{
    let max_side = (rows - 2).min(cols - 2);
    let mut side = 3;
    while side < max_side && 4 * (side - 1) < count + 2 {
        side += 1;
    }
    let top = rng.random_range(1..=rows - 1 - side);
    let left = rng.random_range(1..=cols - 1 - side);
    let outline = outline(top, left, side, side);
    let start = rng.random_range(0..outline.len());
    let keep = outline.len().saturating_sub(2).min(count);
    outline.iter().cycle().skip(start).take(keep).copied().collect()
}

/// Nested outlines two cells apart inside the border, walked clockwise from
/// a random corner; each outline stops two cells short of closing.
fn spiral<R>(rows: usize, cols: usize, count: usize, rng: &mut R) -> Vec<(usize, usize)>
where
    R: Rng + ?Sized,
{
    let corner = rng.random_range(0..4);
    let mut out = Vec::with_capacity(count);
    let mut depth = 1;
    while out.len() < count && rows > 2 * depth + 1 && cols > 2 * depth + 1 {
        let height = rows - 2 * depth;
        let width = cols - 2 * depth;
        let ring = outline(depth, depth, height, width);
        let offset = corner * ring.len() / 4;
        let keep = ring.len().saturating_sub(2);
        out.extend(ring.iter().cycle().skip(offset).take(keep).copied());
        depth += 2;
    }
    out
}

/// A plus sign centred away from the border.
fn cross<R>(rows: usize, cols: usize, count: usize, rng: &mut R) -> Vec<(usize, usize)>
where
    R: Rng + ?Sized,
{
    let row = rng.random_range(2..=rows - 3);
    let col = rng.random_range(2..=cols - 3);
    let reach = (row - 1).min(rows - 2 - row).min(col - 1).min(cols - 2 - col);
    let arm = (count.saturating_sub(1) / 4).clamp(1, reach.max(1));
    let mut out = vec![(row, col)];
    for i in 1..=arm {
        out.extend([
            (row - i, col),
            (row, col + i),
            (row + i, col),
            (row, col - i),
        ]);
    }
    out
}

/// Cells of a rectangle outline in clockwise order from its top-left corner.
fn outline(top: usize, left: usize, height: usize, width: usize) -> Vec<(usize, usize)> {
    if height == 1 || width == 1 {
        return (0..height)
            .flat_map(|r| (0..width).map(move |c| (top + r, left + c)))
            .collect();
    }
    let bottom = top + height - 1;
    let right = left + width - 1;
    let mut out = Vec::with_capacity(2 * (height + width) - 4);
    out.extend((left..right).map(|c| (top, c)));
    out.extend((top..bottom).map(|r| (r, right)));
    out.extend((left + 1..=right).rev().map(|c| (bottom, c)));
    out.extend((top + 1..=bottom).rev().map(|r| (r, left)));
    out
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg64;

    use super::*;

    #[test]
    fn test_outline_is_closed_loop() {
        let cells = outline(1, 1, 3, 4);
        assert_eq!(cells.len(), 10);
        assert_eq!(cells[0], (1, 1));
        for pair in cells.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            assert_eq!(a.0.abs_diff(b.0) + a.1.abs_diff(b.1), 1);
        }
    }

    #[test]
    fn test_templates_stay_in_bounds() {
        let mut rng = Pcg64::seed_from_u64(8);
        for template in MaskTemplate::ALL {
            for side in template.min_size()..=12 {
                for count in 1..=side * 2 {
                    let cells = template.generate(side, side + 1, count, &mut rng);
                    assert!(cells.len() <= count, "{template} {side} {count}");
                    assert!(!cells.is_empty(), "{template} {side} {count}");
                    for pos in &cells {
                        assert!(usize::from(pos.row()) < side);
                        assert!(usize::from(pos.col()) < side + 1);
                        assert_ne!((pos.row(), pos.col()), (0, 0));
                    }
                }
            }
        }
    }

    #[test]
    fn test_small_board_yields_nothing() {
        let mut rng = Pcg64::seed_from_u64(8);
        assert!(MaskTemplate::Spiral.generate(6, 6, 3, &mut rng).is_empty());
    }
}
