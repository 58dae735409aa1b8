use std::{
    fmt::{self, Display},
    str::FromStr,
    time::Duration,
};

/// Difficulty tier of a generated puzzle.
///
/// The tier sets the uniqueness budget, the blocked-cell density cap and the
/// clue-density floor at which clue reduction stops.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    /// Many clues, no blocked cells unless forced.
    Easy,
    /// The default tier.
    #[default]
    Medium,
    /// Sparse clues.
    Hard,
    /// Sparsest clues and the densest masks.
    Expert,
}

impl Difficulty {
    /// All tiers, easiest first.
    pub const ALL: [Self; 4] = [Self::Easy, Self::Medium, Self::Hard, Self::Expert];

    /// Returns the wall-clock budget of one uniqueness validation.
    #[must_use]
    pub const fn validator_budget(self) -> Duration {
        Duration::from_millis(match self {
            Self::Easy => 150,
            Self::Medium => 250,
            Self::Hard => 400,
            Self::Expert => 600,
        })
    }

    /// Returns the blocked-cell density cap, or `0.0` if masks are disabled.
    #[must_use]
    pub const fn mask_density_cap(self) -> f64 {
        match self {
            Self::Easy => 0.0,
            Self::Medium => 0.10,
            Self::Hard => 0.15,
            Self::Expert => 0.18,
        }
    }

    /// Returns the fraction of values that stay revealed at minimum.
    #[must_use]
    pub const fn clue_density_floor(self) -> f64 {
        match self {
            Self::Easy => 0.45,
            Self::Medium => 0.32,
            Self::Hard => 0.24,
            Self::Expert => 0.18,
        }
    }

    /// Returns the minimum number of clues for a puzzle with `max_value` values.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn min_clues(self, max_value: u32) -> usize {
        let floor = (f64::from(max_value) * self.clue_density_floor()).ceil() as usize;
        floor.max(2).min(max_value as usize)
    }
}

impl Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
            Self::Expert => "expert",
        })
    }
}

/// Error returned when parsing an unknown option name.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("unknown {kind} {name:?}")]
pub struct UnknownOption {
    kind: &'static str,
    name: String,
}

impl UnknownOption {
    pub(crate) fn new(kind: &'static str, name: &str) -> Self {
        Self {
            kind,
            name: name.to_owned(),
        }
    }
}

impl FromStr for Difficulty {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.to_string() == s)
            .ok_or_else(|| UnknownOption::new("difficulty", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_clues() {
        assert_eq!(Difficulty::Easy.min_clues(25), 12);
        assert_eq!(Difficulty::Expert.min_clues(25), 5);
        assert_eq!(Difficulty::Expert.min_clues(4), 2);
        assert_eq!(Difficulty::Easy.min_clues(1), 1);
    }

    #[test]
    fn test_budgets_grow_with_tier() {
        let budgets = Difficulty::ALL.map(Difficulty::validator_budget);
        assert!(budgets.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_parse() {
        assert_eq!("hard".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert!("nightmare".parse::<Difficulty>().is_err());
    }
}
