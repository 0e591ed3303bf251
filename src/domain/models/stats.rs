//! Aggregate statistics over remembered lines and generated poems.

/// Team-wide (or per-user) corpus statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HaikuStats {
    pub five_syllable_lines: i64,
    pub seven_syllable_lines: i64,
    pub total_poems: i64,
    pub unique_owners: i64,
}

impl HaikuStats {
    pub fn total_lines(&self) -> i64 {
        self.five_syllable_lines + self.seven_syllable_lines
    }

    /// Distinct 5-7-5 combinations: the two five-syllable slots must hold
    /// different lines, so fives * sevens * (fives - 1).
    pub fn possible_combinations(&self) -> i64 {
        self.five_syllable_lines * self.seven_syllable_lines * (self.five_syllable_lines - 1)
    }
}
