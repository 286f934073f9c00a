//! Step states and navigation directions.
//!
//! Internally a wizard position is a tagged [`StepState`]. On the wire it is
//! still a signed integer: positive numbers are form pages, `-1` is the
//! review page (or the terminal submit when the wizard has no review page),
//! `-2` is the error sentinel for an unrecognized direction and `-3` is the
//! terminal submit confirmed from the review page.

use std::fmt;

/// Wire value of the review page (terminal submit when there is no review)
pub const REVIEW_STEP: i64 = -1;
/// Wire value produced by an unrecognized navigation direction
pub const INVALID_STEP: i64 = -2;
/// Wire value of the terminal submit confirmed from the review page
pub const TERMINAL_STEP: i64 = -3;

/// Position of a wizard instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepState {
    /// A form page, 1-based
    Active(u32),
    /// Read-only review/confirmation page
    Review,
    /// Absorbing final state: persist, purge, redirect
    Terminal,
    /// Anything the navigation rules cannot map to a real position
    Invalid,
}

impl StepState {
    /// Decode a wire step number.
    ///
    /// `-1` means the review page only when the wizard has one; otherwise it
    /// is the terminal submit.
    pub fn from_wire(step: i64, has_review: bool) -> Self {
        match step {
            n if n >= 1 => u32::try_from(n).map_or(StepState::Invalid, StepState::Active),
            REVIEW_STEP if has_review => StepState::Review,
            REVIEW_STEP => StepState::Terminal,
            TERMINAL_STEP => StepState::Terminal,
            _ => StepState::Invalid,
        }
    }

    /// Encode for the wire, the inverse of [`StepState::from_wire`]
    pub fn to_wire(self, has_review: bool) -> i64 {
        match self {
            StepState::Active(n) => i64::from(n),
            StepState::Review => REVIEW_STEP,
            StepState::Terminal if has_review => TERMINAL_STEP,
            StepState::Terminal => REVIEW_STEP,
            StepState::Invalid => INVALID_STEP,
        }
    }

    /// Step number if this is a form page
    pub fn active_number(self) -> Option<u32> {
        match self {
            StepState::Active(n) => Some(n),
            _ => None,
        }
    }

    pub fn is_active(self) -> bool {
        matches!(self, StepState::Active(_))
    }

    /// Compute the position reached by navigating in `direction`.
    ///
    /// `previous` is the position held before the last navigation; it is
    /// where "previous" leads from the review page.
    pub fn navigate(
        self,
        direction: &Direction,
        previous: Option<StepState>,
        has_review: bool,
    ) -> StepState {
        match (direction, self) {
            (Direction::Next, StepState::Active(n)) => StepState::Active(n + 1),
            (Direction::Next, StepState::Review) => StepState::Terminal,
            (Direction::Previous, StepState::Review) => previous.unwrap_or(StepState::Invalid),
            (Direction::Previous, StepState::Active(n)) if n > 1 => StepState::Active(n - 1),
            (Direction::Submit, StepState::Active(_)) if has_review => StepState::Review,
            (Direction::Submit, StepState::Active(_)) => StepState::Terminal,
            (Direction::Submit, StepState::Review) => StepState::Terminal,
            _ => StepState::Invalid,
        }
    }
}

impl fmt::Display for StepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepState::Active(n) => write!(f, "step {}", n),
            StepState::Review => write!(f, "review"),
            StepState::Terminal => write!(f, "terminal"),
            StepState::Invalid => write!(f, "invalid"),
        }
    }
}

/// Intent declared by a navigation control (`data-step` attribute)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
    Submit,
    Unknown(String),
}

impl Direction {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "next" => Direction::Next,
            "previous" => Direction::Previous,
            "submit" => Direction::Submit,
            other => Direction::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Direction::Next => "next",
            Direction::Previous => "previous",
            Direction::Submit => "submit",
            Direction::Unknown(raw) => raw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_decoding_with_review() {
        assert_eq!(StepState::from_wire(3, true), StepState::Active(3));
        assert_eq!(StepState::from_wire(-1, true), StepState::Review);
        assert_eq!(StepState::from_wire(-2, true), StepState::Invalid);
        assert_eq!(StepState::from_wire(-3, true), StepState::Terminal);
        assert_eq!(StepState::from_wire(0, true), StepState::Invalid);
        assert_eq!(StepState::from_wire(-7, true), StepState::Invalid);
    }

    #[test]
    fn test_wire_decoding_without_review() {
        assert_eq!(StepState::from_wire(-1, false), StepState::Terminal);
        assert_eq!(StepState::from_wire(-3, false), StepState::Terminal);
        assert_eq!(StepState::from_wire(-2, false), StepState::Invalid);
    }

    #[test]
    fn test_wire_encoding_is_stable() {
        for has_review in [true, false] {
            for state in [
                StepState::Active(1),
                StepState::Active(9),
                StepState::Terminal,
                StepState::Invalid,
            ] {
                let wire = state.to_wire(has_review);
                assert_eq!(StepState::from_wire(wire, has_review), state);
            }
        }
        assert_eq!(StepState::from_wire(StepState::Review.to_wire(true), true), StepState::Review);
    }

    #[test]
    fn test_next_increments() {
        let next = StepState::Active(2).navigate(&Direction::Next, None, true);
        assert_eq!(next, StepState::Active(3));
    }

    #[test]
    fn test_previous_decrements_without_history() {
        let prev = StepState::Active(3).navigate(&Direction::Previous, None, true);
        assert_eq!(prev, StepState::Active(2));
    }

    #[test]
    fn test_previous_from_first_step_is_invalid() {
        let prev = StepState::Active(1).navigate(&Direction::Previous, None, true);
        assert_eq!(prev, StepState::Invalid);
    }

    #[test]
    fn test_previous_from_review_returns_to_previous_step() {
        let prev = StepState::Review.navigate(
            &Direction::Previous,
            Some(StepState::Active(3)),
            true,
        );
        assert_eq!(prev, StepState::Active(3));
        assert_ne!(prev.to_wire(true), INVALID_STEP);
    }

    #[test]
    fn test_submit_goes_to_review_or_terminal() {
        let with_review = StepState::Active(3).navigate(&Direction::Submit, None, true);
        assert_eq!(with_review, StepState::Review);
        assert_eq!(with_review.to_wire(true), -1);

        let without_review = StepState::Active(3).navigate(&Direction::Submit, None, false);
        assert_eq!(without_review, StepState::Terminal);
        assert_eq!(without_review.to_wire(false), -1);

        let confirmed = StepState::Review.navigate(&Direction::Submit, None, true);
        assert_eq!(confirmed, StepState::Terminal);
    }

    #[test]
    fn test_unknown_direction_is_invalid() {
        let direction = Direction::parse("sideways");
        assert_eq!(direction, Direction::Unknown("sideways".to_string()));
        let target = StepState::Active(2).navigate(&direction, None, true);
        assert_eq!(target.to_wire(true), INVALID_STEP);
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!(Direction::parse("next"), Direction::Next);
        assert_eq!(Direction::parse(" previous "), Direction::Previous);
        assert_eq!(Direction::parse("submit"), Direction::Submit);
        assert_eq!(Direction::Submit.as_str(), "submit");
    }
}
