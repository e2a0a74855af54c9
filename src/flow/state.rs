use std::fmt;

/// Maximum length of a one-time code.
pub const CODE_MAX_LEN: usize = 6;
/// Digits needed before the card step can be submitted.
pub const CARD_MIN_DIGITS: usize = 13;
pub const CARD_MAX_DIGITS: usize = 16;

/// Step the login is currently on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowState {
    Email,
    OneTimeCode,
    CardCapture,
    Success,
}

impl FlowState {
    /// Position in the forward order `Email -> OneTimeCode -> CardCapture -> Success`.
    #[must_use]
    pub fn ordinal(self) -> u8 {
        match self {
            Self::Email => 0,
            Self::OneTimeCode => 1,
            Self::CardCapture => 2,
            Self::Success => 3,
        }
    }

    /// Whether moving from `self` to `next` is an edge of the login.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        next == self
            || next.ordinal() == self.ordinal() + 1
            || (self == Self::OneTimeCode && next == Self::Email)
            // an existing session skips straight to the end
            || (self == Self::Email && next == Self::Success)
    }
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Email => "email",
            Self::OneTimeCode => "one-time code",
            Self::CardCapture => "card capture",
            Self::Success => "success",
        };
        f.write_str(name)
    }
}

/// Keeps the first [`CODE_MAX_LEN`] characters of a typed code.
#[must_use]
pub fn sanitize_code(input: &str) -> String {
    input.trim().chars().take(CODE_MAX_LEN).collect()
}

/// Keeps ASCII digits only, up to [`CARD_MAX_DIGITS`].
/// This is an input affordance, not card validation.
#[must_use]
pub fn sanitize_card_number(input: &str) -> String {
    input
        .chars()
        .filter(char::is_ascii_digit)
        .take(CARD_MAX_DIGITS)
        .collect()
}
