use std::time::Duration;

/// Lenient integer parse of a typed answer: surrounding whitespace is
/// ignored, an optional sign is accepted, and parsing stops at the first
/// non-digit (`"12abc"` reads as 12). Returns `None` when no digit leads.
pub fn parse_answer(raw: &str) -> Option<i64> {
    let s = raw.trim();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    let magnitude: i64 = rest[..digits_len].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

fn digit_len(n: i64) -> u32 {
    n.unsigned_abs().checked_ilog10().map_or(1, |d| d + 1)
}

/// Whether the input looks finished: at least as many digits as the
/// expected answer, three or more digits, or an order of magnitude past
/// the expected value. Never used for scoring.
pub fn should_auto_submit(raw: &str, expected: i64) -> bool {
    let Some(answer) = parse_answer(raw) else {
        return false;
    };
    let input_len = digit_len(answer);
    input_len >= digit_len(expected)
        || input_len >= 3
        || answer.unsigned_abs() > expected.unsigned_abs().saturating_mul(10)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoSubmitPolicy {
    pub delay: Duration,
}

impl AutoSubmitPolicy {
    pub fn from_millis(ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(ms),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.delay.is_zero()
    }

    /// Delay after which the current input should be submitted, if any.
    pub fn schedule_delay(&self, raw: &str, expected: i64) -> Option<Duration> {
        (self.is_enabled() && should_auto_submit(raw, expected)).then_some(self.delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_empty_and_non_numeric() {
        assert_eq!(parse_answer(""), None);
        assert_eq!(parse_answer("   "), None);
        assert_eq!(parse_answer("-"), None);
        assert_eq!(parse_answer("abc"), None);
        assert_eq!(parse_answer("x12"), None);
    }

    #[test]
    fn parse_accepts_signs_and_trailing_junk() {
        assert_eq!(parse_answer("42"), Some(42));
        assert_eq!(parse_answer(" -17 "), Some(-17));
        assert_eq!(parse_answer("+5"), Some(5));
        assert_eq!(parse_answer("12abc"), Some(12));
        assert_eq!(parse_answer("007"), Some(7));
    }

    #[test]
    fn parse_rejects_overflowing_input() {
        assert_eq!(parse_answer("99999999999999999999999"), None);
    }

    #[test]
    fn digit_lengths() {
        assert_eq!(digit_len(0), 1);
        assert_eq!(digit_len(9), 1);
        assert_eq!(digit_len(-10), 2);
        assert_eq!(digit_len(999), 3);
        assert_eq!(digit_len(i64::MIN), 19);
    }

    #[test]
    fn submits_when_length_matches_expected() {
        assert!(should_auto_submit("7", 7));
        assert!(should_auto_submit("3", 7));
        assert!(!should_auto_submit("1", 12));
        assert!(should_auto_submit("13", 12));
        assert!(should_auto_submit("-4", 4));
    }

    #[test]
    fn submits_at_three_digits_regardless_of_expected() {
        assert!(should_auto_submit("123", 4567));
        assert!(!should_auto_submit("12", 4567));
    }

    #[test]
    fn submits_when_input_dwarfs_expected() {
        // one digit typed, expected two digits, but 0 * 10 < 1 only for 0
        assert!(!should_auto_submit("5", 10));
        assert!(should_auto_submit("9", 0));
    }

    #[test]
    fn never_submits_unparseable() {
        assert!(!should_auto_submit("", 7));
        assert!(!should_auto_submit("-", 7));
    }

    #[test]
    fn policy_disabled_at_zero_delay() {
        let policy = AutoSubmitPolicy::from_millis(0);
        assert!(!policy.is_enabled());
        assert_eq!(policy.schedule_delay("7", 7), None);
    }

    #[test]
    fn policy_schedules_configured_delay() {
        let policy = AutoSubmitPolicy::from_millis(800);
        assert_eq!(
            policy.schedule_delay("7", 7),
            Some(Duration::from_millis(800))
        );
        assert_eq!(policy.schedule_delay("1", 12), None);
    }
}
