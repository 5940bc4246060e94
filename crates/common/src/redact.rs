//! Redaction for secret-adjacent values that end up in logs.

/// Keeps a four-character prefix of `value` and masks the rest.
///
/// Values of eight characters or fewer are fully masked so short secrets
/// never leak a meaningful fraction of themselves.
pub fn preview(value: &str) -> String {
    if value.chars().count() <= 8 {
        return "********".to_string();
    }
    let head: String = value.chars().take(4).collect();
    format!("{head}****")
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_values_fully_masked() {
        assert_eq!(preview(""), "********");
        assert_eq!(preview("hunter2"), "********");
        assert_eq!(preview("12345678"), "********");
    }

    #[test]
    fn long_values_keep_prefix_only() {
        assert_eq!(preview("sk-live-abcdef123456"), "sk-l****");
        assert!(!preview("sk-live-abcdef123456").contains("abcdef"));
    }
}
