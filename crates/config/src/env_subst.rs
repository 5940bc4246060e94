/// Replace `${ENV_VAR}` placeholders in config text.
///
/// Unresolvable variables are left as-is so the parse error points at the
/// real placeholder instead of an empty string.
pub fn substitute_env(input: &str) -> String {
    substitute_with(input, |name| std::env::var(name).ok())
}

/// Placeholder replacement with a caller-supplied lookup, so tests never
/// touch the process environment.
fn substitute_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) if end > 0 => {
                let name = &after[..end];
                match lookup(name) {
                    Some(value) => out.push_str(&value),
                    None => {
                        out.push_str("${");
                        out.push_str(name);
                        out.push('}');
                    },
                }
                rest = &after[end + 1..];
            },
            // No closing brace, or `${}`. Emit literally.
            _ => {
                out.push_str("${");
                rest = after;
            },
        }
    }

    out.push_str(rest);
    out
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "MIRRORPLANE_TEST_KEY" => Some("resolved".to_string()),
            _ => None,
        }
    }

    #[test]
    fn substitutes_known_var() {
        assert_eq!(
            substitute_with("secret = \"${MIRRORPLANE_TEST_KEY}\"", lookup),
            "secret = \"resolved\""
        );
    }

    #[test]
    fn leaves_unknown_var_in_place() {
        assert_eq!(
            substitute_with("${MIRRORPLANE_NO_SUCH_VAR}", lookup),
            "${MIRRORPLANE_NO_SUCH_VAR}"
        );
    }

    #[test]
    fn handles_multiple_and_adjacent_placeholders() {
        assert_eq!(
            substitute_with("${MIRRORPLANE_TEST_KEY}${MIRRORPLANE_TEST_KEY}", lookup),
            "resolvedresolved"
        );
    }

    #[test]
    fn unterminated_placeholder_is_literal() {
        assert_eq!(substitute_with("tail ${OOPS", lookup), "tail ${OOPS");
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(substitute_with("plain text", lookup), "plain text");
    }
}
