/// Replace `${ENV_VAR}` placeholders in raw config text.
///
/// `${VAR:-fallback}` uses `fallback` when `VAR` is unset. Unresolvable
/// variables without a fallback are left as-is.
pub fn substitute_env(input: &str) -> String {
    substitute_with(input, |name| std::env::var(name).ok())
}

/// Same as [`substitute_env`] with a caller-supplied variable lookup.
pub fn substitute_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // Unterminated, emit the remainder literally.
            result.push_str(&rest[start..]);
            return result;
        };

        let expr = &after[..end];
        let (name, fallback) = match expr.split_once(":-") {
            Some((name, fallback)) => (name, Some(fallback)),
            None => (expr, None),
        };

        match (name.is_empty(), lookup(name), fallback) {
            (false, Some(value), _) => result.push_str(&value),
            (false, None, Some(fallback)) => result.push_str(fallback),
            _ => {
                result.push_str("${");
                result.push_str(expr);
                result.push('}');
            },
        }
        rest = &after[end + 1..];
    }

    result.push_str(rest);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        (name == "CRM_REFRESH").then(|| "r-secret".to_string())
    }

    #[test]
    fn substitutes_known_var() {
        assert_eq!(
            substitute_with("refreshToken = \"${CRM_REFRESH}\"", lookup),
            "refreshToken = \"r-secret\""
        );
    }

    #[test]
    fn leaves_unknown_var() {
        assert_eq!(
            substitute_with("${TOKENRELAY_NONEXISTENT_XYZ}", lookup),
            "${TOKENRELAY_NONEXISTENT_XYZ}"
        );
    }

    #[test]
    fn fallback_used_when_unset() {
        assert_eq!(substitute_with("${MISSING:-Bearer}", lookup), "Bearer");
        assert_eq!(substitute_with("${CRM_REFRESH:-x}", lookup), "r-secret");
    }

    #[test]
    fn malformed_placeholders_are_literal() {
        assert_eq!(substitute_with("a ${ b", lookup), "a ${ b");
        assert_eq!(substitute_with("${}", lookup), "${}");
    }

    #[test]
    fn no_placeholders() {
        assert_eq!(substitute_env("plain text"), "plain text");
    }
}
