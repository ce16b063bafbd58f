//! Message templates with `{user_mention}` / `{user_name}` placeholders.

/// Values substituted into a template.
#[derive(Debug, Clone, Copy)]
pub struct Placeholders<'a> {
    pub user_mention: &'a str,
    pub user_name: &'a str,
}

/// Substitute the known placeholders in a single pass.
///
/// Unknown `{...}` sequences and unbalanced braces are copied verbatim, so
/// substituted values are never re-expanded.
pub fn render(template: &str, values: &Placeholders<'_>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let Some(end) = tail.find('}') else {
            out.push_str(tail);
            return out;
        };
        match &tail[1..end] {
            "user_mention" => out.push_str(values.user_mention),
            "user_name" => out.push_str(values.user_name),
            _ => out.push_str(&tail[..=end]),
        }
        rest = &tail[end + 1..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALUES: Placeholders<'static> = Placeholders {
        user_mention: "<@42>",
        user_name: "Alice",
    };

    #[test]
    fn test_render_both_placeholders() {
        assert_eq!(
            render("Welcome {user_mention} ({user_name})!", &VALUES),
            "Welcome <@42> (Alice)!"
        );
    }

    #[test]
    fn test_render_unknown_placeholder_kept() {
        assert_eq!(render("Hi {server} {user_name}", &VALUES), "Hi {server} Alice");
    }

    #[test]
    fn test_render_unbalanced_brace() {
        assert_eq!(render("Hey {user_name", &VALUES), "Hey {user_name");
    }

    #[test]
    fn test_render_does_not_reexpand_values() {
        let values = Placeholders {
            user_mention: "<@1>",
            user_name: "{user_mention}",
        };
        assert_eq!(render("{user_name}", &values), "{user_mention}");
    }

    #[test]
    fn test_render_no_placeholders() {
        assert_eq!(render("plain text", &VALUES), "plain text");
    }
}
