use once_cell::sync::Lazy;
use regex::Regex;

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

/// Drops markup, then escapes what is left so it is inert in HTML.
pub fn sanitize(input: &str) -> String {
    let stripped = TAG.replace_all(input, "");
    let mut out = String::with_capacity(stripped.len());
    for c in stripped.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags() {
        assert_eq!(sanitize("<b>hello</b> world"), "hello world");
        assert_eq!(sanitize("<script>alert(1)</script>"), "alert(1)");
    }

    #[test]
    fn escapes_leftovers() {
        assert_eq!(sanitize("Tom & Jerry"), "Tom &amp; Jerry");
        assert_eq!(sanitize("it's \"fine\""), "it&#039;s &quot;fine&quot;");
        assert_eq!(sanitize("1 > 0"), "1 &gt; 0");
        assert_eq!(sanitize("a < b"), "a &lt; b");
    }

    #[test]
    fn empty_stays_empty() {
        assert_eq!(sanitize(""), "");
    }
}
