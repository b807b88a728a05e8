use std::collections::HashSet;

/// Decodes entities and re-encodes `&`, `<` and `>`, so escaping an already
/// escaped string is a no-op.
pub fn escape_text(input: &str) -> String {
    let decoded = html_escape::decode_html_entities(input);
    html_escape::encode_text(&decoded).to_string()
}

/// Escapes HTML in a post body, fenced code blocks (```) included. Bodies are
/// rendered as HTML by clients, so nothing is stored as live markup; the
/// fence markers themselves survive unchanged.
pub fn sanitize_body(input: &str) -> String {
    escape_text(input)
}

/// Strips every HTML tag, for single-line fields such as titles and names.
pub fn strip_all_html(input: &str) -> String {
    ammonia::Builder::new()
        .tags(HashSet::new())
        .clean(input)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_all_html() {
        assert_eq!(strip_all_html("<b>Hooks</b> in React"), "Hooks in React");
        assert_eq!(strip_all_html("<script>alert(1)</script>Title"), "Title");
    }

    #[test]
    fn test_sanitize_body_escapes_prose_and_code_blocks() {
        let input = "Hello <img src=x onerror=alert(1)>\n```\n<div>code</div>\n```";
        let output = sanitize_body(input);
        assert!(output.starts_with("Hello &lt;img src=x onerror=alert(1)&gt;"));
        assert!(output.ends_with("```\n&lt;div&gt;code&lt;/div&gt;\n```"));
        assert!(!output.contains('<'));
    }

    #[test]
    fn test_sanitize_body_escapes_inline_fence() {
        let output = sanitize_body("hi ```<img src=x onerror=alert(1)>``` bye");
        assert_eq!(output, "hi ```&lt;img src=x onerror=alert(1)&gt;``` bye");
    }

    #[test]
    fn test_sanitize_body_does_not_double_escape() {
        let once = sanitize_body("Fish & chips");
        assert_eq!(once, "Fish &amp; chips");
        assert_eq!(sanitize_body(&once), once);
    }
}
