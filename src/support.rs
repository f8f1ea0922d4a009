pub mod str {
    /// Escape `&`, quotes, backtick and angle brackets for HTML output.
    pub fn escape_html(data: &str) -> String {
        let mut output = String::with_capacity(data.len());
        for c in data.chars() {
            match c {
                '&' => output.push_str("&amp;"),
                '"' => output.push_str("&quot;"),
                '\'' => output.push_str("&#x27;"),
                '`' => output.push_str("&#x60;"),
                '<' => output.push_str("&lt;"),
                '>' => output.push_str("&gt;"),
                _ => output.push(c),
            }
        }
        output
    }

    /// Escape function that leaves text untouched.
    pub fn no_escape(data: &str) -> String {
        data.to_owned()
    }

    #[cfg(test)]
    mod test {
        use super::escape_html;

        #[test]
        fn test_escape_html() {
            assert_eq!(
                escape_html("&\"'`\\<>"),
                "&amp;&quot;&#x27;&#x60;\\&lt;&gt;"
            );
            assert_eq!(escape_html("plain = text"), "plain = text");
            assert_eq!(escape_html("&amp;"), "&amp;amp;");
        }
    }
}
