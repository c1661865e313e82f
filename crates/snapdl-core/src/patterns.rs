//! Structural matching against resolver pages and payloads.
//!
//! The resolver's HTML/JS format is outside our control, so every regex that
//! depends on it sits behind [`PayloadPatterns`]. The extractor and decoder
//! only see the captured values.

use regex::Regex;

use crate::decoder::ControlTuple;

/// Matching rules for one resolver flavor.
pub trait PayloadPatterns: Send + Sync {
    /// Session token from the landing page.
    fn find_token(&self, landing_html: &str) -> Option<String>;

    /// Control tuple embedded in the submit response.
    fn find_control_tuple(&self, payload: &str) -> Option<ControlTuple>;

    /// First `href` inside the decoded script (quotes are backslash-escaped there).
    fn find_candidate_link(&self, decoded_html: &str) -> Option<String>;
}

/// Patterns for the snaptik landing page and its packed `abc2.php` response.
#[derive(Debug, Clone)]
pub struct SnaptikPatterns {
    token: Regex,
    control_tuple: Regex,
    escaped_href: Regex,
}

impl SnaptikPatterns {
    pub fn new() -> Self {
        Self {
            token: compile(r#"name="token" value="(.*?)""#),
            control_tuple: compile(r#"\("(\w+)",(\d+),"(\w+)",(\d+),(\d+),(\d+)\)"#),
            escaped_href: compile(r#"href=\\"([^\\"]+)\\""#),
        }
    }
}

impl Default for SnaptikPatterns {
    fn default() -> Self {
        Self::new()
    }
}

fn compile(pattern: &str) -> Regex {
    // Patterns are literals in this file; a failure is a programming error.
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern {pattern}: {e}"))
}

impl PayloadPatterns for SnaptikPatterns {
    fn find_token(&self, landing_html: &str) -> Option<String> {
        self.token
            .captures(landing_html)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    fn find_control_tuple(&self, payload: &str) -> Option<ControlTuple> {
        let caps = self.control_tuple.captures(payload)?;
        Some(ControlTuple {
            encoded: caps.get(1)?.as_str().to_string(),
            reserved: caps.get(2)?.as_str().to_string(),
            alphabet: caps.get(3)?.as_str().to_string(),
            offset: caps.get(4)?.as_str().parse().ok()?,
            base: caps.get(5)?.as_str().parse().ok()?,
            trailing: caps.get(6)?.as_str().to_string(),
        })
    }

    fn find_candidate_link(&self, decoded_html: &str) -> Option<String> {
        self.escaped_href
            .captures(decoded_html)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_from_landing_page() {
        let html = r#"<form><input name="token" value="eyJ0eXAi.abc" type="hidden"></form>"#;
        assert_eq!(
            SnaptikPatterns::new().find_token(html).as_deref(),
            Some("eyJ0eXAi.abc")
        );
    }

    #[test]
    fn token_missing() {
        let html = r#"<input name="url" value="x">"#;
        assert!(SnaptikPatterns::new().find_token(html).is_none());
    }

    #[test]
    fn control_tuple_captures_all_fields() {
        let payload =
            r#"var _0xc=1;eval(function(h,u,n,t,e,r){...}("kQzkQz",41,"kQabcdefz",37,7,29))"#;
        let tuple = SnaptikPatterns::new().find_control_tuple(payload).unwrap();
        assert_eq!(tuple.encoded, "kQzkQz");
        assert_eq!(tuple.reserved, "41");
        assert_eq!(tuple.alphabet, "kQabcdefz");
        assert_eq!(tuple.offset, 37);
        assert_eq!(tuple.base, 7);
        assert_eq!(tuple.trailing, "29");
    }

    #[test]
    fn unused_fields_accept_any_width() {
        let payload = r#"("ab",1234567890123456789012345,"abz",0,2,98765432109876543210987)"#;
        let tuple = SnaptikPatterns::new().find_control_tuple(payload).unwrap();
        assert_eq!(tuple.reserved, "1234567890123456789012345");
        assert_eq!(tuple.trailing, "98765432109876543210987");
        assert_eq!(tuple.base, 2);
        // "ab" reads "01" in base 2
        assert_eq!(tuple.decode().unwrap(), "\u{1}");
    }

    #[test]
    fn control_tuple_requires_six_fields() {
        let payload = r#"("abc",1,"xyz",2,3)"#;
        assert!(SnaptikPatterns::new().find_control_tuple(payload).is_none());
    }

    #[test]
    fn candidate_link_with_escaped_quotes() {
        let decoded = concat!(
            r##"$("#download").innerHTML = "##,
            r##""<a href=\"https://d.snaptik.app/file.mp4?t=1\" class=\"btn\">";"##
        );
        assert_eq!(
            SnaptikPatterns::new().find_candidate_link(decoded).as_deref(),
            Some("https://d.snaptik.app/file.mp4?t=1")
        );
    }

    #[test]
    fn plain_quotes_are_not_candidates() {
        let decoded = r#"<a href="https://d.snaptik.app/file.mp4">"#;
        assert!(SnaptikPatterns::new().find_candidate_link(decoded).is_none());
    }

    #[test]
    fn first_candidate_wins() {
        let decoded = r#"<a href=\"https://ads.example/x\"><a href=\"https://d.snaptik.app/v\">"#;
        assert_eq!(
            SnaptikPatterns::new().find_candidate_link(decoded).as_deref(),
            Some("https://ads.example/x")
        );
    }
}
