//! Outbound HTML instrumentation
//!
//! Every anchor is routed through the click endpoint and an open pixel is
//! appended. Campaign HTML is only ever rewritten into a fresh copy.

use mailpulse_common::types::RecipientId;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Characters `encodeURIComponent` leaves untouched
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const CLICK_PATH: &str = "/track/click/";
const OPEN_PATH: &str = "/track/open/";

fn anchor_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)<a\s+([^>]*href=["'])([^"']+)(["'][^>]*)>"#)
            .expect("anchor pattern is valid")
    })
}

/// Builds tracking URLs for a public base address
#[derive(Debug, Clone)]
pub struct LinkRewriter {
    base_url: String,
}

impl LinkRewriter {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Open pixel URL for a recipient
    pub fn open_url(&self, recipient_id: RecipientId) -> String {
        format!("{}{}{}", self.base_url, OPEN_PATH, recipient_id)
    }

    /// Click redirect URL for a recipient and destination
    pub fn click_url(&self, recipient_id: RecipientId, destination: &str) -> String {
        format!(
            "{}{}{}?url={}",
            self.base_url,
            CLICK_PATH,
            recipient_id,
            utf8_percent_encode(destination, URI_COMPONENT)
        )
    }

    /// Rewrite anchors and append the open pixel
    pub fn rewrite(&self, html: &str, recipient_id: RecipientId) -> String {
        let mut out = anchor_pattern()
            .replace_all(html, |caps: &Captures<'_>| {
                let url = &caps[2];
                if url.contains(CLICK_PATH) {
                    return caps[0].to_string();
                }
                format!(
                    "<a {}{}{}>",
                    &caps[1],
                    self.click_url(recipient_id, url),
                    &caps[3]
                )
            })
            .into_owned();

        out.push_str(&format!(
            r#"<img src="{}" width="1" height="1" style="display:none;" />"#,
            self.open_url(recipient_id)
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn id() -> RecipientId {
        Uuid::parse_str("6f1c2a9e-8d4b-4c1e-9a7f-0b2d3e4f5a6b").unwrap()
    }

    #[test]
    fn test_rewrites_double_quoted_anchor() {
        let rewriter = LinkRewriter::new("https://t.example.com");
        let html = r#"<p><a href="https://example.com/a?b=1&c=2">Shop</a></p>"#;

        let out = rewriter.rewrite(html, id());

        assert_eq!(
            out,
            format!(
                "<p><a href=\"https://t.example.com/track/click/{0}?url=https%3A%2F%2Fexample.com%2Fa%3Fb%3D1%26c%3D2\">Shop</a></p>\
                 <img src=\"https://t.example.com/track/open/{0}\" width=\"1\" height=\"1\" style=\"display:none;\" />",
                id()
            )
        );
    }

    #[test]
    fn test_single_quotes_and_case_and_attributes() {
        let rewriter = LinkRewriter::new("http://localhost:3000/");
        let html = "<A class='btn' HREF='https://example.com/x' target='_blank'>X</A>";

        let out = rewriter.rewrite(html, id());

        assert!(out.starts_with(&format!(
            "<a class='btn' HREF='http://localhost:3000/track/click/{}?url=https%3A%2F%2Fexample.com%2Fx' target='_blank'>X</A>",
            id()
        )));
    }

    #[test]
    fn test_already_tracked_links_untouched() {
        let rewriter = LinkRewriter::new("http://localhost:3000");
        let tracked = rewriter.click_url(id(), "https://example.com");
        let html = format!(r#"<a href="{}">Go</a>"#, tracked);

        let out = rewriter.rewrite(&html, id());

        assert!(out.starts_with(&html));
        assert_eq!(out.matches(CLICK_PATH).count(), 1);
    }

    #[test]
    fn test_pixel_appended_without_links() {
        let rewriter = LinkRewriter::new("http://localhost:3000");
        let out = rewriter.rewrite("<p>Plain</p>", id());
        assert!(out.starts_with("<p>Plain</p><img src=\"http://localhost:3000/track/open/"));
    }

    #[test]
    fn test_uri_component_unreserved_characters_kept() {
        let rewriter = LinkRewriter::new("http://h");
        let url = rewriter.click_url(id(), "a-b_c.d!e~f*g'h(i)j k/é");
        assert!(url.ends_with("?url=a-b_c.d!e~f*g'h(i)j%20k%2F%C3%A9"));
    }
}
