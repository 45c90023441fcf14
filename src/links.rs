//! Link conversion between markdown and Slack's mrkdwn link syntax

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static MARKDOWN_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[([^\]]+)\]\((https?://[^)\s]+)\)").expect("valid regex")
});

static SLACK_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<(https?://[^|>]+)(?:\|([^>]*))?>").expect("valid regex"));

/// A link found in message text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub url: String,
    pub text: String,
}

/// Rewrite `[text](url)` as `<url|text>`
pub fn to_slack(text: &str) -> String {
    MARKDOWN_LINK.replace_all(text, "<$2|$1>").into_owned()
}

/// Links in `<url|text>` or `<url>` form; a bare link uses its URL as text
pub fn extract(text: &str) -> Vec<Link> {
    SLACK_LINK
        .captures_iter(text)
        .map(|caps| {
            let url = caps[1].to_string();
            let text = caps
                .get(2)
                .map(|m| m.as_str())
                .filter(|t| !t.is_empty())
                .unwrap_or(&url)
                .to_string();
            Link { url, text }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_slack() {
        assert_eq!(
            to_slack("see [the docs](https://example.com/a?b=1) and [x](http://x.io)"),
            "see <https://example.com/a?b=1|the docs> and <http://x.io|x>"
        );
        assert_eq!(to_slack("[not a link](ftp://x)"), "[not a link](ftp://x)");
        assert_eq!(to_slack("plain"), "plain");
    }

    #[test]
    fn test_extract() {
        let links = extract("a <https://a.io|A> b <https://b.io> c <@U123> <#C1|general>");
        assert_eq!(
            links,
            vec![
                Link {
                    url: "https://a.io".into(),
                    text: "A".into()
                },
                Link {
                    url: "https://b.io".into(),
                    text: "https://b.io".into()
                },
            ]
        );
    }
}
