//! Token kinds and masking for display

use serde::Serialize;

/// Kind of Slack token, from its prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Bot,
    User,
    App,
    Unknown,
}

impl TokenKind {
    pub fn detect(token: &str) -> Self {
        if token.starts_with("xoxb-") {
            Self::Bot
        } else if token.starts_with("xoxp-") {
            Self::User
        } else if token.starts_with("xapp-") {
            Self::App
        } else {
            Self::Unknown
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Bot => "Bot Token",
            Self::User => "User Token",
            Self::App => "App Token",
            Self::Unknown => "Unknown Token",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Bot => "Acts as the app's bot user; messages appear from the bot",
            Self::User => "Acts as the installing user; messages appear from that user",
            Self::App => "App-level token for features like Socket Mode",
            Self::Unknown => "Unrecognized token prefix",
        }
    }
}

/// Mask a token for display, keeping the prefix up to the last dash and the
/// final character
pub fn mask_token(token: &str) -> String {
    if token.is_empty() {
        return String::new();
    }
    if token.chars().count() <= 4 {
        return "***".to_string();
    }

    let last = token.chars().last().unwrap_or_default();
    match token.rfind('-') {
        Some(dash) => format!("{}***{}", &token[..=dash], last),
        None => {
            let first = token.chars().next().unwrap_or_default();
            format!("{}***", first)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token(""), "");
        assert_eq!(mask_token("abcd"), "***");
        assert_eq!(mask_token("xoxb-1-2-abcd"), "xoxb-1-2-***d");
        assert_eq!(mask_token("secretvalue"), "s***");
    }

    #[test]
    fn test_detect_kind() {
        assert_eq!(TokenKind::detect("xoxb-123"), TokenKind::Bot);
        assert_eq!(TokenKind::detect("xoxp-123"), TokenKind::User);
        assert_eq!(TokenKind::detect("xapp-123"), TokenKind::App);
        assert_eq!(TokenKind::detect(""), TokenKind::Unknown);
        assert_eq!(TokenKind::detect("xoxz-1"), TokenKind::Unknown);
        assert_eq!(TokenKind::Bot.display_name(), "Bot Token");
    }
}
