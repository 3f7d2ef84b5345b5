//! Secret scrubbing for message content that ends up in logs.

use regex::Regex;
use std::sync::LazyLock;

/// Bot tokens: base64 user id, timestamp and HMAC separated by dots.
static BOT_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[MNO][A-Za-z\d_-]{23,25}\.[A-Za-z\d_-]{6}\.[A-Za-z\d_-]{27,38}").unwrap()
});
static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(sk-[a-zA-Z0-9]{32,})|((?:Bearer|Bot)\s+[a-zA-Z0-9\-\._~+/]+=*)").unwrap()
});
static WEBHOOK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https://(?:[a-z]+\.)?discord(?:app)?\.com/api/webhooks/\d+/[A-Za-z0-9_\-]+").unwrap()
});

/// Replace bot tokens, bearer credentials and webhook URLs with placeholders.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = WEBHOOK_RE.replace_all(input, "[REDACTED_WEBHOOK]");
    let redacted = BOT_TOKEN_RE.replace_all(&redacted, "[REDACTED_TOKEN]");
    API_KEY_RE.replace_all(&redacted, "[REDACTED_TOKEN]").into_owned()
}
