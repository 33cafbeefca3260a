use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref DATA_IMAGE_RE: Regex =
        Regex::new(r"^data:image/[a-zA-Z0-9.+-]+;base64,[A-Za-z0-9+/=\r\n]+$").unwrap();
}

/// Encoded size cap for inline images (5 MiB of data-URI text).
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// A post image is either an http(s) URL or a base64 `data:image/...` URI,
/// capped at `MAX_IMAGE_BYTES` of encoded text.
pub fn validate_image(value: &str) -> Result<(), &'static str> {
    if value.len() > MAX_IMAGE_BYTES {
        return Err("Image must be smaller than 5MB.");
    }
    if DATA_IMAGE_RE.is_match(value) {
        return Ok(());
    }
    match Url::parse(value) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Ok(()),
        _ => Err("Image must be an http(s) URL or a base64 data URI."),
    }
}

pub fn escape_like_pattern(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '%' | '_' | '\\' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            _ => escaped.push(ch),
        }
    }
    escaped
}
