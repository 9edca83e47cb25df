/// Number of leading bytes inspected when classifying content.
pub const SNIFF_LEN: usize = 8192;

const OCTET_STREAM: &str = "application/octet-stream";
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Classify content by its leading bytes.
///
/// Magic-number matching comes first; content without a known signature is
/// reported as UTF-8 text when it decodes cleanly and contains no binary
/// control bytes, and as `application/octet-stream` otherwise. The file name
/// plays no part in the decision.
pub fn detect_mime(head: &[u8]) -> String {
    let head = &head[..head.len().min(SNIFF_LEN)];

    if let Some(kind) = infer::get(head) {
        return kind.mime_type().to_string();
    }

    if looks_like_text(head) {
        TEXT_PLAIN.to_string()
    } else {
        OCTET_STREAM.to_string()
    }
}

fn looks_like_text(head: &[u8]) -> bool {
    if head.is_empty() {
        return true;
    }
    let text = match std::str::from_utf8(head) {
        Ok(text) => text,
        // The sniff window may cut a multi-byte sequence in half.
        Err(e) if e.error_len().is_none() => {
            // Safe: valid_up_to marks a char boundary.
            std::str::from_utf8(&head[..e.valid_up_to()]).unwrap_or_default()
        }
        Err(_) => return false,
    };
    !text
        .chars()
        .any(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t' | '\u{c}' | '\u{1b}'))
}
