/// Number of leading bytes inspected for a signature
pub const SNIFF_LEN: usize = 3072;

pub const TEXT_PLAIN: &str = "text/plain";
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Content type of `head` decided by magic numbers alone; the file name plays no part.
pub fn detect(head: &[u8]) -> &'static str {
    let head = &head[..head.len().min(SNIFF_LEN)];

    if let Some(kind) = infer::get(head) {
        return kind.mime_type();
    }

    if looks_like_text(head) {
        TEXT_PLAIN
    } else {
        OCTET_STREAM
    }
}

/// Valid UTF-8 without control bytes. A multibyte sequence cut off by the sniff window still counts.
fn looks_like_text(head: &[u8]) -> bool {
    if head.is_empty() {
        return false;
    }

    let valid = match std::str::from_utf8(head) {
        Ok(text) => text,
        Err(e) if e.error_len().is_none() => {
            // Truncated tail; the prefix is valid by construction
            match std::str::from_utf8(&head[..e.valid_up_to()]) {
                Ok(text) => text,
                Err(_) => return false,
            }
        }
        Err(_) => return false,
    };

    !valid
        .chars()
        .any(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t' | '\x0c'))
}
