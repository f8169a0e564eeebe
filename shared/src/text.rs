/// A run of comment text, either plain or a bare URL to render as a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextSegment<'a> {
    Text(&'a str),
    Link(&'a str),
}

/// Split text into plain runs and `http(s)://` URLs. A URL runs until the
/// next whitespace character.
pub fn linkify(text: &str) -> Vec<TextSegment<'_>> {
    let mut segments = Vec::new();
    let mut rest = text;

    while let Some(start) = find_url_start(rest) {
        if start > 0 {
            segments.push(TextSegment::Text(&rest[..start]));
        }
        let url_len = rest[start..]
            .find(char::is_whitespace)
            .unwrap_or(rest.len() - start);
        segments.push(TextSegment::Link(&rest[start..start + url_len]));
        rest = &rest[start + url_len..];
    }
    if !rest.is_empty() {
        segments.push(TextSegment::Text(rest));
    }

    segments
}

fn find_url_start(text: &str) -> Option<usize> {
    let mut offset = 0;
    while let Some(pos) = text[offset..].find("http") {
        let candidate = &text[offset + pos..];
        let scheme_len = if candidate.starts_with("https://") {
            8
        } else if candidate.starts_with("http://") {
            7
        } else {
            0
        };
        if scheme_len > 0
            && candidate[scheme_len..]
                .chars()
                .next()
                .is_some_and(|c| !c.is_whitespace())
        {
            return Some(offset + pos);
        }
        offset += pos + 4;
    }
    None
}

/// Human label for a gauge unit code.
pub fn display_unit(unit_code: Option<&str>, short: bool) -> String {
    match unit_code {
        Some("ft3/s") if short => "CFS".to_string(),
        Some("ft3/s") => "Cubic Feet Per Second (CFS)".to_string(),
        Some(other) if !other.is_empty() => other.to_string(),
        _ => "N/A".to_string(),
    }
}
