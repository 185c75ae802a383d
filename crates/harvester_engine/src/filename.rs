/// Local filename for an href: the last path segment, made filesystem-safe.
///
/// Query and fragment are dropped and a trailing slash is ignored, so
/// `/list/pgsql-hackers/mbox/pgsql-hackers.200101?x=1` names
/// `pgsql-hackers.200101`. An empty or dot-only segment becomes `resource`.
pub fn resource_filename(href: &str) -> String {
    let path = href
        .trim()
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('/');
    let base = path.rsplit('/').next().unwrap_or_default();
    sanitize(base)
}

fn sanitize(input: &str) -> String {
    let mut cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    if cleaned.chars().all(|c| c == '.') {
        cleaned = "resource".to_string();
    }
    if is_reserved_windows_name(&cleaned) {
        cleaned.push('_');
    }
    cleaned
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}
