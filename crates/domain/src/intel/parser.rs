/// Parse a plaintext IP-list feed body: one address per line.
///
/// Lines are trimmed; blank lines and lines starting with `#` are
/// skipped. No address validation happens here; lookups are exact
/// string matches, so a garbage line can only ever match itself.
pub fn parse_ip_list(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect()
}
