/// Extract the value of cookie `name` from a raw `Cookie` request header.
///
/// Pairs are `;`-separated, whitespace around keys and values is ignored and
/// a single pair of surrounding double quotes is stripped. Empty values count
/// as absent, so the first non-empty matching pair wins.
pub fn extract_cookie<'a>(raw_header: &'a str, name: &str) -> Option<&'a str> {
    raw_header
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .filter(|(key, _)| key.trim() == name)
        .filter_map(|(_, value)| {
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            (!value.is_empty()).then_some(value)
        })
        .next()
}
