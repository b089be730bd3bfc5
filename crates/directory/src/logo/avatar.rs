/// Up to two uppercase initials, one per space-separated word.
pub fn initials(name: &str) -> String {
    name.split(' ')
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect()
}

/// Palette slot for a name.
///
/// Reproduces the 31-multiplier string hash the site has always used so
/// existing avatars keep their colors: the shift wraps at 32 bits while the
/// accumulator does not.
pub fn palette_index(name: &str, palette_len: usize) -> usize {
    if palette_len == 0 {
        return 0;
    }
    let mut hash: i64 = 0;
    for unit in name.encode_utf16() {
        #[allow(clippy::cast_possible_truncation)]
        let shifted = i64::from((hash as i32).wrapping_shl(5));
        hash = i64::from(unit) + shifted - hash;
    }
    (hash.unsigned_abs() % palette_len as u64) as usize
}

/// `data:` URL of a circular initials avatar.
pub fn fallback_avatar(name: &str, palette: &[String]) -> String {
    let color = palette
        .get(palette_index(name, palette.len()))
        .map(String::as_str)
        .unwrap_or("#117b69");
    let svg = format!(
        "<svg width=\"64\" height=\"64\" viewBox=\"0 0 64 64\" xmlns=\"http://www.w3.org/2000/svg\">\
<circle cx=\"32\" cy=\"32\" r=\"32\" fill=\"{color}\"/>\
<text x=\"32\" y=\"40\" text-anchor=\"middle\" fill=\"white\" font-family=\"system-ui, -apple-system, sans-serif\" font-size=\"24\" font-weight=\"600\">{initials}</text></svg>",
        initials = initials(name),
    );
    format!("data:image/svg+xml,{}", encode_uri_component(&svg))
}

fn encode_uri_component(raw: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = String::with_capacity(raw.len() * 2);
    for byte in raw.bytes() {
        let unreserved = byte.is_ascii_alphanumeric()
            || matches!(byte, b'-' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')');
        if unreserved {
            out.push(byte as char);
        } else {
            out.push('%');
            out.push(HEX[(byte >> 4) as usize] as char);
            out.push(HEX[(byte & 0x0f) as usize] as char);
        }
    }
    out
}
