/// Percent-encode a path for use as a single URL component.
///
/// Keeps the characters `encodeURIComponent` keeps
/// (`A-Z a-z 0-9 - _ . ! ~ * ' ( )`); everything else, `/` included, is
/// encoded as UTF-8 bytes.
pub fn encode_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
