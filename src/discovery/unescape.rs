//! JS/JSON string-literal unescaping.
//!
//! Target pages routinely inline pre-serialized JSON, so attribute values and
//! URLs arrive with backslash-escaped quotes, escaped forward slashes, and
//! `\uXXXX` code points. Unescaping first lets one set of patterns match both
//! plain markup and serialized fragments.

/// Unescapes backslash sequences commonly found in inline JSON/JS fragments.
///
/// Handles `\"`, `\'`, `\/`, `\\`, and `\uXXXX` (including surrogate pairs).
/// Unrecognized escapes are left untouched.
pub fn unescape_fragments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '\\' || i + 1 >= chars.len() {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        match chars[i + 1] {
            '"' => {
                out.push('"');
                i += 2;
            }
            '\'' => {
                out.push('\'');
                i += 2;
            }
            '/' => {
                out.push('/');
                i += 2;
            }
            '\\' => {
                out.push('\\');
                i += 2;
            }
            'u' => match parse_unicode_escape(&chars, i) {
                Some((c, consumed)) => {
                    out.push(c);
                    i += consumed;
                }
                None => {
                    out.push(chars[i]);
                    i += 1;
                }
            },
            _ => {
                out.push(chars[i]);
                i += 1;
            }
        }
    }
    out
}

/// Parses `\uXXXX` at `start`, pairing surrogates when both halves are
/// present. Returns the decoded char and the number of chars consumed.
fn parse_unicode_escape(chars: &[char], start: usize) -> Option<(char, usize)> {
    let first = hex4(chars, start + 2)?;
    if (0xD800..0xDC00).contains(&first) {
        // High surrogate; require a following \uXXXX low surrogate
        if chars.get(start + 6) == Some(&'\\') && chars.get(start + 7) == Some(&'u') {
            let second = hex4(chars, start + 8)?;
            if (0xDC00..0xE000).contains(&second) {
                let combined = 0x10000 + ((first - 0xD800) << 10) + (second - 0xDC00);
                return char::from_u32(combined).map(|c| (c, 12));
            }
        }
        return None;
    }
    char::from_u32(first).map(|c| (c, 6))
}

fn hex4(chars: &[char], start: usize) -> Option<u32> {
    if start + 4 > chars.len() {
        return None;
    }
    let mut value = 0u32;
    for c in &chars[start..start + 4] {
        value = value * 16 + c.to_digit(16)?;
    }
    Some(value)
}
