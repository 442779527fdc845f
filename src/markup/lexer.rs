#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Token {
    Text(String),
    Open { name: String, self_closing: bool },
    Close(String),
}

/// Split markup into text runs and tags.
///
/// Rules:
/// - `<name ...>` opens, `</name>` closes, `<name/>` is self-closing. Names are lowercased.
/// - Quoted attribute values may contain `>`.
/// - `<!-- ... -->`, `<!...>` and `<?...>` are dropped.
/// - A `<` that does not start a complete tag is literal text.
pub(crate) fn tokenize(input: &str) -> Vec<Token> {
    let bytes = input.as_bytes();
    let mut out: Vec<Token> = Vec::new();
    let mut text = String::new();
    let mut i = 0;

    while i < bytes.len() {
        // Copy everything up to the next `<`.
        let Some(rel) = input[i..].find('<') else {
            text.push_str(&input[i..]);
            break;
        };
        let lt = i + rel;
        text.push_str(&input[i..lt]);

        match scan_markup(input, lt) {
            Some((tok, next)) => {
                if !text.is_empty() {
                    out.push(Token::Text(std::mem::take(&mut text)));
                }
                if let Some(tok) = tok {
                    out.push(tok);
                }
                i = next;
            }
            None => {
                text.push('<');
                i = lt + 1;
            }
        }
    }

    if !text.is_empty() {
        out.push(Token::Text(text));
    }
    out
}

/// Try to read one tag-like construct at `lt`. `Some((None, _))` means "consumed, nothing to emit".
fn scan_markup(input: &str, lt: usize) -> Option<(Option<Token>, usize)> {
    let rest = &input[lt..];
    let bytes = rest.as_bytes();

    if rest.starts_with("<!--") {
        // An unterminated comment swallows the remainder.
        let end = rest[4..].find("-->").map(|k| lt + 4 + k + 3).unwrap_or(input.len());
        return Some((None, end));
    }

    match bytes.get(1) {
        Some(b'!') | Some(b'?') => {
            let gt = rest.find('>')?;
            Some((None, lt + gt + 1))
        }
        Some(b'/') => {
            let name_len = tag_name_len(&rest[2..]);
            if name_len == 0 {
                return None;
            }
            let name = rest[2..2 + name_len].to_ascii_lowercase();
            let gt = rest[2 + name_len..].find('>')?;
            Some((Some(Token::Close(name)), lt + 2 + name_len + gt + 1))
        }
        Some(_) => {
            let name_len = tag_name_len(&rest[1..]);
            if name_len == 0 {
                return None;
            }
            let name = rest[1..1 + name_len].to_ascii_lowercase();
            let attrs_start = 1 + name_len;
            let gt = find_tag_end(&rest[attrs_start..])?;
            let inner = rest[attrs_start..attrs_start + gt].trim_end();
            let self_closing = inner.ends_with('/');
            Some((
                Some(Token::Open { name, self_closing }),
                lt + attrs_start + gt + 1,
            ))
        }
        None => None,
    }
}

fn tag_name_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    if !bytes.first().is_some_and(|b| b.is_ascii_alphabetic()) {
        return 0;
    }
    bytes
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric() || **b == b'-' || **b == b':')
        .count()
}

/// Offset of the `>` ending a start tag, skipping quoted attribute values.
fn find_tag_end(s: &str) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (k, b) in s.bytes().enumerate() {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'>' => return Some(k),
            None if b == b'<' => return None,
            None => {}
        }
    }
    None
}

/// Decode the handful of character references that show up in edited content.
///
/// Unknown or malformed references are kept verbatim.
pub(crate) fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    while i < s.len() {
        let Some(rel) = s[i..].find('&') else {
            out.push_str(&s[i..]);
            break;
        };
        let amp = i + rel;
        out.push_str(&s[i..amp]);

        let decoded = s[amp + 1..]
            .find(';')
            .filter(|semi| *semi > 0 && *semi <= 10)
            .and_then(|semi| {
                let name = &s[amp + 1..amp + 1 + semi];
                lookup_entity(name).map(|ch| (ch, amp + 1 + semi + 1))
            });

        match decoded {
            Some((ch, next)) => {
                out.push(ch);
                i = next;
            }
            None => {
                out.push('&');
                i = amp + 1;
            }
        }
    }
    out
}

fn lookup_entity(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }

    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => None,
    }
}
