/// Map a UTF-16 code-unit offset (what text widgets report for selections) to a byte index.
///
/// Offsets past the end clamp to `s.len()`; an offset inside a surrogate pair
/// snaps back to the start of that character.
pub(crate) fn utf16_to_byte_idx(s: &str, pos_utf16: usize) -> usize {
    if pos_utf16 == 0 {
        return 0;
    }
    let mut acc: usize = 0;
    for (i, ch) in s.char_indices() {
        let w = ch.len_utf16();
        if acc + w > pos_utf16 {
            return i;
        }
        acc += w;
        if acc == pos_utf16 {
            return i + ch.len_utf8();
        }
    }
    s.len()
}

pub(crate) fn utf16_len(s: &str) -> usize {
    s.encode_utf16().count()
}

pub(crate) fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}
