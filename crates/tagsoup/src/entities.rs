//! Character reference decoding for text runs and attribute values.
//!
//! Contract:
//! - Named references decode only when semicolon-terminated and present in
//!   [`NAMED_ENTITIES`].
//! - Numeric references (`&#123;`, `&#x1F4A9;`) decode when well-formed and
//!   semicolon-terminated. Code points 0x80..=0x9F map through the
//!   Windows-1252 table the way browsers do; surrogates and values above
//!   U+10FFFF stay literal.
//! - Anything else (unknown names, missing semicolons, overlong digit runs)
//!   is copied through unchanged.

use std::borrow::Cow;

use memchr::memchr;

/// Named references, sorted by name for binary search.
const NAMED_ENTITIES: &[(&str, char)] = &[
    ("AElig", 'Æ'),
    ("Aacute", 'Á'),
    ("Agrave", 'À'),
    ("Alpha", 'Α'),
    ("Aring", 'Å'),
    ("Auml", 'Ä'),
    ("Beta", 'Β'),
    ("Ccedil", 'Ç'),
    ("Delta", 'Δ'),
    ("Eacute", 'É'),
    ("Gamma", 'Γ'),
    ("Iacute", 'Í'),
    ("Lambda", 'Λ'),
    ("Ntilde", 'Ñ'),
    ("Oacute", 'Ó'),
    ("Omega", 'Ω'),
    ("Ouml", 'Ö'),
    ("Pi", 'Π'),
    ("Sigma", 'Σ'),
    ("Uacute", 'Ú'),
    ("Uuml", 'Ü'),
    ("aacute", 'á'),
    ("acute", '´'),
    ("aelig", 'æ'),
    ("agrave", 'à'),
    ("alpha", 'α'),
    ("amp", '&'),
    ("apos", '\''),
    ("aring", 'å'),
    ("auml", 'ä'),
    ("beta", 'β'),
    ("brvbar", '¦'),
    ("bull", '•'),
    ("ccedil", 'ç'),
    ("cedil", '¸'),
    ("cent", '¢'),
    ("copy", '©'),
    ("curren", '¤'),
    ("dagger", '†'),
    ("darr", '↓'),
    ("deg", '°'),
    ("delta", 'δ'),
    ("divide", '÷'),
    ("eacute", 'é'),
    ("ecirc", 'ê'),
    ("egrave", 'è'),
    ("euml", 'ë'),
    ("euro", '€'),
    ("frac12", '½'),
    ("frac14", '¼'),
    ("frac34", '¾'),
    ("gamma", 'γ'),
    ("ge", '≥'),
    ("gt", '>'),
    ("hellip", '…'),
    ("iacute", 'í'),
    ("icirc", 'î'),
    ("iexcl", '¡'),
    ("infin", '∞'),
    ("iquest", '¿'),
    ("iuml", 'ï'),
    ("lambda", 'λ'),
    ("laquo", '«'),
    ("larr", '←'),
    ("ldquo", '“'),
    ("le", '≤'),
    ("lsaquo", '‹'),
    ("lsquo", '‘'),
    ("lt", '<'),
    ("macr", '¯'),
    ("mdash", '—'),
    ("micro", 'µ'),
    ("middot", '·'),
    ("mu", 'μ'),
    ("nbsp", '\u{00A0}'),
    ("ndash", '–'),
    ("ne", '≠'),
    ("not", '¬'),
    ("ntilde", 'ñ'),
    ("oacute", 'ó'),
    ("ocirc", 'ô'),
    ("omega", 'ω'),
    ("ordf", 'ª'),
    ("ordm", 'º'),
    ("ouml", 'ö'),
    ("para", '¶'),
    ("permil", '‰'),
    ("pi", 'π'),
    ("plusmn", '±'),
    ("pound", '£'),
    ("quot", '"'),
    ("raquo", '»'),
    ("rarr", '→'),
    ("rdquo", '”'),
    ("reg", '®'),
    ("rsaquo", '›'),
    ("rsquo", '’'),
    ("sect", '§'),
    ("shy", '\u{00AD}'),
    ("sigma", 'σ'),
    ("sup1", '¹'),
    ("sup2", '²'),
    ("sup3", '³'),
    ("szlig", 'ß'),
    ("thinsp", '\u{2009}'),
    ("times", '×'),
    ("trade", '™'),
    ("uacute", 'ú'),
    ("uarr", '↑'),
    ("uml", '¨'),
    ("uuml", 'ü'),
    ("yen", '¥'),
    ("yuml", 'ÿ'),
    ("zwj", '\u{200D}'),
    ("zwnj", '\u{200C}'),
];

/// Windows-1252 remapping for numeric references in 0x80..=0x9F.
const WINDOWS_1252: [char; 32] = [
    '€', '\u{81}', '‚', 'ƒ', '„', '…', '†', '‡', 'ˆ', '‰', 'Š', '‹', 'Œ', '\u{8D}', 'Ž',
    '\u{8F}', '\u{90}', '‘', '’', '“', '”', '•', '–', '—', '˜', '™', 'š', '›', 'œ', '\u{9D}',
    'ž', 'Ÿ',
];

const MAX_HEX_DIGITS: usize = 6; // 0x10FFFF
const MAX_DEC_DIGITS: usize = 7; // 1114111
const MAX_NAME_LEN: usize = 8;

pub fn lookup_named(name: &str) -> Option<char> {
    NAMED_ENTITIES
        .binary_search_by(|(candidate, _)| (*candidate).cmp(name))
        .ok()
        .map(|index| NAMED_ENTITIES[index].1)
}

fn numeric_to_char(value: u32) -> Option<char> {
    if (0x80..=0x9F).contains(&value) {
        return Some(WINDOWS_1252[(value - 0x80) as usize]);
    }
    if value == 0 {
        return Some('\u{FFFD}');
    }
    char::from_u32(value)
}

/// Index of the `;` closing a numeric reference whose digits start at `start`.
fn scan_numeric(bytes: &[u8], start: usize, hex: bool) -> Option<usize> {
    let max_digits = if hex { MAX_HEX_DIGITS } else { MAX_DEC_DIGITS };
    let mut j = start;
    while j < bytes.len() {
        let b = bytes[j];
        if b == b';' {
            return (j > start).then_some(j);
        }
        let ok = if hex {
            b.is_ascii_hexdigit()
        } else {
            b.is_ascii_digit()
        };
        if !ok || j - start == max_digits {
            return None;
        }
        j += 1;
    }
    None
}

/// Decodes the reference starting at `bytes[at] == b'&'`.
///
/// Returns the decoded char and the index just past the reference.
fn decode_reference(text: &str, at: usize) -> Option<(char, usize)> {
    let bytes = text.as_bytes();
    match bytes.get(at + 1) {
        Some(b'#') => {
            let hex = matches!(bytes.get(at + 2), Some(b'x' | b'X'));
            let digits = if hex { at + 3 } else { at + 2 };
            let end = scan_numeric(bytes, digits, hex)?;
            let raw = &text[digits..end];
            let value = if hex {
                u32::from_str_radix(raw, 16).ok()?
            } else {
                raw.parse::<u32>().ok()?
            };
            numeric_to_char(value).map(|ch| (ch, end + 1))
        }
        Some(b) if b.is_ascii_alphanumeric() => {
            let name_start = at + 1;
            let mut j = name_start;
            while j < bytes.len() && bytes[j].is_ascii_alphanumeric() && j - name_start < MAX_NAME_LEN
            {
                j += 1;
            }
            if bytes.get(j) != Some(&b';') {
                return None;
            }
            lookup_named(&text[name_start..j]).map(|ch| (ch, j + 1))
        }
        _ => None,
    }
}

/// Decodes character references in `text`, borrowing when nothing changes.
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    let bytes = text.as_bytes();
    let Some(first) = memchr(b'&', bytes) else {
        return Cow::Borrowed(text);
    };

    let mut out = String::with_capacity(text.len());
    let mut copy_start = 0;
    let mut i = first;
    while i < bytes.len() {
        if bytes[i] != b'&' {
            i += 1;
            continue;
        }
        match decode_reference(text, i) {
            Some((ch, next)) => {
                out.push_str(&text[copy_start..i]);
                out.push(ch);
                i = next;
                copy_start = next;
            }
            None => i += 1,
        }
    }
    if copy_start == 0 {
        return Cow::Borrowed(text);
    }
    out.push_str(&text[copy_start..]);
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_table_is_sorted() {
        assert!(
            NAMED_ENTITIES.windows(2).all(|w| w[0].0 < w[1].0),
            "NAMED_ENTITIES must stay sorted for binary search"
        );
    }

    #[test]
    fn borrows_when_nothing_to_decode() {
        assert!(matches!(decode_entities("plain text"), Cow::Borrowed(_)));
        assert!(matches!(decode_entities("a & b"), Cow::Borrowed(_)));
    }

    #[test]
    fn decodes_common_named_references() {
        assert_eq!(decode_entities("a &amp; b"), "a & b");
        assert_eq!(decode_entities("&lt;tag&gt;"), "<tag>");
        assert_eq!(decode_entities("&copy; 2024&nbsp;x"), "© 2024\u{00A0}x");
        assert_eq!(decode_entities("&Eacute;t&eacute;"), "Été");
    }

    #[test]
    fn decodes_numeric_references() {
        assert_eq!(decode_entities("&#215;"), "×");
        assert_eq!(decode_entities("&#xD7;&#XD7;"), "××");
        assert_eq!(decode_entities("&#x1F600;"), "😀");
        assert_eq!(decode_entities("&#150;"), "–");
        assert_eq!(decode_entities("&#0;"), "\u{FFFD}");
    }

    #[test]
    fn leaves_unknown_and_malformed_references_literal() {
        assert_eq!(decode_entities("&notanentity; x"), "&notanentity; x");
        assert_eq!(decode_entities("&amp"), "&amp");
        assert_eq!(decode_entities("&#xD800;"), "&#xD800;");
        assert_eq!(decode_entities("&#x110000;"), "&#x110000;");
        assert_eq!(decode_entities("&#12345678;"), "&#12345678;");
        assert_eq!(decode_entities("&#;&#x;"), "&#;&#x;");
    }

    #[test]
    fn malformed_reference_does_not_swallow_the_next_one() {
        assert_eq!(decode_entities("&#xZZ;&amp;"), "&#xZZ;&");
        assert_eq!(decode_entities("&&lt;"), "&<");
    }

    #[test]
    fn decoding_is_idempotent_on_already_literal_output() {
        for sample in ["&", "&&", "&;", "&unknown;", "&#9999999;", "πσ"] {
            let once = decode_entities(sample).into_owned();
            assert_eq!(decode_entities(&once), once);
        }
    }
}
