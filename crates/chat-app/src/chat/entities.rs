use std::borrow::Cow;

/// Longest entity body (between `&` and `;`) worth inspecting.
const MAX_ENTITY_LEN: usize = 32;

const NAMED_ENTITIES: &[(&str, char)] = &[
    ("amp", '&'),
    ("quot", '"'),
    ("lt", '<'),
    ("gt", '>'),
    ("nbsp", '\u{00A0}'),
    ("mdash", '\u{2014}'),
    ("ndash", '\u{2013}'),
    ("hellip", '\u{2026}'),
    ("copy", '\u{00A9}'),
];

/// Decodes the HTML entities the server may leave in author names and
/// message text. Unknown or malformed entities are kept as written.
pub fn decode_html_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    let mut decoded = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        decoded.push_str(&rest[..start]);
        let candidate = &rest[start + 1..];
        let replacement = candidate
            .find(';')
            .filter(|end| *end > 0 && *end <= MAX_ENTITY_LEN)
            .and_then(|end| decode_entity(&candidate[..end]).map(|ch| (ch, end)));

        match replacement {
            Some((ch, end)) => {
                decoded.push(ch);
                rest = &candidate[end + 1..];
            }
            None => {
                decoded.push('&');
                rest = candidate;
            }
        }
    }
    decoded.push_str(rest);

    Cow::Owned(decoded)
}

fn decode_entity(body: &str) -> Option<char> {
    if let Some(numeric) = body.strip_prefix('#') {
        let code = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) if !hex.is_empty() && hex.chars().all(|ch| ch.is_ascii_hexdigit()) => {
                u32::from_str_radix(hex, 16).ok()?
            }
            Some(_) => return None,
            None if !numeric.is_empty() && numeric.chars().all(|ch| ch.is_ascii_digit()) => {
                numeric.parse().ok()?
            }
            None => return None,
        };
        return char::from_u32(code);
    }

    NAMED_ENTITIES
        .iter()
        .find(|(name, _)| *name == body)
        .map(|(_, ch)| *ch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_borrowed() {
        assert!(matches!(decode_html_entities("hello"), Cow::Borrowed("hello")));
    }

    #[test]
    fn named_entities_decode() {
        assert_eq!(
            decode_html_entities("Tom &amp; Jerry &quot;hi&quot; &lt;3 &gt; &copy;"),
            "Tom & Jerry \"hi\" <3 > \u{00A9}"
        );
        assert_eq!(
            decode_html_entities("a&nbsp;b &mdash; c &ndash; d&hellip;"),
            "a\u{00A0}b \u{2014} c \u{2013} d\u{2026}"
        );
    }

    #[test]
    fn numeric_entities_decode() {
        assert_eq!(decode_html_entities("it&#39;s"), "it's");
        assert_eq!(decode_html_entities("&#x1F600; &#X41;"), "\u{1F600} A");
    }

    #[test]
    fn unknown_and_malformed_entities_are_kept() {
        assert_eq!(decode_html_entities("&bogus; & &; &#xZZ;"), "&bogus; & &; &#xZZ;");
        assert_eq!(decode_html_entities("fish & chips"), "fish & chips");
        assert_eq!(decode_html_entities("&#1114112;"), "&#1114112;");
    }

    #[test]
    fn decoding_is_single_pass() {
        assert_eq!(decode_html_entities("&amp;lt;"), "&lt;");
    }
}
