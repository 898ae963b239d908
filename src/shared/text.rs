use encoding_rs::WINDOWS_1252;

/// Lowercases and strips Spanish diacritics and separators, so that
/// `"Alta Rotación"`, `"ALTA_ROTACION"` and `"altarotacion"` compare equal.
pub fn normalize(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

/// Decodes bytes as UTF-8, falling back to Windows-1252 (the superset of Latin-1
/// that Spanish municipal exports are written in).
pub fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => WINDOWS_1252
            .decode_without_bom_handling(err.as_bytes())
            .0
            .into_owned(),
    }
}

pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[test]
fn normalize_strips_accents_and_spaces() {
    assert_eq!(normalize("Alta Rotación"), "altarotacion");
    assert_eq!(normalize("ALTA_ROTACION"), "altarotacion");
    assert_eq!(normalize(" Azul "), "azul");
}

#[test]
fn decode_latin1_fallback() {
    // "Rotación" in ISO-8859-1
    let bytes = vec![b'R', b'o', b't', b'a', b'c', b'i', 0xF3, b'n'];
    assert_eq!(decode_text(bytes), "Rotación");
}

#[test]
fn decode_windows_1252_punctuation() {
    // "O’Donnell – 5€" with the Windows-1252 quote, dash and euro sign
    let bytes = b"O\x92Donnell \x96 5\x80".to_vec();
    assert_eq!(decode_text(bytes), "O\u{2019}Donnell \u{2013} 5\u{20ac}");
}

#[test]
fn decode_utf8_untouched() {
    assert_eq!(decode_text("Peñalver".as_bytes().to_vec()), "Peñalver");
}

#[test]
fn escape_html_entities() {
    assert_eq!(escape_html("<b>\"A&B\"</b>"), "&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt;");
}
