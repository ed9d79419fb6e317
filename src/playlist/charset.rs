//! Byte-order-mark sniffing and the two single-purpose codecs we need.

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Charset {
    Utf8,
    Utf16Le,
    Utf16Be,
    Latin1,
}

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Pick a charset from the leading signature. Anything unmarked is Latin-1.
pub fn detect(bytes: &[u8]) -> Charset {
    if bytes.starts_with(UTF8_BOM) {
        Charset::Utf8
    } else if bytes.starts_with(UTF16LE_BOM) {
        Charset::Utf16Le
    } else if bytes.starts_with(UTF16BE_BOM) {
        Charset::Utf16Be
    } else {
        Charset::Latin1
    }
}

/// Decode `bytes` as `charset`. The BOM, if any, survives as U+FEFF.
pub fn decode(bytes: &[u8], charset: Charset) -> String {
    match charset {
        Charset::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
        Charset::Utf16Le => decode_utf16(bytes, u16::from_le_bytes),
        Charset::Utf16Be => decode_utf16(bytes, u16::from_be_bytes),
        Charset::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> String {
    let units = bytes.chunks_exact(2).map(|pair| unit([pair[0], pair[1]]));
    char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Encode as UTF-8 with a leading BOM.
pub fn encode_utf8_bom(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(UTF8_BOM.len() + text.len());
    out.extend_from_slice(UTF8_BOM);
    out.extend_from_slice(text.as_bytes());
    out
}

/// Encode as ISO-8859-1. Characters outside the range become `?`.
pub fn encode_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_reads_signatures() {
        assert_eq!(detect(b"\xEF\xBB\xBF#EXTM3U"), Charset::Utf8);
        assert_eq!(detect(b"\xFF\xFE#\x00"), Charset::Utf16Le);
        assert_eq!(detect(b"\xFE\xFF\x00#"), Charset::Utf16Be);
        assert_eq!(detect(b"#EXTM3U"), Charset::Latin1);
        assert_eq!(detect(b""), Charset::Latin1);
    }

    #[test]
    fn utf16_both_byte_orders_decode() {
        let le: Vec<u8> = "\u{FEFF}é".encode_utf16().flat_map(u16::to_le_bytes).collect();
        let be: Vec<u8> = "\u{FEFF}é".encode_utf16().flat_map(u16::to_be_bytes).collect();
        assert_eq!(decode(&le, detect(&le)), "\u{FEFF}é");
        assert_eq!(decode(&be, detect(&be)), "\u{FEFF}é");
    }

    #[test]
    fn latin1_maps_high_bytes_and_replaces_unmappable_on_encode() {
        assert_eq!(decode(b"caf\xE9", Charset::Latin1), "café");
        assert_eq!(encode_latin1("café"), b"caf\xE9".to_vec());
        assert_eq!(encode_latin1("a\u{263A}b"), b"a?b".to_vec());
    }
}
