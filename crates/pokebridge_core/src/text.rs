//! Western Gen III character encoding.

pub const TERMINATOR: u8 = 0xFF;

fn decode_byte(byte: u8) -> Option<char> {
    let ch = match byte {
        0x00 => ' ',
        0xA1..=0xAA => (b'0' + (byte - 0xA1)) as char,
        0xAB => '!',
        0xAC => '?',
        0xAD => '.',
        0xAE => '-',
        0xB0 => '…',
        0xB1 => '“',
        0xB2 => '”',
        0xB3 => '‘',
        0xB4 => '’',
        0xB5 => '♂',
        0xB6 => '♀',
        0xB8 => ',',
        0xBA => '/',
        0xBB..=0xD4 => (b'A' + (byte - 0xBB)) as char,
        0xD5..=0xEE => (b'a' + (byte - 0xD5)) as char,
        _ => return None,
    };
    Some(ch)
}

fn encode_char(ch: char) -> Option<u8> {
    let byte = match ch {
        ' ' => 0x00,
        '0'..='9' => 0xA1 + (ch as u8 - b'0'),
        '!' => 0xAB,
        '?' => 0xAC,
        '.' => 0xAD,
        '-' => 0xAE,
        '…' => 0xB0,
        '“' => 0xB1,
        '”' => 0xB2,
        '‘' => 0xB3,
        '’' => 0xB4,
        '♂' => 0xB5,
        '♀' => 0xB6,
        ',' => 0xB8,
        '/' => 0xBA,
        'A'..='Z' => 0xBB + (ch as u8 - b'A'),
        'a'..='z' => 0xD5 + (ch as u8 - b'a'),
        _ => return None,
    };
    Some(byte)
}

/// Decode up to the first terminator. Bytes outside the table become `*`.
pub fn decode(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take_while(|&&b| b != TERMINATOR)
        .map(|&b| decode_byte(b).unwrap_or('*'))
        .collect()
}

/// Encode into a fixed-width field padded with terminators. Returns `None`
/// when the text does not fit or uses a character outside the table.
pub fn encode(text: &str, width: usize) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(width);
    for ch in text.chars() {
        out.push(encode_char(ch)?);
    }
    if out.len() > width {
        return None;
    }
    out.resize(width, TERMINATOR);
    Some(out)
}
