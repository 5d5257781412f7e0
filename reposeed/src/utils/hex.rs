pub const HEX_BYTES_LOWER: &[u8; 16] = &[
    b'0', b'1', b'2', b'3', b'4', b'5', b'6', b'7', b'8', b'9', b'a', b'b', b'c', b'd', b'e', b'f',
];

pub fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut into = String::with_capacity(bytes.len() * 2);

    for b in bytes {
        let high = (b & 0xF0) >> 4;
        let low = b & 0xF;
        into.push(HEX_BYTES_LOWER[high as usize] as char);
        into.push(HEX_BYTES_LOWER[low as usize] as char);
    }
    into
}

fn decode_nibble(nibble: u8) -> Option<u8> {
    match nibble {
        b'0'..=b'9' => Some(nibble - b'0'),
        b'a'..=b'f' => Some(nibble - b'a' + 10),
        b'A'..=b'F' => Some(nibble - b'A' + 10),
        _ => None,
    }
}

/// Decode a hex string, certificates in repo lists are never `0x` prefixed
pub fn bytes_from_hex(ashex: &str) -> Option<Vec<u8>> {
    let bytes = ashex.as_bytes();
    if bytes.len() % 2 != 0 {
        return None;
    }

    bytes
        .chunks_exact(2)
        .map(|pair| Some((decode_nibble(pair[0])? << 4) | decode_nibble(pair[1])?))
        .collect()
}
