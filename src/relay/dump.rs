/// Hex dump with eight bytes per line followed by their printable ASCII.
pub fn hex_dump(data: &[u8]) -> String {
    data.chunks(8)
        .map(|chunk| {
            let octets = chunk
                .iter()
                .map(|byte| hex::encode_upper([*byte]))
                .collect::<Vec<_>>()
                .join(" ");
            let ascii: String = chunk
                .iter()
                .map(|&byte| {
                    if byte.is_ascii_graphic() || byte == b' ' {
                        byte as char
                    } else {
                        '.'
                    }
                })
                .collect();
            format!("{octets:<23}\t{ascii}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eight_bytes_per_line() {
        let data = [
            0x12, 0x34, 0x56, 0x78, 0x90, 0xAB, 0xCD, 0xEF, b'H', b'i', b'!', 0x00,
        ];
        let dump = hex_dump(&data);
        let lines: Vec<_> = dump.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "12 34 56 78 90 AB CD EF\t.4Vx....");
        assert_eq!(lines[1], "48 69 21 00            \tHi!.");
    }

    #[test]
    fn empty_input_is_empty() {
        assert_eq!(hex_dump(&[]), "");
    }
}
