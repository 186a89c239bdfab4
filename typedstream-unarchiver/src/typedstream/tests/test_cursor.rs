#[cfg(test)]
mod cursor_tests {
    use crate::{
        error::typedstream::TypedStreamError,
        typedstream::{
            cursor::Cursor,
            models::ByteOrder,
            tests::{archive, archive_big_endian},
        },
    };

    #[test]
    fn test_read_single_byte_integers() {
        let bytes = [0x05, 0x7F, 0xFF, 0xFF, 0x92];
        let mut cursor = Cursor::new(&bytes);

        assert_eq!(cursor.read_variable_int(true).unwrap(), 5);
        assert_eq!(cursor.read_variable_int(true).unwrap(), 127);
        assert_eq!(cursor.read_variable_int(true).unwrap(), -1);
        assert_eq!(cursor.read_variable_int(false).unwrap(), 255);
        assert_eq!(cursor.read_variable_int(true).unwrap(), -110);
        assert!(cursor.is_at_end());
    }

    #[test]
    fn test_read_i16_boundaries() {
        let bytes = [0x81, 0x00, 0x80, 0x81, 0x00, 0x80, 0x81, 0xFF, 0x7F];
        let mut cursor = Cursor::new(&bytes);

        assert_eq!(cursor.read_variable_int(true).unwrap(), i16::MIN as i64);
        assert_eq!(cursor.read_variable_int(false).unwrap(), 0x8000);
        assert_eq!(cursor.read_variable_int(true).unwrap(), i16::MAX as i64);
    }

    #[test]
    fn test_read_i32_boundaries() {
        let bytes = [
            0x82, 0x00, 0x00, 0x00, 0x80, 0x82, 0xFF, 0xFF, 0xFF, 0xFF, 0x82, 0xFF, 0xFF, 0xFF,
            0x7F,
        ];
        let mut cursor = Cursor::new(&bytes);

        assert_eq!(cursor.read_variable_int(true).unwrap(), i32::MIN as i64);
        assert_eq!(cursor.read_variable_int(false).unwrap(), u32::MAX as i64);
        assert_eq!(cursor.read_variable_int(true).unwrap(), i32::MAX as i64);
    }

    #[test]
    fn test_reserved_tags_are_not_integers() {
        for tag in [0x80, 0x83, 0x84, 0x85, 0x86, 0x91] {
            let bytes = [tag];
            let mut cursor = Cursor::new(&bytes);
            assert!(matches!(
                cursor.read_variable_int(true),
                Err(TypedStreamError::UnknownStreamMarker(byte, 0)) if byte == tag
            ));
        }
    }

    #[test]
    fn test_truncated_integer() {
        let bytes = [0x82, 0x01, 0x02];
        let mut cursor = Cursor::new(&bytes);

        assert!(matches!(
            cursor.read_variable_int(true),
            Err(TypedStreamError::UnexpectedEndOfStream(5, 3))
        ));
    }

    #[test]
    fn test_read_raw_past_end_does_not_move() {
        let bytes = [0x01, 0x02];
        let mut cursor = Cursor::new(&bytes);

        assert!(matches!(
            cursor.read_raw(5),
            Err(TypedStreamError::UnexpectedEndOfStream(5, 2))
        ));
        assert_eq!(cursor.position(), 0);
        assert_eq!(cursor.read_raw(2).unwrap(), &[0x01, 0x02]);
        assert!(cursor.is_at_end());
        assert!(matches!(
            cursor.read_byte(),
            Err(TypedStreamError::UnexpectedEndOfStream(3, 2))
        ));
    }

    #[test]
    fn test_read_raw_huge_length() {
        let bytes = [0x01];
        let mut cursor = Cursor::new(&bytes);
        cursor.read_byte().unwrap();

        assert!(matches!(
            cursor.read_raw(usize::MAX),
            Err(TypedStreamError::UnexpectedEndOfStream(_, 1))
        ));
    }

    #[test]
    fn test_negative_length() {
        let bytes = [0xFF];
        let mut cursor = Cursor::new(&bytes);

        assert!(matches!(
            cursor.read_length(),
            Err(TypedStreamError::InvalidLength(-1))
        ));
    }

    #[test]
    fn test_read_string_invalid_utf8() {
        let bytes = [0xC3, 0x28];
        let mut cursor = Cursor::new(&bytes);

        assert!(matches!(
            cursor.read_string(2),
            Err(TypedStreamError::StringParseError(_))
        ));
    }

    #[test]
    fn test_read_floats() {
        let mut bytes = vec![0x83];
        bytes.extend_from_slice(&1.5f32.to_le_bytes());
        bytes.push(0x83);
        bytes.extend_from_slice(&(-2.25f64).to_le_bytes());
        bytes.extend_from_slice(&[0x05, 0x81, 0x00, 0x01]);
        let mut cursor = Cursor::new(&bytes);

        assert_eq!(cursor.read_float().unwrap(), 1.5);
        assert_eq!(cursor.read_double().unwrap(), -2.25);
        assert_eq!(cursor.read_float().unwrap(), 5.0);
        assert_eq!(cursor.read_double().unwrap(), 256.0);
    }

    #[test]
    fn test_parse_header_little_endian() {
        let bytes = archive(&[]);
        let mut cursor = Cursor::new(&bytes);
        let header = cursor.read_header().unwrap();

        assert_eq!(header.streamer_version, 4);
        assert_eq!(header.byte_order, ByteOrder::Little);
        assert_eq!(header.system_version, 1000);
        assert!(cursor.is_at_end());
    }

    #[test]
    fn test_parse_header_big_endian() {
        let mut bytes = archive_big_endian(&[]);
        bytes.extend_from_slice(&[0x81, 0x01, 0x02, 0x83]);
        bytes.extend_from_slice(&0.5f32.to_be_bytes());
        let mut cursor = Cursor::new(&bytes);
        let header = cursor.read_header().unwrap();

        assert_eq!(header.byte_order, ByteOrder::Big);
        assert_eq!(header.system_version, 1000);
        assert_eq!(cursor.byte_order(), ByteOrder::Big);
        assert_eq!(cursor.read_variable_int(true).unwrap(), 0x0102);
        assert_eq!(cursor.read_float().unwrap(), 0.5);
    }

    #[test]
    fn test_parse_header_unexpected_system_version() {
        let mut bytes = vec![0x04, 0x0B];
        bytes.extend_from_slice(b"streamtyped");
        bytes.extend_from_slice(&[0x81, 0xE7, 0x03]);
        let mut cursor = Cursor::new(&bytes);

        assert_eq!(cursor.read_header().unwrap().system_version, 999);
    }

    #[test]
    fn test_parse_header_bad_signature() {
        let mut bytes = vec![0x04, 0x0B];
        bytes.extend_from_slice(b"streamtypes");
        bytes.extend_from_slice(&[0x81, 0xE8, 0x03]);
        let mut cursor = Cursor::new(&bytes);

        assert!(matches!(
            cursor.read_header(),
            Err(TypedStreamError::InvalidHeader)
        ));
    }

    #[test]
    fn test_parse_header_bad_streamer_version() {
        let mut bytes = archive(&[]);
        bytes[0] = 0x03;
        let mut cursor = Cursor::new(&bytes);

        assert!(matches!(
            cursor.read_header(),
            Err(TypedStreamError::InvalidHeader)
        ));
    }

    #[test]
    fn test_parse_header_empty() {
        let mut cursor = Cursor::new(&[]);

        assert!(cursor.is_empty());
        assert!(matches!(
            cursor.read_header(),
            Err(TypedStreamError::UnexpectedEndOfStream(1, 0))
        ));
    }
}
