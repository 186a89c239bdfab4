#[cfg(test)]
mod property_tests {
    use proptest::prelude::*;

    use crate::typedstream::{
        coder::Coder,
        models::Value,
        tests::{archive, fixture},
        types::parse_type_encoding,
        unarchiver::{unarchive_root_object, Backend, UnarchiverOptions},
    };

    fn options(backend: Backend) -> UnarchiverOptions {
        let mut options = UnarchiverOptions::default().backend(backend).max_depth(64);
        for name in ["NSString", "NSObject", "Node", "Leaf"] {
            options = options.register(name, |coder: &mut dyn Coder| {
                let mut values = vec![];
                while !coder.is_at_end() {
                    match coder.decode_object() {
                        Ok(value) => values.push(value),
                        Err(_) => break,
                    }
                }
                Ok(Value::Array(values))
            });
        }
        options
    }

    proptest! {
        #[test]
        fn prop_arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
            for backend in [Backend::Streaming, Backend::Buffered] {
                let _ = unarchive_root_object(&bytes, options(backend));
            }
        }

        #[test]
        fn prop_arbitrary_body_never_panics(body in prop::collection::vec(any::<u8>(), 0..256)) {
            let bytes = archive(&body);
            for backend in [Backend::Streaming, Backend::Buffered] {
                let _ = unarchive_root_object(&bytes, options(backend));
            }
        }

        #[test]
        fn prop_corrupted_fixture_never_panics(index in 0usize..55, byte in any::<u8>()) {
            let mut bytes = fixture("StringHello");
            let index = index % bytes.len();
            bytes[index] = byte;
            for backend in [Backend::Streaming, Backend::Buffered] {
                let _ = unarchive_root_object(&bytes, options(backend));
            }
        }

        #[test]
        fn prop_arbitrary_encodings_never_panic(encoding in "[BcCsSiIlLqQfd*%:+#@^\\[\\]{}=?\"0-9a-z]{0,32}") {
            let _ = parse_type_encoding(&encoding, 16);
        }

        #[test]
        fn prop_integers_round_trip_through_the_stream(value in any::<i32>()) {
            let mut body = vec![0x84, 0x01, b'i', 0x82];
            body.extend_from_slice(&value.to_le_bytes());
            let bytes = archive(&body);
            let mut unarchiver = crate::typedstream::unarchiver::Unarchiver::new(
                &bytes,
                UnarchiverOptions::default(),
            ).unwrap();
            prop_assert_eq!(
                unarchiver.decode_encoding("i").unwrap(),
                vec![Value::SignedInteger(value as i64)]
            );
        }
    }
}
