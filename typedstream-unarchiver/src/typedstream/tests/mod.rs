mod test_cursor;
mod test_properties;

#[cfg(test)]
use std::{env::current_dir, fs::File, io::Read};

/// Length of the header written by [`archive`]
#[cfg(test)]
const HEADER_LEN: usize = 16;

/// Prefix `body` with a little endian header
#[cfg(test)]
fn archive(body: &[u8]) -> Vec<u8> {
    let mut bytes = vec![0x04, 0x0B];
    bytes.extend_from_slice(b"streamtyped");
    bytes.extend_from_slice(&[0x81, 0xE8, 0x03]);
    bytes.extend_from_slice(body);
    bytes
}

/// Prefix `body` with a big endian header
#[cfg(test)]
fn archive_big_endian(body: &[u8]) -> Vec<u8> {
    let mut bytes = vec![0x04, 0x0B];
    bytes.extend_from_slice(b"typedstream");
    bytes.extend_from_slice(&[0x81, 0x03, 0xE8]);
    bytes.extend_from_slice(body);
    bytes
}

/// A newly defined shared string
#[cfg(test)]
fn shared(string: &str) -> Vec<u8> {
    let mut bytes = vec![0x84, string.len() as u8];
    bytes.extend_from_slice(string.as_bytes());
    bytes
}

#[cfg(test)]
fn fixture(name: &str) -> Vec<u8> {
    let path = current_dir()
        .unwrap()
        .as_path()
        .join("test_data/typedstream")
        .join(name);
    let mut file = File::open(path).unwrap();
    let mut bytes = vec![];
    file.read_to_end(&mut bytes).unwrap();
    bytes
}

/// Object `A` of class `Node` refers to object `B`, which refers back to `A`
#[cfg(test)]
fn cycle_body() -> Vec<u8> {
    let mut body = shared("@");
    // Object A, class Node defined inline
    body.extend_from_slice(&[0x84, 0x84]);
    body.extend(shared("Node"));
    body.extend_from_slice(&[0x00, 0x85]);
    // A's payload: object B, class Node by reference
    body.extend_from_slice(&[0x92, 0x84, 0x93]);
    // B's payload: a reference back to A
    body.extend_from_slice(&[0x92, 0x92, 0x86]);
    body.push(0x86);
    body
}

/// Two values in one group that are the same `Leaf` object
#[cfg(test)]
fn shared_leaf_body() -> Vec<u8> {
    let mut body = shared("@@");
    body.extend_from_slice(&[0x84, 0x84]);
    body.extend(shared("Leaf"));
    body.extend_from_slice(&[0x00, 0x85]);
    body.extend(shared("i"));
    body.extend_from_slice(&[0x2A, 0x86, 0x92]);
    body
}
