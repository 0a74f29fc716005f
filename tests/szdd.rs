//! Integration tests for SZDD expansion and the compressed-container path.

mod common;

use common::{szdd_compress, NeBuilder};
use exescope::{compress, prelude::*};

/// Encoding a buffer with the reference encoder and decoding it back
/// reproduces the original exactly, for literal-only and run-heavy inputs.
#[test]
fn encoder_round_trip() {
    let long_run = vec![b'x'; 500];
    let mixed: Vec<u8> = b"head"
        .iter()
        .copied()
        .chain(std::iter::repeat(0u8).take(100))
        .chain(b"tail".iter().copied())
        .collect();
    let buffers: [&[u8]; 6] = [
        b"",
        b"short",
        b"    leading and trailing spaces    ",
        &[0x00, 0xFF, 0x20, 0x20, 0x7F, 0x01, 0x02, 0x03, 0x04],
        &long_run,
        &mixed,
    ];

    for original in buffers {
        let compressed = szdd_compress(original);
        assert!(compress::is_szdd(&compressed));
        assert_eq!(compress::decompress(&compressed).unwrap(), original);
    }

    // The run actually went through window references, not literals
    assert!(szdd_compress(&long_run).len() < long_run.len());

    // Something larger than one control group
    let original: Vec<u8> = (0..10_000u32).map(|i| (i * 7) as u8).collect();
    let compressed = szdd_compress(&original);
    assert_eq!(compress::decompress(&compressed).unwrap(), original);
}

/// The decoder never produces more than the declared uncompressed length,
/// even from a corrupt control stream full of maximum-length references.
#[test]
fn output_never_exceeds_declared_length() {
    let mut data = b"SZDD\x88\xF0\x27\x33".to_vec();
    data.push(b'A');
    data.push(b'_');
    data.extend_from_slice(&10u32.to_le_bytes());
    // All-reference control bytes with maximum length nibbles
    for _ in 0..32 {
        data.push(0x00);
        for _ in 0..8 {
            data.push(0x00);
            data.push(0x0F); // position 0, length 18
        }
    }

    let output = compress::decompress(&data).unwrap();
    assert_eq!(output.len(), 10);
    assert!(output.iter().all(|&b| b == 0x20)); // untouched window is spaces

    // Truncating the stream anywhere still caps the output
    let truncated = &data[..20];
    assert!(compress::decompress(truncated).unwrap().len() <= 10);
}

/// A compressed NE executable loads through the front end exactly like the
/// plain one: the expansion is transparent.
#[test]
fn compressed_container_loads_transparently() {
    let plain = NeBuilder::new(0).add(10, 1, b"resource payload").build();

    let compressed = szdd_compress(&plain);
    assert!(WinResources::from_slice(&compressed).is_ok());

    let exe = WinResources::from_mem(compressed).unwrap();
    assert!(exe.is_ne());
    assert_eq!(
        exe.get_resource(&ResourceId::Numeric(10), &ResourceId::Numeric(1))
            .unwrap(),
        b"resource payload"
    );
}

/// Plain containers must not be mistaken for compressed ones.
#[test]
fn plain_container_is_not_szdd() {
    let plain = NeBuilder::new(0).add(10, 1, b"data").build();
    assert!(!compress::is_szdd(&plain));

    let exe = WinResources::from_mem(plain).unwrap();
    assert!(exe.is_ne());
}
