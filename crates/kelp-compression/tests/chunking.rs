//! Chunk-boundary independence of the zstd decoder

use kelp_compression::{ContentDecoder, DecoderRegistry, ZstdDecoder};
use kelp_core::DecodingError;
use proptest::prelude::*;

fn compress_frames(payloads: &[Vec<u8>]) -> Vec<u8> {
    payloads
        .iter()
        .flat_map(|p| zstd::encode_all(p.as_slice(), 1).unwrap())
        .collect()
}

/// Split `stream` at the given (unsorted, possibly duplicated) offsets
fn split_at_offsets<'a>(stream: &'a [u8], offsets: &[usize]) -> Vec<&'a [u8]> {
    let mut cuts: Vec<usize> = offsets.iter().map(|o| o % (stream.len() + 1)).collect();
    cuts.push(0);
    cuts.push(stream.len());
    cuts.sort_unstable();
    cuts.windows(2).map(|w| &stream[w[0]..w[1]]).collect()
}

fn decode_all(chunks: &[&[u8]]) -> Result<Vec<u8>, DecodingError> {
    let mut decoder = ZstdDecoder::new().unwrap();
    let mut out = Vec::new();
    for chunk in chunks {
        out.extend_from_slice(&decoder.decode(chunk));
    }
    out.extend_from_slice(&decoder.flush()?);
    Ok(out)
}

proptest! {
    #[test]
    fn any_partition_yields_the_payload(
        payloads in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..512), 1..5),
        offsets in prop::collection::vec(any::<usize>(), 0..16),
    ) {
        let stream = compress_frames(&payloads);
        let expected: Vec<u8> = payloads.concat();

        let chunks = split_at_offsets(&stream, &offsets);
        prop_assert_eq!(decode_all(&chunks).unwrap(), expected.clone());
        prop_assert_eq!(decode_all(&[stream.as_slice()]).unwrap(), expected);
    }

    #[test]
    fn empty_chunks_change_nothing(
        payload in prop::collection::vec(any::<u8>(), 1..256),
        split in any::<usize>(),
    ) {
        let stream = compress_frames(&[payload.clone()]);
        let split = split % stream.len();

        let empty: &[u8] = &[];
        let with_empty =
            decode_all(&[empty, &stream[..split], empty, &stream[split..], empty]).unwrap();
        let without = decode_all(&[&stream[..split], &stream[split..]]).unwrap();
        prop_assert_eq!(&with_empty, &without);
        prop_assert_eq!(with_empty, payload);
    }

    #[test]
    fn strict_prefix_is_incomplete(
        payloads in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..256), 1..4),
        cut in any::<usize>(),
    ) {
        let frames: Vec<Vec<u8>> = payloads
            .iter()
            .map(|p| zstd::encode_all(p.as_slice(), 1).unwrap())
            .collect();
        let ends: Vec<usize> = frames
            .iter()
            .scan(0, |end, frame| {
                *end += frame.len();
                Some(*end)
            })
            .collect();
        let stream = frames.concat();

        // Cutting right after a frame leaves a complete, shorter body
        let cut = cut % stream.len();
        prop_assume!(!ends.contains(&cut));

        prop_assert!(matches!(
            decode_all(&[&stream[..cut]]),
            Err(DecodingError::IncompleteFrame { encoding: "zstd" })
        ), "expected IncompleteFrame for zstd when cut at {}", cut);
    }
}

#[test]
fn registry_decoder_matches_direct_decoder() {
    let stream = compress_frames(&[b"alpha".to_vec(), b"beta".to_vec(), b"gamma".to_vec()]);
    let registry = DecoderRegistry::default();
    let mut decoder = registry.decoder_for("zstd").unwrap().unwrap();

    let mut out = Vec::new();
    for chunk in stream.chunks(7) {
        out.extend_from_slice(&decoder.decode(chunk));
    }
    out.extend_from_slice(&decoder.flush().unwrap());
    assert_eq!(out, b"alphabetagamma");
}
