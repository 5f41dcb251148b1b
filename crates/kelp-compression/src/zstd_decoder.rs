//! Streaming zstd decoder
//!
//! A zstd body may carry several independently terminated frames back to
//! back. The decoder follows them transparently: when a frame ends inside a
//! chunk, the remaining bytes are fed to a freshly reset context.

use crate::decoder::ContentDecoder;
use bytes::{Bytes, BytesMut};
use kelp_core::DecodingError;
use std::fmt;
use std::io;
use tracing::{debug, trace, warn};
use zstd::stream::raw::{Decoder as RawDecoder, Operation};

/// Content-Encoding token handled by [`ZstdDecoder`]
pub const ENCODING: &str = "zstd";

/// Output scratch size, matches `ZSTD_DStreamOutSize`
const OUTPUT_BUFFER_SIZE: usize = 128 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
enum FrameState {
    /// The active frame has not reached its end marker
    InFrame,
    /// The active frame is complete; the next byte starts a new frame
    Complete,
    /// The engine rejected the data
    Failed(String),
}

/// Streaming decoder for `Content-Encoding: zstd` bodies
pub struct ZstdDecoder {
    context: RawDecoder<'static>,
    state: FrameState,
    frames: usize,
    scratch: Box<[u8]>,
}

impl ZstdDecoder {
    /// Create a decoder with a fresh decompression context
    ///
    /// # Errors
    ///
    /// Returns [`DecodingError::Init`] if zstd cannot allocate the context.
    pub fn new() -> Result<Self, DecodingError> {
        let context = RawDecoder::new().map_err(|source| DecodingError::Init {
            encoding: ENCODING,
            source,
        })?;

        Ok(Self {
            context,
            state: FrameState::InFrame,
            frames: 0,
            scratch: vec![0; OUTPUT_BUFFER_SIZE].into_boxed_slice(),
        })
    }

    /// Number of frames that reached their end marker so far
    pub fn completed_frames(&self) -> usize {
        self.frames
    }

    /// Whether the active frame is complete
    pub fn is_frame_complete(&self) -> bool {
        self.state == FrameState::Complete
    }

    fn fail(&mut self, err: io::Error) {
        warn!(error = %err, frames = self.frames, "zstd body is corrupt, discarding remaining input");
        self.state = FrameState::Failed(err.to_string());
    }

    /// Feed `input` through the context, starting a new frame whenever the
    /// previous one ended and bytes remain.
    fn run(&mut self, mut input: &[u8], out: &mut BytesMut) {
        loop {
            if self.state == FrameState::Complete {
                if input.is_empty() {
                    return;
                }
                if let Err(err) = self.context.reinit() {
                    self.fail(err);
                    return;
                }
                self.state = FrameState::InFrame;
                trace!(
                    frames = self.frames,
                    carried = input.len(),
                    "zstd frame ended mid-chunk, starting next frame"
                );
            }

            let status = match self.context.run_on_buffers(input, &mut self.scratch) {
                Ok(status) => status,
                Err(err) => {
                    self.fail(err);
                    return;
                }
            };

            out.extend_from_slice(&self.scratch[..status.bytes_written]);
            input = &input[status.bytes_read..];

            if status.remaining == 0 {
                // End marker reached and all output flushed
                self.frames += 1;
                self.state = FrameState::Complete;
                continue;
            }

            let output_full = status.bytes_written == self.scratch.len();
            if input.is_empty() && !output_full {
                return;
            }

            if status.bytes_read == 0 && status.bytes_written == 0 {
                self.fail(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "decompression made no progress",
                ));
                return;
            }
        }
    }
}

impl ContentDecoder for ZstdDecoder {
    fn decode(&mut self, chunk: &[u8]) -> Bytes {
        if chunk.is_empty() || matches!(self.state, FrameState::Failed(_)) {
            return Bytes::new();
        }

        let mut out = BytesMut::new();
        self.run(chunk, &mut out);
        out.freeze()
    }

    fn flush(&mut self) -> Result<Bytes, DecodingError> {
        match &self.state {
            FrameState::Complete => {
                debug!(frames = self.frames, "zstd body decoded");
                Ok(Bytes::new())
            }
            FrameState::InFrame => Err(DecodingError::IncompleteFrame { encoding: ENCODING }),
            FrameState::Failed(reason) => Err(DecodingError::Corrupt {
                encoding: ENCODING,
                reason: reason.clone(),
            }),
        }
    }
}

impl fmt::Debug for ZstdDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZstdDecoder")
            .field("state", &self.state)
            .field("frames", &self.frames)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(payload: &[u8]) -> Vec<u8> {
        zstd::encode_all(payload, 3).unwrap()
    }

    fn decode_chunked(stream: &[u8], chunk_size: usize) -> Result<Vec<u8>, DecodingError> {
        let mut decoder = ZstdDecoder::new().unwrap();
        let mut out = Vec::new();
        for chunk in stream.chunks(chunk_size) {
            out.extend_from_slice(&decoder.decode(chunk));
        }
        out.extend_from_slice(&decoder.flush()?);
        Ok(out)
    }

    #[test]
    fn test_single_frame_roundtrip() {
        let payload = b"Hello, World! This is a zstd body. ".repeat(50);
        let mut decoder = ZstdDecoder::new().unwrap();
        let mut out = decoder.decode(&frame(&payload)).to_vec();
        out.extend_from_slice(&decoder.flush().unwrap());
        assert_eq!(out, payload);
        assert_eq!(decoder.completed_frames(), 1);
    }

    #[test]
    fn test_empty_chunk_is_noop() {
        let stream = frame(b"payload");
        let mut decoder = ZstdDecoder::new().unwrap();

        assert!(decoder.decode(b"").is_empty());
        let mut out = decoder.decode(&stream[..4]).to_vec();
        assert!(decoder.decode(b"").is_empty());
        out.extend_from_slice(&decoder.decode(&stream[4..]));
        assert!(decoder.decode(b"").is_empty());
        out.extend_from_slice(&decoder.flush().unwrap());

        assert_eq!(out, b"payload");
        assert_eq!(decoder.completed_frames(), 1);
    }

    #[test]
    fn test_empty_chunk_after_complete_frame() {
        let mut decoder = ZstdDecoder::new().unwrap();
        decoder.decode(&frame(b"done"));
        assert!(decoder.is_frame_complete());
        assert!(decoder.decode(b"").is_empty());
        assert!(decoder.is_frame_complete());
        assert!(decoder.flush().is_ok());
    }

    #[test]
    fn test_two_frames_in_one_chunk() {
        let mut stream = frame(b"first frame;");
        stream.extend_from_slice(&frame(b"second frame"));

        let out = decode_chunked(&stream, stream.len()).unwrap();
        assert_eq!(out, b"first frame;second frame");
    }

    #[test]
    fn test_split_exactly_at_frame_boundary() {
        let first = frame(b"left");
        let second = frame(b"right");

        let mut decoder = ZstdDecoder::new().unwrap();
        let mut out = decoder.decode(&first).to_vec();
        assert!(decoder.is_frame_complete());
        out.extend_from_slice(&decoder.decode(&second));
        out.extend_from_slice(&decoder.flush().unwrap());

        assert_eq!(out, b"leftright");
        assert_eq!(decoder.completed_frames(), 2);
    }

    #[test]
    fn test_split_mid_frame() {
        let mut stream = frame(b"one two three");
        let boundary = stream.len();
        stream.extend_from_slice(&frame(b" four five"));

        for split in [1, boundary / 2, boundary - 1, boundary + 1, stream.len() - 1] {
            let mut decoder = ZstdDecoder::new().unwrap();
            let mut out = decoder.decode(&stream[..split]).to_vec();
            out.extend_from_slice(&decoder.decode(&stream[split..]));
            out.extend_from_slice(&decoder.flush().unwrap());
            assert_eq!(out, b"one two three four five", "split at {split}");
        }
    }

    #[test]
    fn test_many_frames_in_one_chunk() {
        let mut stream = Vec::new();
        let mut expected = Vec::new();
        for i in 0..32 {
            let payload = format!("frame-{i};");
            stream.extend_from_slice(&frame(payload.as_bytes()));
            expected.extend_from_slice(payload.as_bytes());
        }

        let mut decoder = ZstdDecoder::new().unwrap();
        let mut out = decoder.decode(&stream).to_vec();
        out.extend_from_slice(&decoder.flush().unwrap());
        assert_eq!(out, expected);
        assert_eq!(decoder.completed_frames(), 32);
    }

    #[test]
    fn test_one_byte_chunks_match_single_chunk() {
        let mut stream = frame(&b"abcdefghij".repeat(20));
        stream.extend_from_slice(&frame(b"tail"));

        let whole = decode_chunked(&stream, stream.len()).unwrap();
        let bytewise = decode_chunked(&stream, 1).unwrap();
        assert_eq!(whole, bytewise);
    }

    #[test]
    fn test_three_frames_seven_byte_chunks() {
        let mut stream = frame(b"alpha");
        stream.extend_from_slice(&frame(b"beta"));
        stream.extend_from_slice(&frame(b"gamma"));

        let out = decode_chunked(&stream, 7).unwrap();
        assert_eq!(out, b"alphabetagamma");
    }

    #[test]
    fn test_output_larger_than_scratch() {
        let payload = vec![b'z'; OUTPUT_BUFFER_SIZE * 3 + 17];
        let stream = frame(&payload);
        // Small input, output needs several drains of the scratch buffer
        assert!(stream.len() < 1024);

        let out = decode_chunked(&stream, stream.len()).unwrap();
        assert_eq!(out.len(), payload.len());
        assert_eq!(out, payload);
    }

    #[test]
    fn test_truncated_frame_fails_on_flush() {
        let stream = frame(&b"truncate me please".repeat(10));
        let mut decoder = ZstdDecoder::new().unwrap();
        decoder.decode(&stream[..stream.len() - 1]);

        let err = decoder.flush().unwrap_err();
        assert!(matches!(err, DecodingError::IncompleteFrame { encoding: "zstd" }));
    }

    #[test]
    fn test_truncated_second_frame_fails_on_flush() {
        let mut stream = frame(b"complete");
        let second = frame(b"incomplete");
        stream.extend_from_slice(&second[..second.len() / 2]);

        let err = decode_chunked(&stream, 5).unwrap_err();
        assert!(matches!(err, DecodingError::IncompleteFrame { .. }));
    }

    #[test]
    fn test_flush_without_data_fails() {
        let mut decoder = ZstdDecoder::new().unwrap();
        assert!(matches!(
            decoder.flush(),
            Err(DecodingError::IncompleteFrame { .. })
        ));
    }

    #[test]
    fn test_empty_frame_is_complete() {
        let empty = frame(b"");
        assert!(!empty.is_empty());

        let mut decoder = ZstdDecoder::new().unwrap();
        assert!(decoder.decode(&empty).is_empty());
        assert!(decoder.flush().unwrap().is_empty());
    }

    #[test]
    fn test_garbage_is_reported_on_flush() {
        let mut decoder = ZstdDecoder::new().unwrap();
        assert!(decoder.decode(b"definitely not zstd").is_empty());
        assert!(decoder.decode(&frame(b"ignored")).is_empty());

        let err = decoder.flush().unwrap_err();
        assert!(matches!(err, DecodingError::Corrupt { encoding: "zstd", .. }));
    }

    #[test]
    fn test_trailing_garbage_after_frame() {
        let mut stream = frame(b"valid");
        stream.extend_from_slice(b"\x00\x01junk");

        let mut decoder = ZstdDecoder::new().unwrap();
        let out = decoder.decode(&stream);
        assert_eq!(out, Bytes::from_static(b"valid"));
        assert!(decoder.flush().is_err());
    }

    #[test]
    fn test_skippable_frame_between_frames() {
        let mut stream = frame(b"before|");
        // Skippable frame: magic 0x184D2A50, 4 byte length, payload
        stream.extend_from_slice(&[0x50, 0x2A, 0x4D, 0x18, 3, 0, 0, 0, 1, 2, 3]);
        stream.extend_from_slice(&frame(b"after"));

        let out = decode_chunked(&stream, 3).unwrap();
        assert_eq!(out, b"before|after");
    }

    #[test]
    fn test_independent_instances() {
        let stream = frame(b"shared input");
        let mut a = ZstdDecoder::new().unwrap();
        let mut b = ZstdDecoder::new().unwrap();

        a.decode(&stream[..3]);
        b.decode(b"garbage");
        a.decode(&stream[3..]);

        assert!(a.flush().is_ok());
        assert!(b.flush().is_err());
    }
}
