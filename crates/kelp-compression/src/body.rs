//! `http_body::Body` adapter that decodes a content-encoded body

use crate::decoder::ContentDecoder;
use bytes::Bytes;
use http_body::{Body, Frame, SizeHint};
use kelp_core::Error;
use pin_project::pin_project;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

/// Response body passed through an optional [`ContentDecoder`].
///
/// Data frames of the inner body are decoded in order; trailers pass through
/// untouched. When the inner body ends the decoder is flushed, and a
/// decoding failure is yielded as the final item of the body.
#[pin_project]
#[derive(Debug)]
pub struct DecodedBody<B> {
    #[pin]
    inner: B,
    decoder: Option<Box<dyn ContentDecoder>>,
    finished: bool,
}

impl<B> DecodedBody<B> {
    /// Decode `inner` with `decoder`
    pub fn new(inner: B, decoder: Box<dyn ContentDecoder>) -> Self {
        Self {
            inner,
            decoder: Some(decoder),
            finished: false,
        }
    }

    /// Yield `inner` unchanged
    pub fn passthrough(inner: B) -> Self {
        Self {
            inner,
            decoder: None,
            finished: false,
        }
    }

    /// Whether a decoder is attached
    pub fn is_decoding(&self) -> bool {
        self.decoder.is_some()
    }
}

impl<B> Body for DecodedBody<B>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Error>,
{
    type Data = Bytes;
    type Error = Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let mut this = self.project();

        loop {
            if *this.finished {
                return Poll::Ready(None);
            }

            match ready!(this.inner.as_mut().poll_frame(cx)) {
                Some(Ok(frame)) => {
                    let Some(decoder) = this.decoder.as_mut() else {
                        return Poll::Ready(Some(Ok(frame)));
                    };
                    match frame.into_data() {
                        Ok(data) => {
                            let decoded = decoder.decode(&data);
                            if !decoded.is_empty() {
                                return Poll::Ready(Some(Ok(Frame::data(decoded))));
                            }
                        }
                        Err(trailers) => return Poll::Ready(Some(Ok(trailers))),
                    }
                }
                Some(Err(err)) => {
                    *this.finished = true;
                    return Poll::Ready(Some(Err(err.into())));
                }
                None => {
                    *this.finished = true;
                    let Some(mut decoder) = this.decoder.take() else {
                        return Poll::Ready(None);
                    };
                    return match decoder.flush() {
                        Ok(tail) if tail.is_empty() => Poll::Ready(None),
                        Ok(tail) => Poll::Ready(Some(Ok(Frame::data(tail)))),
                        Err(err) => Poll::Ready(Some(Err(err.into()))),
                    };
                }
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        self.finished || (self.decoder.is_none() && self.inner.is_end_stream())
    }

    fn size_hint(&self) -> SizeHint {
        if self.decoder.is_some() {
            SizeHint::default()
        } else {
            self.inner.size_hint()
        }
    }
}
