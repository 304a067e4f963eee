//! Frame reader and writer over blocking byte streams.

use std::io::{self, BufRead, Read, Write};

use crate::types::{Frame, FrameError, FrameResult};

/// The only header the codec interprets. Matched exactly, case-sensitive.
pub const CONTENT_LENGTH: &str = "Content-Length";

/// Body limit servers apply by default. [`FrameReader::new`] itself is unbounded.
pub const DEFAULT_MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Longest header line accepted, excluding the line terminator.
pub const MAX_HEADER_LINE_LEN: usize = 8 * 1024;

/// Upper bound on the up-front body allocation; larger bodies grow as bytes arrive.
const INITIAL_BODY_CAPACITY: usize = 64 * 1024;

/// Reads length-prefixed frames from a buffered stream.
pub struct FrameReader<R> {
    inner: R,
    max_frame_len: usize,
    line: Vec<u8>,
}

impl<R: BufRead> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_max_frame_len(inner, usize::MAX)
    }

    pub fn with_max_frame_len(inner: R, max_frame_len: usize) -> Self {
        Self {
            inner,
            max_frame_len,
            line: Vec::new(),
        }
    }

    pub fn max_frame_len(&self) -> usize {
        self.max_frame_len
    }

    /// Read the next frame.
    ///
    /// Returns `Ok(None)` when the stream ends cleanly between frames. Blank
    /// lines before a header block are skipped. Header lines other than
    /// `Content-Length` are ignored. A declared length of zero yields an
    /// empty frame.
    pub fn read_frame(&mut self) -> FrameResult<Option<Frame>> {
        let mut saw_header = false;
        let mut content_length: Option<usize> = None;

        loop {
            self.line.clear();
            let read = (&mut self.inner)
                .take(MAX_HEADER_LINE_LEN as u64 + 2)
                .read_until(b'\n', &mut self.line)?;
            if read == 0 {
                return if saw_header {
                    Err(FrameError::TruncatedHeader)
                } else {
                    Ok(None)
                };
            }

            let terminated = self.line.ends_with(b"\n");
            let text = strip_line_ending(&self.line);
            if text.len() > MAX_HEADER_LINE_LEN {
                return Err(FrameError::HeaderLineTooLong {
                    limit: MAX_HEADER_LINE_LEN,
                });
            }

            if !terminated {
                // EOF in the middle of a line.
                if !saw_header && text.iter().all(u8::is_ascii_whitespace) {
                    return Ok(None);
                }
                return Err(FrameError::TruncatedHeader);
            }

            if text.is_empty() {
                if saw_header {
                    break;
                }
                continue;
            }

            saw_header = true;
            let text = String::from_utf8_lossy(text);
            match text.split_once(':') {
                Some((CONTENT_LENGTH, value)) => {
                    let value = value.trim();
                    let length = value
                        .parse::<usize>()
                        .map_err(|_| FrameError::InvalidContentLength(value.to_string()))?;
                    content_length = Some(length);
                }
                Some((name, _)) => {
                    tracing::trace!("Ignoring header {name:?}");
                }
                None => {
                    tracing::trace!("Ignoring header line without a colon");
                }
            }
        }

        let length = content_length.ok_or(FrameError::MissingContentLength)?;
        if length > self.max_frame_len {
            return Err(FrameError::FrameTooLarge {
                length,
                limit: self.max_frame_len,
            });
        }

        let mut payload = Vec::with_capacity(length.min(INITIAL_BODY_CAPACITY));
        let received = (&mut self.inner)
            .take(length as u64)
            .read_to_end(&mut payload)?;
        if received < length {
            return Err(FrameError::TruncatedBody {
                expected: length,
                received,
            });
        }

        tracing::trace!("Read frame of {length} bytes");
        Ok(Some(Frame::new(payload)))
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: BufRead> Iterator for FrameReader<R> {
    type Item = FrameResult<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_frame().transpose()
    }
}

/// Writes length-prefixed frames, flushing after each one.
pub struct FrameWriter<W> {
    inner: W,
}

impl<W: Write> FrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Write one frame and flush the underlying stream.
    pub fn write_frame(&mut self, payload: &[u8]) -> io::Result<()> {
        write!(self.inner, "{CONTENT_LENGTH}: {}\r\n\r\n", payload.len())?;
        self.inner.write_all(payload)?;
        self.inner.flush()?;
        tracing::trace!("Wrote frame of {} bytes", payload.len());
        Ok(())
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Encode a single frame into a new buffer.
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let mut buf = format!("{CONTENT_LENGTH}: {}\r\n\r\n", payload.len()).into_bytes();
    buf.extend_from_slice(payload);
    buf
}

fn strip_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reader(bytes: &[u8]) -> FrameReader<Cursor<Vec<u8>>> {
        FrameReader::new(Cursor::new(bytes.to_vec()))
    }

    #[test]
    fn test_write_exact_bytes() {
        let mut writer = FrameWriter::new(Vec::new());
        writer.write_frame(b"{\"a\":1}").unwrap();
        assert_eq!(writer.into_inner(), b"Content-Length: 7\r\n\r\n{\"a\":1}".to_vec());
    }

    #[derive(Default)]
    struct FlushCounter {
        visible: Vec<u8>,
        flushes: usize,
    }

    impl Write for FlushCounter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.visible.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    #[test]
    fn test_write_flushes_each_frame() {
        let mut writer = FrameWriter::new(io::BufWriter::new(FlushCounter::default()));

        writer.write_frame(b"{\"id\":1}").unwrap();
        let sink = writer.get_ref().get_ref();
        assert_eq!(sink.visible, b"Content-Length: 8\r\n\r\n{\"id\":1}".to_vec());
        assert_eq!(sink.flushes, 1);

        writer.write_frame(b"").unwrap();
        assert_eq!(writer.get_ref().get_ref().flushes, 2);
    }

    #[test]
    fn test_roundtrip_various_lengths() {
        let payloads: [&[u8]; 4] = [b"", b"x", b"{\"jsonrpc\":\"2.0\"}", &[0, 13, 10, 13, 10, 255]];
        for payload in payloads {
            let mut writer = FrameWriter::new(Vec::new());
            writer.write_frame(payload).unwrap();

            let mut reader = reader(&writer.into_inner());
            let frame = reader.read_frame().unwrap().expect("frame");
            assert_eq!(frame.payload(), payload);
            assert!(reader.read_frame().unwrap().is_none());
        }
    }

    #[test]
    fn test_roundtrip_large_payload() {
        let payload = vec![b'z'; INITIAL_BODY_CAPACITY * 3 + 17];
        let bytes = encode_frame(&payload);
        let frame = reader(&bytes).read_frame().unwrap().unwrap();
        assert_eq!(frame.len(), payload.len());
        assert_eq!(frame.into_payload(), payload);
    }

    #[test]
    fn test_consecutive_frames() {
        let mut bytes = encode_frame(b"first");
        bytes.extend(encode_frame(b""));
        bytes.extend(encode_frame(b"third"));

        let frames: Vec<Frame> = reader(&bytes).map(Result::unwrap).collect();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].payload(), b"first");
        assert!(frames[1].is_empty());
        assert_eq!(frames[2].payload(), b"third");
    }

    #[test]
    fn test_unknown_headers_ignored() {
        let bytes = b"X-Trace: abc\r\nContent-Type: application/json\r\nContent-Length: 2\r\nnot a header\r\n\r\n{}";
        let frame = reader(bytes).read_frame().unwrap().unwrap();
        assert_eq!(frame.payload(), b"{}");
    }

    #[test]
    fn test_bare_newlines_accepted() {
        let frame = reader(b"Content-Length: 3\n\nabc").read_frame().unwrap().unwrap();
        assert_eq!(frame.payload(), b"abc");
    }

    #[test]
    fn test_value_whitespace_trimmed() {
        let frame = reader(b"Content-Length:   4  \r\n\r\nabcd")
            .read_frame()
            .unwrap()
            .unwrap();
        assert_eq!(frame.payload(), b"abcd");
    }

    #[test]
    fn test_leading_blank_lines_skipped() {
        let frame = reader(b"\r\n\r\nContent-Length: 1\r\n\r\nq")
            .read_frame()
            .unwrap()
            .unwrap();
        assert_eq!(frame.payload(), b"q");
    }

    #[test]
    fn test_clean_eof() {
        assert!(reader(b"").read_frame().unwrap().is_none());
        assert!(reader(b"\r\n\r\n").read_frame().unwrap().is_none());
        assert!(reader(b"\r\n  ").read_frame().unwrap().is_none());
    }

    #[test]
    fn test_header_name_is_case_sensitive() {
        let err = reader(b"content-length: 2\r\n\r\n{}").read_frame().unwrap_err();
        assert!(matches!(err, FrameError::MissingContentLength));

        let err = reader(b" Content-Length: 2\r\n\r\n{}").read_frame().unwrap_err();
        assert!(matches!(err, FrameError::MissingContentLength));
    }

    #[test]
    fn test_invalid_content_length() {
        let err = reader(b"Content-Length: ten\r\n\r\n").read_frame().unwrap_err();
        assert!(matches!(err, FrameError::InvalidContentLength(ref v) if v == "ten"));

        let err = reader(b"Content-Length: -3\r\n\r\n").read_frame().unwrap_err();
        assert!(matches!(err, FrameError::InvalidContentLength(_)));
        assert!(err.is_malformed());
    }

    #[test]
    fn test_truncated_header() {
        let err = reader(b"Content-Length: 5\r\n").read_frame().unwrap_err();
        assert!(matches!(err, FrameError::TruncatedHeader));

        let err = reader(b"Content-Len").read_frame().unwrap_err();
        assert!(matches!(err, FrameError::TruncatedHeader));
    }

    #[test]
    fn test_truncated_body() {
        let err = reader(b"Content-Length: 10\r\n\r\nabc").read_frame().unwrap_err();
        match err {
            FrameError::TruncatedBody { expected, received } => {
                assert_eq!(expected, 10);
                assert_eq!(received, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_frame_too_large() {
        let mut reader =
            FrameReader::with_max_frame_len(Cursor::new(b"Content-Length: 9\r\n\r\n123456789".to_vec()), 8);
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::FrameTooLarge { length: 9, limit: 8 }));
    }

    #[test]
    fn test_new_is_unbounded() {
        assert_eq!(reader(b"").max_frame_len(), usize::MAX);
        let payload = vec![b'a'; 1024];
        let frame = FrameReader::with_max_frame_len(Cursor::new(encode_frame(&payload)), 1024)
            .read_frame()
            .unwrap()
            .unwrap();
        assert_eq!(frame.len(), 1024);
    }

    #[test]
    fn test_header_line_too_long() {
        let mut bytes = vec![b'X'; MAX_HEADER_LINE_LEN * 4];
        bytes.extend_from_slice(b"\r\nContent-Length: 2\r\n\r\n{}");
        let err = reader(&bytes).read_frame().unwrap_err();
        assert!(matches!(err, FrameError::HeaderLineTooLong { limit: MAX_HEADER_LINE_LEN }));
        assert!(err.is_malformed());
    }

    #[test]
    fn test_header_line_at_limit_accepted() {
        let mut bytes = b"X-Pad: ".to_vec();
        bytes.resize(MAX_HEADER_LINE_LEN, b'p');
        bytes.extend_from_slice(b"\r\nContent-Length: 2\r\n\r\n{}");
        let frame = reader(&bytes).read_frame().unwrap().unwrap();
        assert_eq!(frame.payload(), b"{}");
    }

    #[test]
    fn test_last_content_length_wins() {
        let frame = reader(b"Content-Length: 99\r\nContent-Length: 2\r\n\r\nok")
            .read_frame()
            .unwrap()
            .unwrap();
        assert_eq!(frame.payload(), b"ok");
    }

    #[test]
    fn test_io_error_not_malformed() {
        let err = FrameError::from(io::Error::new(io::ErrorKind::BrokenPipe, "gone"));
        assert!(!err.is_malformed());
    }
}
