use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

type Reader = Box<dyn AsyncBufRead + Send + Unpin>;
type Writer = Box<dyn AsyncWrite + Send + Unpin>;

/// Longest input line kept, terminator included.
pub const MAX_LINE_LEN: usize = 4096;

/// A line read from the client, before it is parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputLine {
    Line(String),
    /// The line was not valid UTF-8
    Malformed,
    /// The line exceeded the length limit; the excess was discarded
    TooLong,
    /// End of stream
    Closed,
}

/// Input source and output sink of a single session.
///
/// Every write is flushed straight away, so prompts show up on the client
/// without a trailing newline. Commands get the console handed to them and
/// may hold a longer dialog with the client through it.
pub struct Console {
    reader: Reader,
    writer: Writer,
    buf: Vec<u8>,
    max_line: usize,
}

impl Console {
    pub fn new<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncBufRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            reader: Box::new(reader),
            writer: Box::new(writer),
            buf: Vec::with_capacity(256),
            max_line: MAX_LINE_LEN,
        }
    }

    pub fn with_max_line(mut self, max_line: usize) -> Self {
        self.max_line = max_line.max(1);
        self
    }

    /// Write `s` followed by a newline.
    pub async fn line(&mut self, s: impl AsRef<str>) -> io::Result<()> {
        self.writer.write_all(s.as_ref().as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await
    }

    /// Write `s` as is, without a newline.
    pub async fn write(&mut self, s: impl AsRef<str>) -> io::Result<()> {
        self.writer.write_all(s.as_ref().as_bytes()).await?;
        self.writer.flush().await
    }

    /// Read the next line, without its line terminator. At most `max_line`
    /// bytes are kept; the rest of an over-long line is read and dropped.
    pub async fn read_input(&mut self) -> io::Result<InputLine> {
        self.buf.clear();
        let mut read_any = false;
        let mut truncated = false;

        loop {
            let available = self.reader.fill_buf().await?;
            if available.is_empty() {
                break;
            }
            read_any = true;

            let (used, done) = match available.iter().position(|&b| b == b'\n') {
                Some(i) => (i + 1, true),
                None => (available.len(), false),
            };

            let room = self.max_line.saturating_sub(self.buf.len());
            if used > room {
                truncated = true;
            }
            self.buf.extend_from_slice(&available[..used.min(room)]);
            self.reader.consume(used);

            if done {
                break;
            }
        }

        if !read_any {
            return Ok(InputLine::Closed);
        }

        while matches!(self.buf.last(), Some(b'\n' | b'\r')) {
            self.buf.pop();
        }

        if truncated {
            return Ok(InputLine::TooLong);
        }

        match std::str::from_utf8(&self.buf) {
            Ok(s) => Ok(InputLine::Line(s.to_string())),
            Err(_) => Ok(InputLine::Malformed),
        }
    }

    /// Read the next line for a command dialog. Returns `None` when the
    /// client has gone away. Invalid UTF-8 is replaced rather than rejected.
    pub async fn read_line(&mut self) -> io::Result<Option<String>> {
        match self.read_input().await? {
            InputLine::Line(s) => Ok(Some(s)),
            InputLine::Malformed | InputLine::TooLong => Ok(Some(String::from_utf8_lossy(&self.buf).into_owned())),
            InputLine::Closed => Ok(None),
        }
    }

    pub async fn shutdown(&mut self) -> io::Result<()> {
        self.writer.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, BufReader, duplex};

    fn console_with_input(input: &'static [u8]) -> (Console, tokio::io::DuplexStream) {
        let (ours, theirs) = duplex(1024);
        (Console::new(BufReader::new(input), ours), theirs)
    }

    #[tokio::test]
    async fn reads_lines_with_either_terminator() {
        let (mut c, _peer) = console_with_input(b"status\r\nhelp\nlast");
        assert_eq!(c.read_input().await.unwrap(), InputLine::Line("status".into()));
        assert_eq!(c.read_input().await.unwrap(), InputLine::Line("help".into()));
        assert_eq!(c.read_input().await.unwrap(), InputLine::Line("last".into()));
        assert_eq!(c.read_input().await.unwrap(), InputLine::Closed);
    }

    #[tokio::test]
    async fn invalid_utf8_is_malformed() {
        let (mut c, _peer) = console_with_input(b"\xff\xfe\n");
        assert_eq!(c.read_input().await.unwrap(), InputLine::Malformed);
    }

    #[tokio::test]
    async fn read_line_is_lossy() {
        let (mut c, _peer) = console_with_input(b"a\xffb\n");
        assert_eq!(c.read_line().await.unwrap(), Some("a\u{fffd}b".to_string()));
        assert_eq!(c.read_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn over_long_lines_are_cut_off() {
        let (c, _peer) = console_with_input(b"0123456789abcdef\nshort\n");
        let mut c = c.with_max_line(8);

        assert_eq!(c.read_input().await.unwrap(), InputLine::TooLong);
        assert_eq!(c.read_input().await.unwrap(), InputLine::Line("short".into()));
        assert_eq!(c.read_input().await.unwrap(), InputLine::Closed);
    }

    #[tokio::test]
    async fn over_long_line_spanning_reads() {
        // A tiny read buffer makes the line arrive in many chunks
        let (ours, _peer) = duplex(64);
        let reader = BufReader::with_capacity(4, &b"abcdefghijklmnop\nok\n"[..]);
        let mut c = Console::new(reader, ours).with_max_line(6);

        assert_eq!(c.read_line().await.unwrap(), Some("abcdef".to_string()));
        assert_eq!(c.read_line().await.unwrap(), Some("ok".to_string()));
    }

    #[tokio::test]
    async fn line_at_the_limit_is_kept() {
        let (c, _peer) = console_with_input(b"abcde\n");
        let mut c = c.with_max_line(6);
        assert_eq!(c.read_input().await.unwrap(), InputLine::Line("abcde".into()));
    }

    #[tokio::test]
    async fn writes_are_flushed() {
        let (mut c, mut peer) = console_with_input(b"");
        c.write("> ").await.unwrap();
        c.line("OK").await.unwrap();
        c.shutdown().await.unwrap();

        let mut out = String::new();
        peer.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "> OK\n");
    }
}
