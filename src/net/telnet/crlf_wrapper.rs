use std::pin::Pin;
use std::task::{Context, Poll, ready};
use tokio::io::{self, AsyncWrite};

/// Normalizes bare '\n' to "\r\n" on all writes. An existing "\r\n" is left
/// alone, including when the pair is split across two writes.
///
/// Bytes are reported as written once they are expanded into the internal
/// buffer; `poll_flush` and `poll_shutdown` drain that buffer first.
pub struct CrlfWriter<W> {
    inner: W,
    // Expanded output awaiting the inner writer
    out_buf: Vec<u8>,
    out_pos: usize,
    last_was_cr: bool,
}

impl<W: AsyncWrite + Unpin> CrlfWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            out_buf: Vec::new(),
            out_pos: 0,
            last_was_cr: false,
        }
    }

    fn expand(&mut self, src: &[u8]) {
        self.out_buf.reserve(src.len());
        for &b in src {
            if b == b'\n' && !self.last_was_cr {
                self.out_buf.push(b'\r');
            }
            self.out_buf.push(b);
            self.last_was_cr = b == b'\r';
        }
    }

    fn poll_drain(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        while self.out_pos < self.out_buf.len() {
            let n = ready!(Pin::new(&mut self.inner).poll_write(cx, &self.out_buf[self.out_pos..]))?;
            if n == 0 {
                return Poll::Ready(Err(io::ErrorKind::WriteZero.into()));
            }
            self.out_pos += n;
        }

        self.out_buf.clear();
        self.out_pos = 0;
        Poll::Ready(Ok(()))
    }
}

impl<W: AsyncWrite + Unpin> AsyncWrite for CrlfWriter<W> {
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        let this = self.get_mut();

        // Previous output must be gone before we accept more
        ready!(this.poll_drain(cx))?;

        if buf.is_empty() {
            return Poll::Ready(Ok(0));
        }

        this.expand(buf);
        match this.poll_drain(cx) {
            Poll::Ready(Err(e)) => Poll::Ready(Err(e)),
            // Accepted into out_buf either way; flush finishes the job.
            _ => Poll::Ready(Ok(buf.len())),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        ready!(this.poll_drain(cx))?;
        Pin::new(&mut this.inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        ready!(this.poll_drain(cx))?;
        Pin::new(&mut this.inner).poll_shutdown(cx)
    }
}
