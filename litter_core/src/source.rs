//! Line-oriented weight source (one value per line, e.g. a piped sensor feed).
//!
//! Lines are read on a helper thread so `read(timeout)` can honour its
//! timeout even when the underlying reader blocks (stdin, a FIFO). Blank
//! lines and `#` comments are skipped; absent markers such as `unavailable`
//! become `Ok(None)`.

use std::io::BufRead;
use std::time::Duration;

use crossbeam_channel as xch;
use litter_traits::WeightSource;

type LineResult = Result<Option<f32>, String>;

pub struct LineSource {
    rx: xch::Receiver<LineResult>,
    exhausted: bool,
}

impl LineSource {
    /// Start reading `reader` on a helper thread.
    ///
    /// The helper is detached: a reader blocked in `read_line` cannot be
    /// interrupted, so it exits on its own at EOF or when the receiver is gone.
    pub fn spawn<R: BufRead + Send + 'static>(reader: R) -> Self {
        let (tx, rx) = xch::bounded::<LineResult>(64);
        std::thread::spawn(move || {
            for line in reader.lines() {
                let item = match line {
                    Ok(l) => match parse_line(&l) {
                        Some(item) => item,
                        None => continue,
                    },
                    Err(e) => Err(format!("read error: {e}")),
                };
                if tx.send(item).is_err() {
                    break;
                }
            }
            tracing::debug!("line source reached end of input");
        });
        Self {
            rx,
            exhausted: false,
        }
    }
}

/// `None` for lines that carry no sample at all.
fn parse_line(line: &str) -> Option<LineResult> {
    let t = line.trim();
    if t.is_empty() || t.starts_with('#') {
        return None;
    }
    Some(litter_config::parse_grams(t))
}

impl WeightSource for LineSource {
    fn read(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<f32>, Box<dyn std::error::Error + Send + Sync>> {
        match self.rx.recv_timeout(timeout) {
            Ok(Ok(v)) => Ok(v),
            Ok(Err(msg)) => Err(msg.into()),
            Err(xch::RecvTimeoutError::Timeout) => Err("line source timed out".into()),
            Err(xch::RecvTimeoutError::Disconnected) => {
                self.exhausted = true;
                Err("line source closed".into())
            }
        }
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn drain(src: &mut LineSource) -> Vec<LineResult> {
        let mut out = Vec::new();
        while !src.is_exhausted() {
            match src.read(Duration::from_secs(1)) {
                Ok(v) => out.push(Ok(v)),
                Err(e) if !src.is_exhausted() => out.push(Err(e.to_string())),
                Err(_) => {}
            }
        }
        out
    }

    #[test]
    fn parses_values_markers_and_comments() {
        let input = "# scale feed\n5012.5\n\nunavailable\n5013\n";
        let mut src = LineSource::spawn(Cursor::new(input));
        let got = drain(&mut src);
        assert_eq!(got, vec![Ok(Some(5012.5)), Ok(None), Ok(Some(5013.0))]);
    }

    #[test]
    fn garbage_line_is_a_read_error_not_the_end() {
        let mut src = LineSource::spawn(Cursor::new("abc\n7\n"));
        let got = drain(&mut src);
        assert_eq!(got.len(), 2);
        assert!(got[0].is_err());
        assert_eq!(got[1], Ok(Some(7.0)));
    }
}
