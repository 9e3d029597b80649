use std::io::{self, BufRead, BufReader, ErrorKind, Read, Write};
use std::net::TcpStream;
use std::time::{Duration, Instant};

use super::report::{Fix, Report};
use crate::config::{GpsdConfig, WaitPolicy};
use crate::error::{BeaconError, Result};

/// Turns on the live JSON report stream
pub const WATCH_ENABLE: &str = "?WATCH={\"enable\":true,\"json\":true};\n";

/// Byte stream to a gpsd daemon
pub trait Transport: Read + Write {
    /// Bound the next blocking read; `None` blocks indefinitely
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()>;
}

impl Transport for TcpStream {
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        TcpStream::set_read_timeout(self, timeout)
    }
}

/// A watching gpsd session
///
/// The connection is closed when the session is dropped.
pub struct Session<T: Transport> {
    reader: BufReader<T>,
    wait: WaitPolicy,
}

impl Session<TcpStream> {
    pub fn connect(config: &GpsdConfig) -> Result<Self> {
        let addr = config.address();
        log::info!("Connecting to gpsd at {}", addr);

        let stream = TcpStream::connect((config.host.as_str(), config.port))
            .map_err(|source| BeaconError::Connect { addr, source })?;
        if let Ok(peer) = stream.peer_addr() {
            log::debug!("Connected to {}", peer);
        }

        Self::new(stream, config.wait)
    }
}

impl<T: Transport> Session<T> {
    /// Start watching over an already-open transport
    pub fn new(mut transport: T, wait: WaitPolicy) -> Result<Self> {
        transport.write_all(WATCH_ENABLE.as_bytes())?;
        transport.flush()?;
        log::debug!("Sent {}", WATCH_ENABLE.trim_end());

        Ok(Self {
            reader: BufReader::new(transport),
            wait,
        })
    }

    /// Report stream, bounded by this session's wait policy
    ///
    /// Ends when gpsd closes the connection. Once the wait policy expires the
    /// stream yields a single `NoFix` error and then ends. A timeout too large
    /// to represent as an `Instant` waits forever.
    pub fn reports(&mut self) -> Reports<'_, T> {
        let now = Instant::now();
        let deadline = self
            .wait
            .timeout()
            .and_then(|t| now.checked_add(t).map(|deadline| (deadline, t)));
        Reports {
            reader: &mut self.reader,
            deadline,
            line: Vec::new(),
            done: false,
        }
    }

    /// Wait for the first report carrying both latitude and longitude
    pub fn first_fix(&mut self) -> Result<Fix> {
        for report in self.reports() {
            let report = report?;
            if let Some(fix) = report.fix()? {
                log::info!(
                    "Fix from {} report: {} (mode {:?}, time {:?})",
                    report.class,
                    fix.position,
                    fix.mode,
                    fix.time
                );
                return Ok(fix);
            }
            log::debug!("Skipping {} report", report.class);
        }
        Err(BeaconError::StreamClosed)
    }

    pub fn into_inner(self) -> T {
        self.reader.into_inner()
    }
}

/// Lazy sequence of gpsd reports, one per JSON line
pub struct Reports<'a, T: Transport> {
    reader: &'a mut BufReader<T>,
    deadline: Option<(Instant, Duration)>,
    line: Vec<u8>,
    done: bool,
}

impl<T: Transport> Reports<'_, T> {
    fn timed_out(&mut self, timeout: Duration) -> Option<Result<Report>> {
        self.done = true;
        Some(Err(BeaconError::NoFix(timeout)))
    }
}

impl<T: Transport> Iterator for Reports<'_, T> {
    type Item = Result<Report>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            if let Some((deadline, timeout)) = self.deadline {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return self.timed_out(timeout);
                }
                if let Err(e) = self.reader.get_ref().set_read_timeout(Some(remaining)) {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            }

            // A timed-out read may leave a partial line behind; keep it
            match self.reader.read_until(b'\n', &mut self.line) {
                Ok(0) => {
                    log::warn!("gpsd closed the connection");
                    self.done = true;
                    return None;
                }
                Ok(_) => {}
                Err(e) if self.deadline.is_some() && is_timeout(&e) => continue,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            }

            let line = std::mem::take(&mut self.line);
            let line = line.trim_ascii();
            if line.is_empty() {
                continue;
            }
            log::trace!("gpsd: {}", String::from_utf8_lossy(line));
            return Some(Report::parse_bytes(line));
        }
    }
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::io::Cursor;

    /// In-memory transport; once the scripted input runs out it either reports
    /// end of stream or behaves like a silent socket whose read timeout fires.
    struct ScriptedTransport {
        input: Cursor<Vec<u8>>,
        written: Vec<u8>,
        stall_at_end: bool,
        /// Byte offset at which one read times out before the rest arrives
        pause_at: Option<u64>,
        read_timeout: Cell<Option<Duration>>,
    }

    impl ScriptedTransport {
        fn new(lines: &[&str], stall_at_end: bool) -> Self {
            let mut input = String::new();
            for line in lines {
                input.push_str(line);
                input.push('\n');
            }
            Self::from_bytes(input.into_bytes(), stall_at_end)
        }

        fn from_bytes(input: Vec<u8>, stall_at_end: bool) -> Self {
            Self {
                input: Cursor::new(input),
                written: Vec::new(),
                stall_at_end,
                pause_at: None,
                read_timeout: Cell::new(None),
            }
        }
    }

    impl Read for ScriptedTransport {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if let Some(pause_at) = self.pause_at {
                let pos = self.input.position();
                if pos == pause_at {
                    self.pause_at = None;
                    return Err(io::Error::new(ErrorKind::WouldBlock, "read timed out"));
                }
                let room = (pause_at - pos) as usize;
                let len = buf.len().min(room);
                return self.input.read(&mut buf[..len]);
            }

            let n = self.input.read(buf)?;
            if n == 0 && self.stall_at_end {
                let timeout = self
                    .read_timeout
                    .get()
                    .expect("stalling read without a timeout would hang");
                std::thread::sleep(timeout);
                return Err(io::Error::new(ErrorKind::WouldBlock, "read timed out"));
            }
            Ok(n)
        }
    }

    impl Write for ScriptedTransport {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Transport for ScriptedTransport {
        fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
            self.read_timeout.set(timeout);
            Ok(())
        }
    }

    const VERSION: &str = r#"{"class":"VERSION","release":"3.25","rev":"3.25","proto_major":3,"proto_minor":15}"#;
    const NO_FIX: &str = r#"{"class":"TPV","device":"/dev/ttyACM0","mode":1}"#;
    const FIX: &str = r#"{"class":"TPV","device":"/dev/ttyACM0","mode":3,"lat":-33.8688,"lon":151.2093}"#;

    #[test]
    fn test_sends_watch_command() {
        let transport = ScriptedTransport::new(&[], false);
        let session = Session::new(transport, WaitPolicy::Forever).unwrap();
        let transport = session.into_inner();
        assert_eq!(transport.written, WATCH_ENABLE.as_bytes());
    }

    #[test]
    fn test_first_fix_skips_reports_without_position() {
        let transport = ScriptedTransport::new(&[VERSION, "", NO_FIX, FIX, NO_FIX], false);
        let mut session = Session::new(transport, WaitPolicy::Forever).unwrap();

        let fix = session.first_fix().unwrap();
        assert!((fix.position.lat() + 33.8688).abs() < 1e-9);
        assert!((fix.position.lon() - 151.2093).abs() < 1e-9);
        assert_eq!(fix.mode, Some(3));
    }

    #[test]
    fn test_report_stream_yields_every_line() {
        let transport = ScriptedTransport::new(&[VERSION, NO_FIX, FIX], false);
        let mut session = Session::new(transport, WaitPolicy::Forever).unwrap();

        let classes: Vec<String> = session.reports().map(|r| r.unwrap().class).collect();
        assert_eq!(classes, ["VERSION", "TPV", "TPV"]);
    }

    #[test]
    fn test_stream_closed_before_fix() {
        let transport = ScriptedTransport::new(&[VERSION, NO_FIX], false);
        let mut session = Session::new(transport, WaitPolicy::Forever).unwrap();

        assert!(matches!(
            session.first_fix(),
            Err(BeaconError::StreamClosed)
        ));
    }

    #[test]
    fn test_read_timeout_becomes_no_fix() {
        let wait = WaitPolicy::Timeout(Duration::from_millis(100));
        let transport = ScriptedTransport::new(&[VERSION, NO_FIX], true);
        let mut session = Session::new(transport, wait).unwrap();

        match session.first_fix() {
            Err(BeaconError::NoFix(d)) => assert_eq!(d, Duration::from_millis(100)),
            other => panic!("expected NoFix, got {:?}", other),
        }
    }

    #[test]
    fn test_stream_ends_after_timeout() {
        let wait = WaitPolicy::Timeout(Duration::from_millis(100));
        let transport = ScriptedTransport::new(&[], true);
        let mut session = Session::new(transport, wait).unwrap();

        let mut reports = session.reports();
        assert!(matches!(reports.next(), Some(Err(BeaconError::NoFix(_)))));
        assert!(reports.next().is_none());
    }

    #[test]
    fn test_malformed_report_is_an_error() {
        let transport = ScriptedTransport::new(&[VERSION, "{\"class\":\"TPV\",\"lat\":"], false);
        let mut session = Session::new(transport, WaitPolicy::Forever).unwrap();

        assert!(matches!(
            session.first_fix(),
            Err(BeaconError::Protocol { .. })
        ));
    }

    #[test]
    fn test_huge_timeout_waits_without_deadline() {
        let wait: WaitPolicy = "1e19".parse().unwrap();
        let transport = ScriptedTransport::new(&[VERSION, FIX], false);
        let mut session = Session::new(transport, wait).unwrap();

        let fix = session.first_fix().unwrap();
        assert_eq!(fix.mode, Some(3));
    }

    #[test]
    fn test_timeout_inside_multibyte_character_keeps_line_intact() {
        let line = "{\"class\":\"TPV\",\"device\":\"gnss-\u{e9}\",\"lat\":1.0,\"lon\":2.0}\n";
        let split = line.find('\u{e9}').unwrap() as u64 + 1;
        let mut transport = ScriptedTransport::from_bytes(line.as_bytes().to_vec(), false);
        transport.pause_at = Some(split);

        let wait = WaitPolicy::Timeout(Duration::from_secs(5));
        let mut session = Session::new(transport, wait).unwrap();

        let fix = session.first_fix().unwrap();
        assert_eq!(fix.device.as_deref(), Some("gnss-\u{e9}"));
    }

    #[test]
    fn test_non_utf8_report_is_a_protocol_error() {
        let mut input = b"{\"class\":\"TPV\",\"device\":\"".to_vec();
        input.extend_from_slice(&[0xff, 0xfe]);
        input.extend_from_slice(b"\",\"lat\":1.0,\"lon\":2.0}\n");
        let transport = ScriptedTransport::from_bytes(input, false);
        let mut session = Session::new(transport, WaitPolicy::Forever).unwrap();

        assert!(matches!(
            session.first_fix(),
            Err(BeaconError::Protocol { .. })
        ));
    }
}
