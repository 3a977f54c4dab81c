//! The loopback module provides an instrument simulator for testing purposes.
//!
//! The [`LoopbackTransport`] allows to test instrument drivers without hardware: it checks every
//! command that the driver sends against a list of expected commands and answers queries with
//! canned responses.

use std::io;

use crate::{InstrumentError, Transport};

/// A self-incrementing index structure that by default starts at 0 and increments whenever `next`
/// is called.
#[derive(Debug, Default)]
struct IncrIndex {
    index: usize,
}

impl IncrIndex {
    fn next(&mut self) -> usize {
        let current = self.index;
        self.index += 1;
        current
    }

    fn peek(&self) -> usize {
        self.index
    }
}

/// Handle of an open loopback session.
#[derive(Debug, PartialEq, Eq)]
pub struct LoopbackSession {
    id: usize,
}

impl LoopbackSession {
    /// Sequential number of this session, starting at 0.
    pub fn id(&self) -> usize {
        self.id
    }
}

/// A transport that allows you to simply write tests for your instrument driver.
///
/// You provide the commands that are expected to go from the host to the instrument (without
/// prefix and terminator) and the responses that go from the instrument to the host. Whenever
/// something is sent that is not the next expected command, the transport panics. When the
/// transport is dropped, [`LoopbackTransport::finalize`] checks that all commands and responses
/// have been used.
///
/// Besides checking the traffic, the transport records every command as it was sent and counts
/// opened and closed sessions. It can also be told to fail opening a session or writing a given
/// command, to test how a driver deals with a broken connection.
///
/// # Example
///
/// ```
/// use footswitch_instrument::{LoopbackTransport, Transport};
///
/// let mut lbk = LoopbackTransport::new(vec!["READ?", "SYST:LOC"], vec!["+1.0"], "\n")
///     .with_prefix(":");
///
/// let mut session = lbk.open("loop://").unwrap();
/// assert_eq!(lbk.query(&mut session, ":READ?\n").unwrap(), "+1.0");
/// lbk.write(&mut session, ":SYST:LOC\n").unwrap();
/// lbk.close(session).unwrap();
///
/// assert_eq!(lbk.sent(), [":READ?\n", ":SYST:LOC\n"]);
/// assert!(!lbk.is_session_open());
/// ```
#[derive(Debug)]
pub struct LoopbackTransport {
    from_host: Vec<String>,
    from_inst: Vec<String>,
    prefix_exp: String,
    terminator_exp: String,
    read_terminator: String,
    from_host_index: IncrIndex,
    from_inst_index: IncrIndex,
    sent: Vec<String>,
    resources: Vec<String>,
    opened: usize,
    closed: usize,
    open_error: Option<io::ErrorKind>,
    write_error: Option<(usize, io::ErrorKind)>,
}

impl LoopbackTransport {
    /// Create a new loopback transport with given commands to and from the instrument.
    ///
    /// # Arguments:
    /// * `from_host` - Commands from host to instrument, without prefix and terminator.
    /// * `from_inst` - Responses from instrument to host, returned as they are.
    /// * `terminator_exp` - The write terminator every command must end with.
    pub fn new<S: Into<String>>(
        from_host: Vec<S>,
        from_inst: Vec<S>,
        terminator_exp: &str,
    ) -> Self {
        LoopbackTransport {
            from_host: from_host.into_iter().map(Into::into).collect(),
            from_inst: from_inst.into_iter().map(Into::into).collect(),
            prefix_exp: String::new(),
            terminator_exp: terminator_exp.to_string(),
            read_terminator: String::new(),
            from_host_index: IncrIndex::default(),
            from_inst_index: IncrIndex::default(),
            sent: Vec::new(),
            resources: Vec::new(),
            opened: 0,
            closed: 0,
            open_error: None,
            write_error: None,
        }
    }

    /// Expect every command to start with `prefix`.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix_exp = prefix.to_string();
        self
    }

    /// Let every attempt to open a session fail with an I/O error of the given kind.
    pub fn with_open_error(mut self, kind: io::ErrorKind) -> Self {
        self.open_error = Some(kind);
        self
    }

    /// Let the command with the given zero-based index fail with an I/O error of the given kind.
    ///
    /// The failing command is still checked against the expected commands, but it is not
    /// recorded as sent.
    pub fn with_write_error_at(mut self, index: usize, kind: io::ErrorKind) -> Self {
        self.write_error = Some((index, kind));
        self
    }

    /// This command panics if not all commands in the [`LoopbackTransport`] have been used.
    ///
    /// It is automatically called when the [`LoopbackTransport`] is dropped, but you can also
    /// call it manually to ensure that all commands have been used.
    pub fn finalize(&mut self) {
        let from_host_leftover = self.from_host.get(self.from_host_index.peek());
        let from_inst_leftover = self.from_inst.get(self.from_inst_index.peek());
        if let Some(fil) = from_host_leftover {
            panic!("Leftover expected commands found from host to instrument: {fil}");
        }
        if let Some(fil) = from_inst_leftover {
            panic!("Leftover expected commands found from instrument to host: {fil}");
        }
    }

    /// All commands sent so far, exactly as they went over the wire.
    pub fn sent(&self) -> &[String] {
        &self.sent
    }

    /// All resource locators sessions were opened for.
    pub fn resources(&self) -> &[String] {
        &self.resources
    }

    /// The read terminator the driver handed to this transport.
    pub fn read_terminator(&self) -> &str {
        &self.read_terminator
    }

    /// Number of sessions opened so far.
    pub fn opened(&self) -> usize {
        self.opened
    }

    /// Number of sessions closed so far.
    pub fn closed(&self) -> usize {
        self.closed
    }

    /// Return `true` if more sessions were opened than closed.
    pub fn is_session_open(&self) -> bool {
        self.opened > self.closed
    }

    /// Get the next command from host to instrument with prefix and terminator, or panic.
    fn get_next_from_host(&mut self) -> String {
        let cmd = self
            .from_host
            .get(self.from_host_index.next())
            .expect("No more commands were expected from host to instrument.");
        format!("{}{cmd}{}", self.prefix_exp, self.terminator_exp)
    }

    /// Get the next response from instrument to host, or panic.
    fn get_next_from_inst(&mut self) -> String {
        self.from_inst
            .get(self.from_inst_index.next())
            .expect("No more commands were expected from instrument to host.")
            .clone()
    }

    /// Check a command against the expected one and record it.
    fn send(&mut self, data: &str) -> Result<usize, InstrumentError> {
        let index = self.from_host_index.peek();
        let exp = self.get_next_from_host();
        assert_eq!(exp, data, "Expected command {exp:?}, got {data:?}");
        if let Some((fail_at, kind)) = self.write_error {
            if fail_at == index {
                return Err(io::Error::new(kind, "loopback write failure").into());
            }
        }
        self.sent.push(data.to_string());
        Ok(data.len())
    }
}

impl Transport for LoopbackTransport {
    type Session = LoopbackSession;

    fn open(&mut self, resource: &str) -> Result<Self::Session, InstrumentError> {
        if let Some(kind) = self.open_error {
            return Err(io::Error::new(kind, "loopback open failure").into());
        }
        self.resources.push(resource.to_string());
        let session = LoopbackSession { id: self.opened };
        self.opened += 1;
        Ok(session)
    }

    fn close(&mut self, _session: Self::Session) -> Result<(), InstrumentError> {
        self.closed += 1;
        Ok(())
    }

    fn write(&mut self, _session: &mut Self::Session, data: &str) -> Result<usize, InstrumentError> {
        self.send(data)
    }

    fn query(
        &mut self,
        _session: &mut Self::Session,
        data: &str,
    ) -> Result<String, InstrumentError> {
        self.send(data)?;
        Ok(self.get_next_from_inst())
    }

    fn set_read_terminator(&mut self, terminator: &str) {
        self.read_terminator = terminator.to_string();
    }
}

impl Drop for LoopbackTransport {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            self.finalize();
        }
    }
}

// Tests of internal functionality
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incrementing_index() {
        let mut idx = IncrIndex::default();
        assert_eq!(0, idx.peek());
        assert_eq!(0, idx.next());
        assert_eq!(1, idx.peek());
        assert_eq!(1, idx.next());
        assert_eq!(2, idx.peek());
        assert_eq!(2, idx.next());
    }
}
