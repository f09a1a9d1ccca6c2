use std::thread;
use std::time::Duration;

use midir::MidiOutput;

use crate::catalog::Preset;

const CLIENT_NAME: &str = "osmose-presets";

/// Control-change status byte on channel 0.
const CONTROL_CHANGE: u8 = 0xB0;
/// Program-change status byte on channel 0.
const PROGRAM_CHANGE: u8 = 0xC0;
/// Bank select MSB controller.
const BANK_SELECT: u8 = 0x00;

#[derive(thiserror::Error, Debug)]
pub enum PortError {
    #[error("no MIDI output port selected")]
    NoPortSelected,
    #[error("MIDI output port not found: {0}")]
    NotFound(String),
    #[error("failed to open MIDI output {port}: {reason}")]
    Open { port: String, reason: String },
    #[error("failed to send to MIDI output {port}: {reason}")]
    Send { port: String, reason: String },
    #[error("MIDI backend error: {0}")]
    Backend(String),
}

/// An open output connection. Dropping it also closes it.
pub trait MidiConnection {
    fn send(&mut self, message: &[u8]) -> Result<(), PortError>;
    fn close(self: Box<Self>);
}

/// Source of MIDI output connections.
pub trait MidiOut {
    fn list_outputs(&self) -> Result<Vec<String>, PortError>;
    fn open(&self, port_name: &str) -> Result<Box<dyn MidiConnection>, PortError>;
}

pub fn bank_select(cc0: u8) -> [u8; 3] {
    [CONTROL_CHANGE, BANK_SELECT, cc0 & 0x7F]
}

pub fn program_change(pgm: u8) -> [u8; 2] {
    [PROGRAM_CHANGE, pgm & 0x7F]
}

/// Select `preset` on the device behind `port`: bank select, wait for the
/// device to settle, then program change. Nothing is sent if the port
/// cannot be opened.
pub fn send_preset_change(
    out: &dyn MidiOut,
    port: &str,
    preset: &Preset,
    settle: Duration,
) -> Result<(), PortError> {
    if port.is_empty() {
        return Err(PortError::NoPortSelected);
    }
    let mut conn = out.open(port)?;

    let cc = bank_select(preset.cc0);
    log::info!("MIDI out [{port}] CC     ch=0 data={cc:02x?}");
    let sent = conn.send(&cc).and_then(|()| {
        thread::sleep(settle);
        let pc = program_change(preset.pgm);
        log::info!("MIDI out [{port}] PgmChg ch=0 data={pc:02x?}");
        conn.send(&pc)
    });
    conn.close();
    sent?;

    log::info!(
        "Selected '{}' ({}/{}) cc0={} pgm={}",
        preset.name,
        preset.pack,
        preset.kind,
        preset.cc0,
        preset.pgm
    );
    Ok(())
}

/// midir-backed output.
pub struct MidirOut {
    client_name: String,
}

impl MidirOut {
    pub fn new() -> Self {
        Self {
            client_name: CLIENT_NAME.to_string(),
        }
    }

    fn client(&self) -> Result<MidiOutput, PortError> {
        MidiOutput::new(&self.client_name).map_err(|e| PortError::Backend(e.to_string()))
    }
}

impl Default for MidirOut {
    fn default() -> Self {
        Self::new()
    }
}

impl MidiOut for MidirOut {
    fn list_outputs(&self) -> Result<Vec<String>, PortError> {
        let midi_out = self.client()?;
        Ok(midi_out
            .ports()
            .iter()
            .filter_map(|p| midi_out.port_name(p).ok())
            .collect())
    }

    fn open(&self, port_name: &str) -> Result<Box<dyn MidiConnection>, PortError> {
        let midi_out = self.client()?;
        let ports = midi_out.ports();
        let named: Vec<_> = ports
            .iter()
            .filter_map(|p| midi_out.port_name(p).ok().map(|n| (p, n)))
            .collect();

        // Exact name first, then the first port containing it.
        let (port, name) = named
            .iter()
            .find(|(_, n)| n == port_name)
            .or_else(|| named.iter().find(|(_, n)| n.contains(port_name)))
            .map(|(p, n)| ((*p).clone(), n.clone()))
            .ok_or_else(|| PortError::NotFound(port_name.to_string()))?;

        let conn = midi_out
            .connect(&port, CLIENT_NAME)
            .map_err(|e| PortError::Open {
                port: name.clone(),
                reason: e.to_string(),
            })?;
        log::debug!("Opened MIDI output: {name}");
        Ok(Box::new(MidirConnection { name, conn }))
    }
}

struct MidirConnection {
    name: String,
    conn: midir::MidiOutputConnection,
}

impl MidiConnection for MidirConnection {
    fn send(&mut self, message: &[u8]) -> Result<(), PortError> {
        self.conn.send(message).map_err(|e| PortError::Send {
            port: self.name.clone(),
            reason: e.to_string(),
        })
    }

    fn close(self: Box<Self>) {
        log::debug!("Closing MIDI output: {}", self.name);
        self.conn.close();
    }
}

/// Cycles through the available output ports and remembers the choice.
#[derive(Debug, Clone, Default)]
pub struct PortSelector {
    ports: Vec<String>,
    current: Option<usize>,
}

impl PortSelector {
    /// Start on `saved` if it is still present, else on the first port.
    pub fn new(ports: Vec<String>, saved: Option<&str>) -> Self {
        let current = saved
            .and_then(|s| ports.iter().position(|p| p == s))
            .or(if ports.is_empty() { None } else { Some(0) });
        Self { ports, current }
    }

    pub fn ports(&self) -> &[String] {
        &self.ports
    }

    pub fn current(&self) -> Option<&str> {
        self.current.and_then(|i| self.ports.get(i)).map(String::as_str)
    }

    /// Move to the next port. Returns the new port when it changed.
    pub fn next(&mut self) -> Option<&str> {
        self.shift(1)
    }

    pub fn prev(&mut self) -> Option<&str> {
        self.shift(self.ports.len().saturating_sub(1))
    }

    fn shift(&mut self, by: usize) -> Option<&str> {
        let len = self.ports.len();
        if len < 2 {
            return None;
        }
        let i = self.current.unwrap_or(0);
        self.current = Some((i + by) % len);
        self.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::preset;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Log {
        opened: Vec<String>,
        sent: Vec<Vec<u8>>,
        closed: usize,
    }

    struct MockOut {
        ports: Vec<String>,
        log: Rc<RefCell<Log>>,
        fail_send: bool,
    }

    struct MockConn {
        log: Rc<RefCell<Log>>,
        fail_send: bool,
    }

    impl MidiConnection for MockConn {
        fn send(&mut self, message: &[u8]) -> Result<(), PortError> {
            if self.fail_send {
                return Err(PortError::Send {
                    port: "mock".into(),
                    reason: "unplugged".into(),
                });
            }
            self.log.borrow_mut().sent.push(message.to_vec());
            Ok(())
        }

        fn close(self: Box<Self>) {
            self.log.borrow_mut().closed += 1;
        }
    }

    impl MidiOut for MockOut {
        fn list_outputs(&self) -> Result<Vec<String>, PortError> {
            Ok(self.ports.clone())
        }

        fn open(&self, port_name: &str) -> Result<Box<dyn MidiConnection>, PortError> {
            if !self.ports.iter().any(|p| p == port_name) {
                return Err(PortError::NotFound(port_name.into()));
            }
            self.log.borrow_mut().opened.push(port_name.into());
            Ok(Box::new(MockConn {
                log: self.log.clone(),
                fail_send: self.fail_send,
            }))
        }
    }

    fn mock(fail_send: bool) -> (MockOut, Rc<RefCell<Log>>) {
        let log = Rc::new(RefCell::new(Log::default()));
        let out = MockOut {
            ports: vec!["Osmose Port 1".into(), "Osmose Port 2".into()],
            log: log.clone(),
            fail_send,
        };
        (out, log)
    }

    #[test]
    fn message_bytes() {
        assert_eq!(bank_select(30), [0xB0, 0x00, 30]);
        assert_eq!(program_change(4), [0xC0, 4]);
    }

    #[test]
    fn sends_bank_then_program_and_closes() {
        let (out, log) = mock(false);
        let p = preset("factory", "keys", 30, 4, "aerials");
        send_preset_change(&out, "Osmose Port 2", &p, Duration::ZERO).unwrap();
        let log = log.borrow();
        assert_eq!(log.opened, vec!["Osmose Port 2"]);
        assert_eq!(log.sent, vec![vec![0xB0, 0x00, 30], vec![0xC0, 4]]);
        assert_eq!(log.closed, 1);
    }

    #[test]
    fn open_failure_sends_nothing() {
        let (out, log) = mock(false);
        let p = preset("factory", "keys", 30, 4, "aerials");
        let err = send_preset_change(&out, "Missing", &p, Duration::ZERO).unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
        assert!(log.borrow().sent.is_empty());
    }

    #[test]
    fn empty_port_name_is_rejected() {
        let (out, log) = mock(false);
        let p = preset("factory", "keys", 30, 4, "aerials");
        let err = send_preset_change(&out, "", &p, Duration::ZERO).unwrap_err();
        assert!(matches!(err, PortError::NoPortSelected));
        assert!(log.borrow().opened.is_empty());
    }

    #[test]
    fn send_failure_still_closes() {
        let (out, log) = mock(true);
        let p = preset("factory", "keys", 30, 4, "aerials");
        let err = send_preset_change(&out, "Osmose Port 1", &p, Duration::ZERO).unwrap_err();
        assert!(matches!(err, PortError::Send { .. }));
        assert_eq!(log.borrow().closed, 1);
    }

    #[test]
    fn selector_restores_saved_port() {
        let ports = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let sel = PortSelector::new(ports.clone(), Some("b"));
        assert_eq!(sel.current(), Some("b"));
        let sel = PortSelector::new(ports, Some("gone"));
        assert_eq!(sel.current(), Some("a"));
        let sel = PortSelector::new(Vec::new(), Some("a"));
        assert_eq!(sel.current(), None);
    }

    #[test]
    fn selector_cycles_both_ways() {
        let ports = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let mut sel = PortSelector::new(ports, None);
        assert_eq!(sel.prev(), Some("c"));
        assert_eq!(sel.next(), Some("a"));
        assert_eq!(sel.next(), Some("b"));

        let mut single = PortSelector::new(vec!["only".to_string()], None);
        assert_eq!(single.next(), None);
        assert_eq!(single.current(), Some("only"));
    }
}
