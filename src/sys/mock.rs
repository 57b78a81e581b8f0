//! Scripted bus for exercising the acquisition sequence without hardware.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::rc::Rc;

use crate::{Error, Result};
use super::{Bus, Session, SessionOptions};

/// Everything the mock observed, shared between the bus, its sessions and the test.
#[derive(Debug, Default)]
pub struct Journal {
    pub opened: Vec<(String, SessionOptions)>,
    pub writes: Vec<String>,
    pub session_closes: usize,
    pub bus_releases: usize,
}

#[derive(Debug, Default, Clone)]
pub struct Script {
    /// Replies to queries, keyed by the command text without terminator.
    pub replies: HashMap<String, Vec<u8>>,
    /// Commands whose write fails with a timeout.
    pub failing: Vec<String>,
}

impl Script {
    pub fn reply(mut self, command: &str, reply: impl Into<Vec<u8>>) -> Self {
        self.replies.insert(command.to_owned(), reply.into());
        self
    }

    pub fn fail(mut self, command: &str) -> Self {
        self.failing.push(command.to_owned());
        self
    }

    /// The replies of a healthy scope with the given sample rate and waveform.
    pub fn scope(sample_rate: &str, waveform: &[u8]) -> Self {
        let length = waveform.len().to_string();
        let mut block = format!("#{}{}", length.len(), length).into_bytes();
        block.extend_from_slice(waveform);
        block.push(b'\n');
        Script::default()
            .reply(":ACQ:SAMP?", format!("{}\n", sample_rate))
            .reply(":WAV:DATA? CHAN1", block)
    }
}

#[derive(Debug)]
pub struct MockBus {
    resources: Vec<String>,
    script: Script,
    journal: Rc<RefCell<Journal>>,
}

impl MockBus {
    pub fn new(resources: &[&str], script: Script) -> (MockBus, Rc<RefCell<Journal>>) {
        let journal = Rc::new(RefCell::new(Journal::default()));
        let bus = MockBus {
            resources: resources.iter().map(|&name| name.to_owned()).collect(),
            script,
            journal: journal.clone(),
        };
        (bus, journal)
    }
}

impl Bus for MockBus {
    type Session = MockSession;

    fn list_resources(&mut self) -> Result<Vec<String>> {
        Ok(self.resources.clone())
    }

    fn open(&mut self, resource: &str, options: &SessionOptions) -> Result<MockSession> {
        self.journal.borrow_mut().opened.push((resource.to_owned(), *options));
        Ok(MockSession {
            script: self.script.clone(),
            journal: self.journal.clone(),
            pending: None,
        })
    }
}

impl Drop for MockBus {
    fn drop(&mut self) {
        self.journal.borrow_mut().bus_releases += 1;
    }
}

#[derive(Debug)]
pub struct MockSession {
    script: Script,
    journal: Rc<RefCell<Journal>>,
    pending: Option<Vec<u8>>,
}

impl Session for MockSession {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        let command = String::from_utf8_lossy(data).trim_end().to_owned();
        self.journal.borrow_mut().writes.push(command.clone());
        if self.script.failing.contains(&command) {
            return Err(Error::BusIo(io::Error::new(io::ErrorKind::TimedOut, "mock timeout")))
        }
        self.pending = self.script.replies.get(&command).cloned();
        Ok(())
    }

    fn read(&mut self) -> Result<Vec<u8>> {
        self.pending.take()
            .ok_or_else(|| Error::BusIo(io::Error::new(io::ErrorKind::TimedOut, "nothing to read")))
    }

    fn close(&mut self) -> Result<()> {
        self.journal.borrow_mut().session_closes += 1;
        Ok(())
    }
}
