use std::io::{self, Write};
use std::sync::mpsc::Sender;

use crate::session::QuestionResult;

/// Receives each result as it is recorded, e.g. to add a row to a view
pub trait ResultListener {
    fn result_recorded(&mut self, result: &QuestionResult);
}

/// Audible cue played once per recorded result
pub trait Chime {
    fn chime(&mut self) -> io::Result<()>;
}

/// Forwards recorded results over a channel to whoever renders them
#[derive(Debug, Clone)]
pub struct ChannelListener {
    tx: Sender<QuestionResult>,
}

impl ChannelListener {
    pub fn new(tx: Sender<QuestionResult>) -> Self {
        Self { tx }
    }
}

impl ResultListener for ChannelListener {
    fn result_recorded(&mut self, result: &QuestionResult) {
        // receiver gone means nobody is rendering any more
        let _ = self.tx.send(result.clone());
    }
}

/// Rings the terminal bell
#[derive(Debug, Default)]
pub struct TerminalBell;

impl Chime for TerminalBell {
    fn chime(&mut self) -> io::Result<()> {
        let mut out = io::stdout();
        out.write_all(b"\x07")?;
        out.flush()
    }
}

#[derive(Debug, Default)]
pub struct Silent;

impl Chime for Silent {
    fn chime(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ResultListener for Silent {
    fn result_recorded(&mut self, _result: &QuestionResult) {}
}
