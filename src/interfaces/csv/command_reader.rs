use crate::error::{DispatchError, Result};
use crate::interfaces::command::Command;
use std::io::Read;

/// Reads commands from a CSV script.
///
/// Rows have no header and vary in length by command. Whitespace around
/// fields is trimmed and lines starting with `#` are skipped.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    /// Creates a new `CommandReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .flexible(true)
            .comment(Some(b'#'))
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and parses commands, each paired
    /// with the script line it came from.
    pub fn commands(self) -> impl Iterator<Item = (u64, Result<Command>)> {
        self.reader.into_records().map(|result| match result {
            Ok(record) => {
                let line = record.position().map_or(0, |p| p.line());
                (line, Command::try_from(&record))
            }
            Err(e) => {
                let line = e.position().map_or(0, |p| p.line());
                (line, Err(DispatchError::from(e)))
            }
        })
    }
}
