use std::io::{BufRead, BufReader, BufWriter, Read, Write};

use super::commands::{UciCommand, UciMessage, UciParseError};

/// Reads messages sent by an engine.
pub struct UciReader<I: Read> {
    inner: BufReader<I>,
}
impl<I: Read> UciReader<I> {
    // Creates a new UCI reader with the given input stream.
    pub fn new(input: I) -> Self {
        Self {
            inner: BufReader::new(input),
        }
    }

    /// Reads a message, or returns `None` once the engine closed its output.
    pub fn read_message(&mut self) -> std::io::Result<Option<Result<UciMessage, UciParseError>>> {
        let mut buffer = String::new();
        if self.inner.read_line(&mut buffer)? == 0 {
            return Ok(None);
        }
        log::trace!("<< {}", buffer.trim_end());
        Ok(Some(buffer.parse()))
    }
}

/// Sends commands to an engine.
pub struct UciWriter<O: Write> {
    inner: BufWriter<O>,
}
impl<O: Write> UciWriter<O> {
    // Creates a new UCI writer with the given output stream.
    pub fn new(output: O) -> Self {
        Self {
            inner: BufWriter::new(output),
        }
    }

    /// Sends a command.
    pub fn send_command(&mut self, command: &UciCommand) -> std::io::Result<()> {
        log::trace!(">> {}", command.to_string().trim_end());
        write!(self.inner, "{command}")?;
        self.inner.flush()
    }

    /// Returns a reference to the underlying output stream.
    pub fn get_ref(&self) -> &O {
        self.inner.get_ref()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reads_until_end_of_stream() {
        let mut reader = UciReader::new("id name Mock\nuciok\n".as_bytes());
        assert_eq!(
            reader.read_message().unwrap(),
            Some(Ok(UciMessage::IdName("Mock".to_string())))
        );
        assert_eq!(reader.read_message().unwrap(), Some(Ok(UciMessage::Initialized)));
        assert_eq!(reader.read_message().unwrap(), None);
    }

    #[test]
    fn commands_are_flushed() {
        let mut writer = UciWriter::new(Vec::new());
        writer.send_command(&UciCommand::Initialize).unwrap();
        writer.send_command(&UciCommand::IsReady).unwrap();
        assert_eq!(writer.get_ref().as_slice(), b"uci\nisready\n");
    }
}
