//! We use this mocking module in unit tests to emulate a serial port with
//! canned response bytes, for byte-exact frame assertions.

/// Our mock type used to emulate a serial port.
pub struct MockSerial {
    /// Buffer to store data written to the mock serial port
    write_buffer: heapless::Vec<u8, 256>,
    /// Buffer containing pre-configured response data to be read
    read_buffer: heapless::Vec<u8, 256>,
    /// Current position in the read buffer
    read_position: usize,
    /// Flag to simulate write errors
    should_error_on_write: bool,
    /// Flag to simulate read errors
    should_error_on_read: bool,
}

#[derive(Debug)]
pub enum MockSerialError {
    /// Simulated buffer overflow
    BufferOverflow,
    /// Generic simulated error for testing
    SimulatedError,
    /// Would block - no data available
    WouldBlock,
}

impl core::fmt::Display for MockSerialError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MockSerialError::BufferOverflow => write!(f, "mock buffer overflow"),
            MockSerialError::SimulatedError => write!(f, "simulated serial error"),
            MockSerialError::WouldBlock => write!(f, "no data available"),
        }
    }
}

impl core::error::Error for MockSerialError {}

impl embedded_io::Error for MockSerialError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            MockSerialError::BufferOverflow => embedded_io::ErrorKind::OutOfMemory,
            MockSerialError::SimulatedError => embedded_io::ErrorKind::BrokenPipe,
            // The Dps client treats this like a serial timeout.
            MockSerialError::WouldBlock => embedded_io::ErrorKind::TimedOut,
        }
    }
}

impl embedded_io::ErrorType for MockSerial {
    type Error = MockSerialError;
}

impl embedded_io::Write for MockSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if self.should_error_on_write {
            return Err(MockSerialError::SimulatedError);
        }

        self.write_buffer
            .extend_from_slice(buf)
            .map_err(|_| MockSerialError::BufferOverflow)?;

        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        if self.should_error_on_write {
            return Err(MockSerialError::SimulatedError);
        }
        Ok(())
    }
}

impl embedded_io::Read for MockSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.should_error_on_read {
            return Err(MockSerialError::SimulatedError);
        }

        if self.read_position >= self.read_buffer.len() {
            return Err(MockSerialError::WouldBlock);
        }

        let available_bytes = self.read_buffer.len() - self.read_position;
        let bytes_to_read = core::cmp::min(buf.len(), available_bytes);

        buf[..bytes_to_read]
            .copy_from_slice(&self.read_buffer[self.read_position..self.read_position + bytes_to_read]);

        self.read_position += bytes_to_read;
        Ok(bytes_to_read)
    }
}

impl MockSerial {
    /// Create a new MockSerial instance with empty buffers
    pub fn new() -> Self {
        Self {
            write_buffer: heapless::Vec::new(),
            read_buffer: heapless::Vec::new(),
            read_position: 0,
            should_error_on_write: false,
            should_error_on_read: false,
        }
    }

    /// Set the data that will be returned when read() is called
    pub fn set_read_data(&mut self, data: &[u8]) -> Result<(), MockSerialError> {
        self.read_buffer.clear();
        self.read_position = 0;

        self.read_buffer
            .extend_from_slice(data)
            .map_err(|_| MockSerialError::BufferOverflow)
    }

    /// Get a reference to the data that was written to this mock serial port
    pub fn written_data(&self) -> &[u8] {
        &self.write_buffer
    }

    /// Configure whether write operations should fail with an error
    pub fn set_write_error(&mut self, should_error: bool) {
        self.should_error_on_write = should_error;
    }

    /// Configure whether read operations should fail with an error
    pub fn set_read_error(&mut self, should_error: bool) {
        self.should_error_on_read = should_error;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_io::{Error, Read, Write};

    #[test]
    fn test_write_then_read_back() {
        let mut mock = MockSerial::new();
        mock.write(b"\x01\x03").unwrap();
        mock.write(b"\x00\x02").unwrap();
        assert_eq!(mock.written_data(), b"\x01\x03\x00\x02");

        mock.set_read_data(b"\x01\x03\x02").unwrap();
        let mut buffer = [0u8; 2];
        assert_eq!(mock.read(&mut buffer).unwrap(), 2);
        assert_eq!(&buffer, b"\x01\x03");
        assert_eq!(mock.read(&mut buffer).unwrap(), 1);
        assert_eq!(buffer[0], 0x02);
    }

    #[test]
    fn test_read_blocks_when_exhausted() {
        let mut mock = MockSerial::new();
        mock.set_read_data(b"\x01").unwrap();

        let mut buffer = [0u8; 4];
        mock.read(&mut buffer).unwrap();

        let result = mock.read(&mut buffer);
        assert!(matches!(result, Err(MockSerialError::WouldBlock)));
        assert_eq!(
            result.unwrap_err().kind(),
            embedded_io::ErrorKind::TimedOut
        );
    }

    #[test]
    fn test_error_satisfies_embedded_io_bounds() {
        // embedded_io::Error has the core error trait as supertrait, which
        // in turn needs Display.
        fn assert_impl<E: core::error::Error + embedded_io::Error>(_: &E) {}
        assert_impl(&MockSerialError::WouldBlock);
        assert_eq!(
            MockSerialError::BufferOverflow.to_string(),
            "mock buffer overflow"
        );
    }

    #[test]
    fn test_error_simulation() {
        let mut mock = MockSerial::new();
        mock.set_write_error(true);
        assert!(mock.write(b"test").is_err());
        assert!(mock.flush().is_err());
        assert_eq!(mock.written_data().len(), 0);

        mock.set_write_error(false);
        mock.set_read_data(b"data").unwrap();
        mock.set_read_error(true);

        let mut buffer = [0u8; 4];
        assert!(matches!(
            mock.read(&mut buffer),
            Err(MockSerialError::SimulatedError)
        ));
    }
}
