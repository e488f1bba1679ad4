/// Buffers owned by one [`Conn`](crate::sync::Conn)
///
/// Outgoing buffers start with 4 reserved bytes for the first packet header.
#[derive(Debug)]
pub struct BufferSet {
    /// Server greeting, kept for the lifetime of the connection
    pub initial_handshake: Vec<u8>,

    /// Payload of the last packet read
    pub read_buffer: Vec<u8>,

    write_buffer: Vec<u8>,

    /// COM_STMT_EXECUTE encoded by the last `bind_param`, sent on `execute`
    execute_buffer: Vec<u8>,

    /// Binary row the current fetch decoded from, kept for column refetches
    pub row_buffer: Vec<u8>,
}

fn reset_outgoing(buffer: &mut Vec<u8>) -> &mut Vec<u8> {
    buffer.clear();
    buffer.extend_from_slice(&[0u8; 4]);
    buffer
}

impl BufferSet {
    pub fn new() -> Self {
        Self {
            initial_handshake: Vec::new(),
            read_buffer: Vec::new(),
            write_buffer: vec![0; 4],
            execute_buffer: vec![0; 4],
            row_buffer: Vec::new(),
        }
    }

    /// Start a new command in the write buffer
    #[inline]
    pub fn new_write_buffer(&mut self) -> &mut Vec<u8> {
        reset_outgoing(&mut self.write_buffer)
    }

    /// Start a new COM_STMT_EXECUTE in the execute buffer
    #[inline]
    pub fn new_execute_buffer(&mut self) -> &mut Vec<u8> {
        reset_outgoing(&mut self.execute_buffer)
    }

    #[inline]
    pub fn write_buffer_mut(&mut self) -> &mut Vec<u8> {
        &mut self.write_buffer
    }

    #[inline]
    pub fn execute_buffer_mut(&mut self) -> &mut Vec<u8> {
        &mut self.execute_buffer
    }

    /// Keep the payload just read as the current row without copying it
    #[inline]
    pub fn keep_row(&mut self) {
        std::mem::swap(&mut self.read_buffer, &mut self.row_buffer);
    }
}

impl Default for BufferSet {
    fn default() -> Self {
        Self::new()
    }
}
