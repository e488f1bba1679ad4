use std::fmt::Display;
use std::io::BufReader;
use std::net::TcpStream;

use crate::buffer::BufferSet;
use crate::constant::{CapabilityFlags, ServerStatusFlags};
use crate::error::{Error, Result, eyre, merge_cleanup};
use crate::escape::{EscapeMode, escape};
use crate::opts::Opts;
use crate::protocol::command::prepared::{ExecuteResponse, read_prepare_ok, write_prepare};
use crate::protocol::command::query::{
    read_query_response, write_init_db, write_ping, write_query, write_quit,
};
use crate::protocol::connection::{Handshake, HandshakeConfig, HandshakeResult, InitialHandshake};
use crate::protocol::packet::{read_payload, write_payload};
use crate::protocol::response::{OkPayload, Response, classify, read_eof_status};
use crate::protocol::row::{RowPacket, classify_row};
use crate::protocol::r#trait::{FromRow, Params};
use crate::statement::PreparedStatement;
use crate::sync::stmt::{Statement, WireStmt};

/// A blocking connection to a MySQL server
pub struct Conn {
    stream: BufReader<TcpStream>,
    buffer_set: BufferSet,
    initial_handshake: InitialHandshake,
    capability_flags: CapabilityFlags,
    status_flags: ServerStatusFlags,
}

impl Conn {
    /// Connect and authenticate
    ///
    /// `opts` is anything convertible to [`Opts`], such as a `mysql://` URL.
    /// `init_command` runs right after authentication.
    #[tracing::instrument(skip_all)]
    pub fn new<O: TryInto<Opts>>(opts: O) -> Result<Self>
    where
        Error: From<O::Error>,
    {
        let opts: Opts = opts.try_into()?;
        if opts.host.is_empty() {
            return Err(Error::BadConfigError(
                "Missing host in connection options".to_string(),
            ));
        }

        let stream = TcpStream::connect((opts.host.as_str(), opts.port))?;
        stream.set_nodelay(opts.tcp_nodelay)?;

        let mut conn = Self::handshake(stream, &opts)?;
        if let Some(init_command) = &opts.init_command {
            conn.query_drop(init_command)?;
        }
        Ok(conn)
    }

    fn handshake(stream: TcpStream, opts: &Opts) -> Result<Self> {
        let mut stream = BufReader::new(stream);
        let mut buffer_set = BufferSet::new();
        let mut initial_handshake = None;

        let mut handshake = Handshake::new(HandshakeConfig {
            username: opts.user.clone(),
            password: opts.password.clone(),
            database: opts.db.clone(),
            capabilities: opts.capabilities,
        });

        let capability_flags = loop {
            let buffer = if matches!(handshake, Handshake::Start { .. }) {
                &mut buffer_set.initial_handshake
            } else {
                &mut buffer_set.read_buffer
            };
            let sequence_id = read_payload(&mut stream, buffer)?;

            let reply = match handshake.drive(buffer)? {
                HandshakeResult::InitialHandshake {
                    handshake_response,
                    initial_handshake: hs,
                } => {
                    tracing::debug!(connection_id = hs.connection_id, "initial handshake");
                    initial_handshake = Some(hs);
                    handshake_response
                }
                HandshakeResult::Write(packet) => packet,
                HandshakeResult::Read => continue,
                HandshakeResult::Connected { capability_flags } => break capability_flags,
            };

            let out = buffer_set.new_write_buffer();
            out.extend_from_slice(&reply);
            write_payload(stream.get_mut(), sequence_id.wrapping_add(1), out)?;
        };

        let initial_handshake = initial_handshake
            .ok_or_else(|| Error::LibraryBug(eyre!("connected without an initial handshake")))?;
        let status_flags = initial_handshake.status_flags;

        Ok(Self {
            stream,
            buffer_set,
            initial_handshake,
            capability_flags,
            status_flags,
        })
    }

    pub fn server_version(&self) -> &[u8] {
        self.buffer_set
            .initial_handshake
            .get(self.initial_handshake.server_version.clone())
            .unwrap_or_default()
    }

    /// Get the negotiated capability flags
    pub fn capability_flags(&self) -> CapabilityFlags {
        self.capability_flags
    }

    /// Get the connection ID assigned by the server
    pub fn connection_id(&self) -> u64 {
        self.initial_handshake.connection_id as u64
    }

    /// Server status flags from the last OK or EOF packet
    pub fn status_flags(&self) -> ServerStatusFlags {
        self.status_flags
    }

    pub fn escape_mode(&self) -> EscapeMode {
        if self
            .status_flags
            .contains(ServerStatusFlags::SERVER_STATUS_NO_BACKSLASH_ESCAPES)
        {
            EscapeMode::NoBackslash
        } else {
            EscapeMode::Backslash
        }
    }

    /// Escape `text` for a quoted literal, following the server's `NO_BACKSLASH_ESCAPES` mode
    pub fn escape(&self, text: &str) -> String {
        escape(text, self.escape_mode())
    }

    /// Substitute `args` into the `?` placeholders of `template` for the text protocol
    pub fn render(&self, template: &str, args: &[&dyn Display]) -> Result<String> {
        crate::template::render(template, args, self.escape_mode())
    }

    pub(crate) fn new_write_buffer(&mut self) -> &mut Vec<u8> {
        self.buffer_set.new_write_buffer()
    }

    pub(crate) fn new_execute_buffer(&mut self) -> &mut Vec<u8> {
        self.buffer_set.new_execute_buffer()
    }

    /// Send the command in the write buffer as a new command phase
    pub(crate) fn send_write_buffer(&mut self) -> Result<()> {
        write_payload(self.stream.get_mut(), 0, self.buffer_set.write_buffer_mut())?;
        Ok(())
    }

    pub(crate) fn send_execute_buffer(&mut self) -> Result<()> {
        write_payload(self.stream.get_mut(), 0, self.buffer_set.execute_buffer_mut())?;
        Ok(())
    }

    /// Read the next payload into the read buffer
    pub(crate) fn read_packet(&mut self) -> Result<&[u8]> {
        read_payload(&mut self.stream, &mut self.buffer_set.read_buffer)?;
        Ok(&self.buffer_set.read_buffer)
    }

    /// Keep the payload just read as the current row
    pub(crate) fn keep_row(&mut self) {
        self.buffer_set.keep_row();
    }

    pub(crate) fn row_buffer(&self) -> &[u8] {
        &self.buffer_set.row_buffer
    }

    pub(crate) fn set_status_flags(&mut self, status_flags: ServerStatusFlags) {
        self.status_flags = status_flags;
    }

    /// Read a response that must be OK, returning its payload
    fn read_ok(&mut self) -> Result<OkPayload> {
        let payload = self.read_packet()?;
        match classify(payload)? {
            Response::Ok(ok) => {
                let ok = OkPayload::try_from(ok)?;
                self.status_flags = ok.status_flags;
                Ok(ok)
            }
            Response::Err(err) => Err(err.into()),
            Response::Other(_) => Err(Error::InvalidPacket),
        }
    }

    /// Prepare `sql` on the server
    ///
    /// The statement borrows the connection until it is closed or dropped.
    #[tracing::instrument(skip_all)]
    pub fn prepare(&mut self, sql: &str) -> Result<Statement<'_>> {
        write_prepare(self.new_write_buffer(), sql);
        self.send_write_buffer()?;

        let payload = self.read_packet()?;
        let prepare_ok = read_prepare_ok(payload)?;
        let statement_id = prepare_ok.statement_id();
        let num_params = prepare_ok.num_params() as usize;
        let num_columns = prepare_ok.num_columns() as usize;
        tracing::debug!(statement_id, num_params, num_columns, "prepared");

        let eof = !self
            .capability_flags
            .contains(CapabilityFlags::CLIENT_DEPRECATE_EOF);
        for count in [num_params, num_columns] {
            if count == 0 {
                continue;
            }
            for _ in 0..count {
                self.read_packet()?;
            }
            if eof {
                self.read_packet()?;
            }
        }

        Ok(PreparedStatement::new(
            WireStmt::new(self, statement_id, num_params, num_columns),
            sql,
        ))
    }

    /// Prepare and execute a statement that returns no rows
    ///
    /// Returns the number of affected rows. The statement is closed on every path.
    pub fn run_command<P: Params + ?Sized>(&mut self, sql: &str, params: &P) -> Result<u64> {
        let mut stmt = self.prepare(sql)?;
        let affected = stmt.exec_command(params);
        merge_cleanup(affected, stmt.close())
    }

    /// Prepare and execute a query, appending its rows to `results`
    ///
    /// Rows decoded before a failure stay in `results`. The statement is closed on every path.
    pub fn run_query<R, P>(&mut self, results: &mut Vec<R>, sql: &str, params: &P) -> Result<()>
    where
        R: FromRow,
        P: Params + ?Sized,
    {
        let mut stmt = self.prepare(sql)?;
        let fetched = stmt.exec_query(params, results);
        merge_cleanup(fetched, stmt.close())
    }

    /// Run `sql` with the text protocol and discard any rows
    ///
    /// Returns the affected-row count of the last statement.
    #[tracing::instrument(skip_all)]
    pub fn query_drop(&mut self, sql: &str) -> Result<u64> {
        write_query(self.new_write_buffer(), sql);
        self.send_write_buffer()?;

        let mut affected_rows = 0;
        loop {
            let payload = self.read_packet()?;
            let status = match read_query_response(payload)? {
                ExecuteResponse::Ok(ok) => {
                    affected_rows = ok.affected_rows;
                    ok.status_flags
                }
                ExecuteResponse::ResultSet { column_count } => {
                    self.skip_result_set(column_count)?
                }
            };
            self.status_flags = status;
            if !status.contains(ServerStatusFlags::SERVER_MORE_RESULTS_EXISTS) {
                return Ok(affected_rows);
            }
        }
    }

    fn skip_result_set(&mut self, column_count: usize) -> Result<ServerStatusFlags> {
        for _ in 0..column_count {
            self.read_packet()?;
        }
        if !self
            .capability_flags
            .contains(CapabilityFlags::CLIENT_DEPRECATE_EOF)
        {
            self.read_packet()?;
        }
        loop {
            let payload = self.read_packet()?;
            match classify_row(payload)? {
                RowPacket::End(end) => return read_eof_status(end),
                RowPacket::Err(err) => return Err(err.into()),
                RowPacket::Row(_) => {}
            }
        }
    }

    /// Check that the server is alive
    pub fn ping(&mut self) -> Result<()> {
        write_ping(self.new_write_buffer());
        self.send_write_buffer()?;
        self.read_ok()?;
        Ok(())
    }

    /// Change the default database
    pub fn select_db(&mut self, db: &str) -> Result<()> {
        write_init_db(self.new_write_buffer(), db);
        self.send_write_buffer()?;
        self.read_ok()?;
        Ok(())
    }
}

impl Drop for Conn {
    fn drop(&mut self) {
        write_quit(self.new_write_buffer());
        if let Err(error) = self.send_write_buffer() {
            tracing::debug!(%error, "failed to send COM_QUIT");
        }
    }
}
