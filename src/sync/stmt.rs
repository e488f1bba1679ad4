use crate::bind::{InputBind, OutputBind};
use crate::constant::{CapabilityFlags, ServerStatusFlags};
use crate::driver::{FetchStatus, StmtDriver, UNKNOWN_AFFECTED_ROWS};
use crate::error::{Error, Result};
use crate::protocol::command::prepared::{
    ExecuteResponse, read_execute_response, write_close_statement, write_execute,
};
use crate::protocol::command::{ColumnDefinitionBytes, ColumnTypeAndFlags};
use crate::protocol::convert::store;
use crate::protocol::response::{ErrPayload, read_eof_status};
use crate::protocol::row::{RowPacket, classify_row, read_binary_row};
use crate::statement::PreparedStatement;
use crate::sync::conn::Conn;

/// A prepared statement running over a [`Conn`]
pub type Statement<'c> = PreparedStatement<WireStmt<'c>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Rows,
    Done,
    Closed,
}

/// [`StmtDriver`] speaking the binary protocol on a borrowed connection
///
/// `bind_param` encodes COM_STMT_EXECUTE right away; `execute` sends it. Rows are read one
/// packet at a time and converted into the caller's binds.
pub struct WireStmt<'c> {
    conn: &'c mut Conn,
    statement_id: u32,
    param_count: usize,
    field_count: usize,
    columns: Vec<ColumnTypeAndFlags>,
    params_bound: bool,
    affected_rows: u64,
    phase: Phase,
}

impl<'c> WireStmt<'c> {
    pub(crate) fn new(
        conn: &'c mut Conn,
        statement_id: u32,
        param_count: usize,
        field_count: usize,
    ) -> Self {
        Self {
            conn,
            statement_id,
            param_count,
            field_count,
            columns: Vec::new(),
            params_bound: false,
            affected_rows: UNKNOWN_AFFECTED_ROWS,
            phase: Phase::Idle,
        }
    }

    pub fn statement_id(&self) -> u32 {
        self.statement_id
    }

    fn ensure_open(&self) -> Result<()> {
        if self.phase == Phase::Closed {
            return Err(Error::Driver(format!(
                "statement {} is already closed",
                self.statement_id
            )));
        }
        Ok(())
    }

    fn read_columns(&mut self, column_count: usize) -> Result<()> {
        self.columns.clear();
        for _ in 0..column_count {
            let payload = self.conn.read_packet()?;
            self.columns
                .push(ColumnTypeAndFlags::try_from(ColumnDefinitionBytes(payload))?);
        }
        if !self
            .conn
            .capability_flags()
            .contains(CapabilityFlags::CLIENT_DEPRECATE_EOF)
        {
            self.conn.read_packet()?;
        }
        Ok(())
    }

    /// Read rows until the end of the current result set and return its final status
    fn skip_rows(&mut self) -> Result<ServerStatusFlags> {
        loop {
            let payload = self.conn.read_packet()?;
            match classify_row(payload)? {
                RowPacket::End(end) => return read_eof_status(end),
                RowPacket::Err(err) => return Err(err.into()),
                RowPacket::Row(_) => {}
            }
        }
    }

    /// Discard any further result sets announced with SERVER_MORE_RESULTS_EXISTS
    fn drain_more_results(&mut self, mut status: ServerStatusFlags) -> Result<()> {
        while status.contains(ServerStatusFlags::SERVER_MORE_RESULTS_EXISTS) {
            let payload = self.conn.read_packet()?;
            status = match read_execute_response(payload)? {
                ExecuteResponse::Ok(ok) => ok.status_flags,
                ExecuteResponse::ResultSet { column_count } => {
                    self.read_columns(column_count)?;
                    self.skip_rows()?
                }
            };
            self.conn.set_status_flags(status);
        }
        Ok(())
    }

    fn decode_into(&self, binds: &mut [OutputBind]) -> Result<bool> {
        let row = read_binary_row(self.conn.row_buffer(), self.columns.len())?;
        let values = row.decode(&self.columns)?;
        let mut truncated = false;
        for (bind, value) in binds.iter_mut().zip(&values) {
            truncated |= store(value, bind, 0);
        }
        Ok(truncated)
    }
}

impl StmtDriver for WireStmt<'_> {
    fn param_count(&self) -> usize {
        self.param_count
    }

    fn field_count(&self) -> usize {
        self.field_count
    }

    fn bind_param(&mut self, binds: &[InputBind<'_>]) -> Result<()> {
        self.ensure_open()?;
        if binds.len() != self.param_count {
            return Err(Error::ParamCountMismatch {
                expected: self.param_count,
                actual: binds.len(),
            });
        }
        let out = self.conn.new_execute_buffer();
        write_execute(out, self.statement_id, binds)?;
        self.params_bound = true;
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(statement_id = self.statement_id))]
    fn execute(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.free_result()?;
        if !self.params_bound {
            if self.param_count > 0 {
                return Err(Error::Driver(
                    "parameters must be bound before execute".to_string(),
                ));
            }
            write_execute(self.conn.new_execute_buffer(), self.statement_id, &[])?;
        }

        self.conn.send_execute_buffer()?;
        let payload = self.conn.read_packet()?;
        match read_execute_response(payload)? {
            ExecuteResponse::Ok(ok) => {
                self.affected_rows = ok.affected_rows;
                self.conn.set_status_flags(ok.status_flags);
                self.phase = Phase::Done;
                self.drain_more_results(ok.status_flags)?;
            }
            ExecuteResponse::ResultSet { column_count } => {
                tracing::debug!(column_count, "result set");
                self.affected_rows = UNKNOWN_AFFECTED_ROWS;
                self.read_columns(column_count)?;
                self.phase = Phase::Rows;
            }
        }
        Ok(())
    }

    fn affected_rows(&self) -> u64 {
        self.affected_rows
    }

    fn bind_result(&mut self, binds: &[OutputBind]) -> Result<()> {
        self.ensure_open()?;
        if binds.len() != self.columns.len() {
            return Err(Error::ColumnCountMismatch {
                expected: self.columns.len(),
                actual: binds.len(),
            });
        }
        Ok(())
    }

    fn fetch(&mut self, binds: &mut [OutputBind]) -> FetchStatus {
        if self.phase != Phase::Rows {
            return FetchStatus::NoData;
        }
        let payload = match self.conn.read_packet() {
            Ok(payload) => payload,
            Err(e) => return FetchStatus::Error(e.to_string()),
        };

        let packet = match classify_row(payload) {
            Ok(packet) => packet,
            Err(e) => return FetchStatus::Error(e.to_string()),
        };
        match packet {
            RowPacket::End(end) => {
                self.phase = Phase::Done;
                let drained = read_eof_status(end).and_then(|status| {
                    self.conn.set_status_flags(status);
                    self.drain_more_results(status)
                });
                return match drained {
                    Ok(()) => FetchStatus::NoData,
                    Err(e) => FetchStatus::Error(e.to_string()),
                };
            }
            RowPacket::Err(err) => {
                self.phase = Phase::Done;
                let message = match ErrPayload::try_from(err) {
                    Ok(err) => err.to_string(),
                    Err(e) => e.to_string(),
                };
                return FetchStatus::Error(message);
            }
            RowPacket::Row(_) => {}
        }

        self.conn.keep_row();
        match self.decode_into(binds) {
            Ok(false) => FetchStatus::Row,
            Ok(true) => FetchStatus::Truncated,
            Err(e) => FetchStatus::Error(e.to_string()),
        }
    }

    fn fetch_column(&mut self, bind: &mut OutputBind, column: usize, offset: usize) -> Result<()> {
        let row = read_binary_row(self.conn.row_buffer(), self.columns.len())?;
        let values = row.decode(&self.columns)?;
        let value = values.get(column).ok_or_else(|| {
            Error::Driver(format!(
                "column {} out of range for a row of {}",
                column,
                values.len()
            ))
        })?;
        store(value, bind, offset);
        Ok(())
    }

    fn free_result(&mut self) -> Result<()> {
        if self.phase != Phase::Rows {
            return Ok(());
        }
        self.phase = Phase::Done;
        let status = self.skip_rows()?;
        self.conn.set_status_flags(status);
        self.drain_more_results(status)
    }

    #[tracing::instrument(skip_all, fields(statement_id = self.statement_id))]
    fn close(&mut self) -> Result<()> {
        if self.phase == Phase::Closed {
            return Ok(());
        }
        let freed = self.free_result();
        self.phase = Phase::Closed;
        write_close_statement(self.conn.new_write_buffer(), self.statement_id);
        // COM_STMT_CLOSE has no response
        self.conn.send_write_buffer()?;
        freed
    }
}
