use crate::bind::InputBind;
use crate::constant::CommandByte;
use crate::error::{Error, Result, eyre};
use crate::protocol::primitive::*;
use crate::protocol::response::{OkPayload, Response, classify};
use zerocopy::byteorder::little_endian::{U16 as U16LE, U32 as U32LE};
use zerocopy::{FromBytes, Immutable, KnownLayout};

/// Prepared statement OK response (zero-copy)
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, KnownLayout, Immutable)]
pub struct PrepareOk {
    statement_id: U32LE,
    num_columns: U16LE,
    num_params: U16LE,
    _reserved: u8,
    warning_count: U16LE,
}

impl PrepareOk {
    pub fn statement_id(&self) -> u32 {
        self.statement_id.get()
    }

    pub fn num_columns(&self) -> u16 {
        self.num_columns.get()
    }

    pub fn num_params(&self) -> u16 {
        self.num_params.get()
    }

    pub fn warning_count(&self) -> u16 {
        self.warning_count.get()
    }
}

/// Write COM_STMT_PREPARE command
pub fn write_prepare(out: &mut Vec<u8>, sql: &str) {
    write_int_1(out, CommandByte::StmtPrepare as u8);
    out.extend_from_slice(sql.as_bytes());
}

/// Read COM_STMT_PREPARE response
pub fn read_prepare_ok(payload: &[u8]) -> Result<&PrepareOk> {
    match classify(payload)? {
        Response::Err(err) => Err(err.into()),
        Response::Ok(ok) => {
            let (_status, data) = read_int_1(ok.bytes())?;
            let (prepare_ok, _rest) =
                PrepareOk::ref_from_prefix(data).map_err(|_| Error::UnexpectedEof)?;
            Ok(prepare_ok)
        }
        Response::Other(_) => Err(Error::InvalidPacket),
    }
}

/// Write COM_STMT_EXECUTE command
///
/// Types are sent on every execution. Parameters are never NULL, so the NULL bitmap is all zero.
pub fn write_execute(out: &mut Vec<u8>, statement_id: u32, binds: &[InputBind<'_>]) -> Result<()> {
    write_int_1(out, CommandByte::StmtExecute as u8);
    write_int_4(out, statement_id);

    // flags - CURSOR_TYPE_NO_CURSOR
    write_int_1(out, 0x00);

    // iteration count - always 1
    write_int_4(out, 1);

    if binds.is_empty() {
        return Ok(());
    }

    out.resize(out.len() + binds.len().div_ceil(8), 0);

    // new-params-bound-flag
    write_int_1(out, 0x01);
    for bind in binds {
        write_int_1(out, bind.bind_type.column_type() as u8);
        write_int_1(out, if bind.is_unsigned { 0x80 } else { 0x00 });
    }

    for bind in binds {
        write_bind_value(out, bind)?;
    }
    Ok(())
}

/// Write one parameter value in binary protocol encoding
///
/// Fixed-width buffers hold native-endian bytes and are written little-endian.
fn write_bind_value(out: &mut Vec<u8>, bind: &InputBind<'_>) -> Result<()> {
    match bind.bind_type.width() {
        None => write_bytes_lenenc(out, &bind.buffer),
        Some(width) => {
            if bind.buffer.len() != width {
                return Err(Error::LibraryBug(eyre!(
                    "{:?} parameter carries {} bytes, expected {}",
                    bind.bind_type,
                    bind.buffer.len(),
                    width
                )));
            }
            if cfg!(target_endian = "little") {
                out.extend_from_slice(&bind.buffer);
            } else {
                out.extend(bind.buffer.iter().rev());
            }
        }
    }
    Ok(())
}

/// First packet of a COM_STMT_EXECUTE response
#[derive(Debug)]
pub enum ExecuteResponse {
    /// The statement produced no result set
    Ok(OkPayload),
    /// A result set with this many columns follows
    ResultSet { column_count: usize },
}

/// Read COM_STMT_EXECUTE (or COM_QUERY) response header
pub fn read_execute_response(payload: &[u8]) -> Result<ExecuteResponse> {
    match classify(payload)? {
        Response::Ok(ok) => Ok(ExecuteResponse::Ok(OkPayload::try_from(ok)?)),
        Response::Err(err) => Err(err.into()),
        Response::Other(data) => {
            let (column_count, _rest) = read_int_lenenc(data)?;
            Ok(ExecuteResponse::ResultSet {
                column_count: column_count as usize,
            })
        }
    }
}

/// Write COM_STMT_CLOSE command
pub fn write_close_statement(out: &mut Vec<u8>, statement_id: u32) {
    write_int_1(out, CommandByte::StmtClose as u8);
    write_int_4(out, statement_id);
}
