use crate::constant::CommandByte;
use crate::error::{Error, Result};
use crate::protocol::command::prepared::{ExecuteResponse, read_execute_response};
use crate::protocol::primitive::*;

/// Write COM_QUERY command
pub fn write_query(out: &mut Vec<u8>, sql: &str) {
    write_int_1(out, CommandByte::Query as u8);
    out.extend_from_slice(sql.as_bytes());
}

/// Read COM_QUERY response
///
/// Same shape as a COM_STMT_EXECUTE response, except that 0xFB requests a LOCAL INFILE upload.
pub fn read_query_response(payload: &[u8]) -> Result<ExecuteResponse> {
    if payload.first() == Some(&0xFB) {
        return Err(Error::BadConfigError(
            "LOCAL INFILE queries are not supported".to_string(),
        ));
    }
    read_execute_response(payload)
}

/// Write COM_QUIT command
pub fn write_quit(out: &mut Vec<u8>) {
    write_int_1(out, CommandByte::Quit as u8);
}

/// Write COM_PING command
pub fn write_ping(out: &mut Vec<u8>) {
    write_int_1(out, CommandByte::Ping as u8);
}

/// Write COM_INIT_DB command
pub fn write_init_db(out: &mut Vec<u8>, database: &str) {
    write_int_1(out, CommandByte::InitDb as u8);
    out.extend_from_slice(database.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_packet() {
        let mut out = Vec::new();
        write_query(&mut out, "SELECT 1");
        assert_eq!(out, b"\x03SELECT 1");
    }

    #[test]
    fn local_infile_is_rejected() {
        assert!(matches!(
            read_query_response(b"\xFBdata.csv"),
            Err(Error::BadConfigError(_))
        ));
    }

    #[test]
    fn utility_packets() {
        let mut out = Vec::new();
        write_ping(&mut out);
        write_quit(&mut out);
        write_init_db(&mut out, "test");
        assert_eq!(out, b"\x0e\x01\x02test");
    }
}
