mod conn;
mod stmt;

pub use conn::Conn;
pub use stmt::{Statement, WireStmt};
