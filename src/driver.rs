use auto_impl::auto_impl;

use crate::bind::{InputBind, OutputBind};
use crate::error::Result;

/// Affected-row count reported when the driver cannot tell
pub const UNKNOWN_AFFECTED_ROWS: u64 = u64::MAX;

/// Outcome of a single [`StmtDriver::fetch`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    /// A row was written into the output binds
    Row,
    /// A row was written but at least one column did not fit or lost data in conversion
    Truncated,
    /// The result set is exhausted
    NoData,
    /// Fetching failed
    Error(String),
    /// A status code this crate does not know
    Other(i32),
}

impl FetchStatus {
    /// Map a numeric fetch status (0 row, 1 error, 100 no data, 101 truncated)
    pub fn from_code(code: i32, message: impl FnOnce() -> String) -> Self {
        match code {
            0 => FetchStatus::Row,
            1 => FetchStatus::Error(message()),
            100 => FetchStatus::NoData,
            101 => FetchStatus::Truncated,
            other => FetchStatus::Other(other),
        }
    }
}

/// Native prepared-statement handle
///
/// The typed layer only talks to statements through this trait. Call order follows the
/// classic client API: `bind_param`, `execute`, then either `affected_rows` or
/// `bind_result` followed by repeated `fetch`.
#[auto_impl(&mut, Box)]
pub trait StmtDriver {
    fn param_count(&self) -> usize;

    fn field_count(&self) -> usize;

    fn bind_param(&mut self, binds: &[InputBind<'_>]) -> Result<()>;

    fn execute(&mut self) -> Result<()>;

    /// Rows changed by the last execute, or [`UNKNOWN_AFFECTED_ROWS`]
    fn affected_rows(&self) -> u64;

    fn bind_result(&mut self, binds: &[OutputBind]) -> Result<()>;

    /// Advance to the next row and write it into `binds`
    fn fetch(&mut self, binds: &mut [OutputBind]) -> FetchStatus;

    /// Re-read `column` of the current row starting at byte `offset` into `bind`'s window
    fn fetch_column(&mut self, bind: &mut OutputBind, column: usize, offset: usize) -> Result<()>;

    /// Discard whatever remains of the current result set
    fn free_result(&mut self) -> Result<()>;

    /// Release the statement on the server; no other call is valid afterwards
    fn close(&mut self) -> Result<()>;
}
