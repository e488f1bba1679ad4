use crate::driver::{StmtDriver, UNKNOWN_AFFECTED_ROWS};
use crate::error::{Error, Result, merge_cleanup};
use crate::output::fetch_all;
use crate::protocol::r#trait::{FromRow, Params, bind_params};

/// A prepared statement bound to one native statement handle
///
/// Parameter and result column counts are read once when the statement is created.
/// A statement with no result columns is a command, any other is a query.
///
/// The handle is released exactly once: by [`PreparedStatement::close`], which reports
/// failures, or on drop, which logs them.
pub struct PreparedStatement<D: StmtDriver> {
    driver: D,
    sql: String,
    param_count: usize,
    field_count: usize,
    released: bool,
}

impl<D: StmtDriver> PreparedStatement<D> {
    pub(crate) fn new(driver: D, sql: impl Into<String>) -> Self {
        let param_count = driver.param_count();
        let field_count = driver.field_count();
        Self {
            driver,
            sql: sql.into(),
            param_count,
            field_count,
            released: false,
        }
    }

    /// Number of `?` placeholders
    pub fn param_count(&self) -> usize {
        self.param_count
    }

    /// Number of result columns; zero for commands
    pub fn field_count(&self) -> usize {
        self.field_count
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub(crate) fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Execute a command and return the number of affected rows
    pub fn exec_command<P: Params + ?Sized>(&mut self, params: &P) -> Result<u64> {
        if self.field_count != 0 {
            return Err(Error::QueryAsCommand);
        }
        self.bind_and_execute(params)?;

        match self.driver.affected_rows() {
            UNKNOWN_AFFECTED_ROWS => Err(Error::UnknownAffectedRows),
            rows => Ok(rows),
        }
    }

    /// Execute a query and append every row to `results`
    ///
    /// Rows decoded before a failure stay in `results`.
    pub fn exec_query<P, R>(&mut self, params: &P, results: &mut Vec<R>) -> Result<()>
    where
        P: Params + ?Sized,
        R: FromRow,
    {
        if self.field_count == 0 {
            return Err(Error::CommandAsQuery);
        }
        if self.field_count != R::ARITY {
            return Err(Error::ColumnCountMismatch {
                expected: self.field_count,
                actual: R::ARITY,
            });
        }
        self.bind_and_execute(params)?;

        let fetched = fetch_all(self, results);
        let freed = self.driver.free_result();
        merge_cleanup(fetched, freed)
    }

    fn bind_and_execute<P: Params + ?Sized>(&mut self, params: &P) -> Result<()> {
        if params.len() != self.param_count {
            return Err(Error::ParamCountMismatch {
                expected: self.param_count,
                actual: params.len(),
            });
        }
        let binds = bind_params(params);
        tracing::debug!(sql = %self.sql, params = binds.len(), "execute");
        self.driver.bind_param(&binds)?;
        self.driver.execute()
    }

    /// Free any pending result and close the handle
    pub fn close(mut self) -> Result<()> {
        self.release()
    }

    fn release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        let freed = self.driver.free_result();
        let closed = self.driver.close();
        merge_cleanup(freed, closed)
    }
}

impl<D: StmtDriver> Drop for PreparedStatement<D> {
    fn drop(&mut self) {
        if let Err(error) = self.release() {
            tracing::warn!(sql = %self.sql, %error, "failed to release prepared statement");
        }
    }
}

impl<D: StmtDriver> std::fmt::Debug for PreparedStatement<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedStatement")
            .field("sql", &self.sql)
            .field("param_count", &self.param_count)
            .field("field_count", &self.field_count)
            .finish_non_exhaustive()
    }
}
