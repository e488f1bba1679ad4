use crate::bind::OutputBind;
use crate::driver::{FetchStatus, StmtDriver};
use crate::error::{Error, Result};
use crate::protocol::r#trait::FromRow;
use crate::statement::PreparedStatement;

/// Fetch every remaining row of an executed query into `results`
///
/// Columns that did not fit their buffer are grown and re-read before the row is decoded.
pub fn fetch_all<D, R>(stmt: &mut PreparedStatement<D>, results: &mut Vec<R>) -> Result<()>
where
    D: StmtDriver,
    R: FromRow,
{
    if stmt.field_count() != R::ARITY {
        return Err(Error::ColumnCountMismatch {
            expected: stmt.field_count(),
            actual: R::ARITY,
        });
    }

    let mut binds = R::output_binds();
    let driver = stmt.driver_mut();
    driver.bind_result(&binds)?;

    loop {
        match driver.fetch(&mut binds) {
            FetchStatus::Row => {}
            FetchStatus::Truncated => refetch_truncated(driver, &mut binds)?,
            FetchStatus::NoData => return Ok(()),
            FetchStatus::Error(message) => return Err(Error::Driver(message)),
            FetchStatus::Other(code) => return Err(Error::UnknownFetchStatus(code)),
        }
        results.push(R::from_binds(&binds)?);
    }
}

// A truncated status with no oversized column comes from a lossy numeric conversion.
fn refetch_truncated<D: StmtDriver>(driver: &mut D, binds: &mut [OutputBind]) -> Result<()> {
    let mut refetched = false;
    for (column, bind) in binds.iter_mut().enumerate() {
        if !bind.is_truncated() {
            continue;
        }
        let retrieved = bind.capacity();
        tracing::debug!(column, length = bind.length, retrieved, "refetch truncated column");

        bind.grow(bind.length + 1);
        bind.offset = retrieved;
        let fetched = driver.fetch_column(bind, column, retrieved);
        bind.offset = 0;
        fetched?;
        refetched = true;
    }

    if refetched {
        driver.bind_result(binds)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::bind::DEFAULT_STRING_CAPACITY;
    use crate::mock_driver::{Call, MockDriver, Step, int, text};

    #[test]
    fn long_column_is_refetched() {
        let long = "x".repeat(200);
        let mut driver = MockDriver::query(0, 2);
        driver.script([Step::Row(vec![int(1), text(&long)]), Step::Row(vec![int(2), text("short")])]);
        let calls = driver.calls();
        let mut stmt = PreparedStatement::new(driver, "SELECT id, body FROM notes");

        let mut rows: Vec<(i32, String)> = Vec::new();
        fetch_all(&mut stmt, &mut rows).unwrap();

        assert_eq!(rows, vec![(1, long), (2, "short".to_string())]);
        let calls = calls.borrow();
        assert!(calls.contains(&Call::FetchColumn {
            column: 1,
            offset: DEFAULT_STRING_CAPACITY
        }));
        assert_eq!(
            calls.iter().filter(|c| matches!(c, Call::BindResult(2))).count(),
            2
        );
    }

    #[test]
    fn strings_around_buffer_capacity() {
        let lengths = [0, 19, 20, 21, 41, 1000, 5];
        let bodies: Vec<String> = lengths.iter().map(|&n| "z".repeat(n)).collect();
        let mut driver = MockDriver::query(0, 1);
        driver.script(bodies.iter().map(|body| Step::Row(vec![text(body)])));
        let calls = driver.calls();
        let mut stmt = PreparedStatement::new(driver, "SELECT body FROM notes");

        let mut rows: Vec<(String,)> = Vec::new();
        fetch_all(&mut stmt, &mut rows).unwrap();
        let expected: Vec<(String,)> = bodies.into_iter().map(|body| (body,)).collect();
        assert_eq!(rows, expected);

        // 21, 41 and 1000 each outgrow the buffer left by the previous row
        let refetches: Vec<usize> = calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::FetchColumn { offset, .. } => Some(*offset),
                _ => None,
            })
            .collect();
        assert_eq!(refetches, vec![DEFAULT_STRING_CAPACITY, 22, 42]);
    }

    #[test]
    fn arity_is_checked_before_driver_calls() {
        let driver = MockDriver::query(0, 3);
        let calls = driver.calls();
        let mut stmt = PreparedStatement::new(driver, "SELECT a, b, c FROM t");

        let mut rows: Vec<(i32, i32)> = Vec::new();
        let err = fetch_all(&mut stmt, &mut rows).unwrap_err();
        assert!(matches!(
            err,
            Error::ColumnCountMismatch {
                expected: 3,
                actual: 2
            }
        ));
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn null_columns() {
        let mut driver = MockDriver::query(0, 2);
        driver.script([Step::Row(vec![int(7), None])]);
        let mut stmt = PreparedStatement::new(driver, "SELECT id, nickname FROM users");

        let mut rows: Vec<(i32, Option<String>)> = Vec::new();
        fetch_all(&mut stmt, &mut rows).unwrap();
        assert_eq!(rows, vec![(7, None)]);
    }

    #[test]
    fn null_into_non_option_is_an_error() {
        let mut driver = MockDriver::query(0, 2);
        driver.script([Step::Row(vec![int(7), None])]);
        let mut stmt = PreparedStatement::new(driver, "SELECT id, nickname FROM users");

        let mut rows: Vec<(i32, String)> = Vec::new();
        let err = fetch_all(&mut stmt, &mut rows).unwrap_err();
        assert!(matches!(err, Error::UnexpectedNull { column: 1, .. }));
        assert!(rows.is_empty());
    }

    #[test]
    fn unknown_status_keeps_partial_results() {
        let mut driver = MockDriver::query(0, 1);
        driver.script([Step::Row(vec![int(1)]), Step::Row(vec![int(2)]), Step::Code(42)]);
        let mut stmt = PreparedStatement::new(driver, "SELECT id FROM t");

        let mut rows: Vec<(i32,)> = Vec::new();
        let err = fetch_all(&mut stmt, &mut rows).unwrap_err();
        assert!(matches!(err, Error::UnknownFetchStatus(42)));
        assert_eq!(rows, vec![(1,), (2,)]);
    }

    #[test]
    fn fetch_error_is_reported() {
        let mut driver = MockDriver::query(0, 1);
        driver.script([Step::Code(1)]);
        let mut stmt = PreparedStatement::new(driver, "SELECT id FROM t");

        let mut rows: Vec<(i32,)> = Vec::new();
        let err = fetch_all(&mut stmt, &mut rows).unwrap_err();
        assert!(matches!(err, Error::Driver(ref msg) if msg == "scripted fetch failure"));
    }

    #[test]
    fn lossy_row_without_oversized_column() {
        let mut driver = MockDriver::query(0, 1);
        driver.script([Step::LossyRow(vec![int(i32::MAX)])]);
        let calls = driver.calls();
        let mut stmt = PreparedStatement::new(driver, "SELECT big FROM t");

        let mut rows: Vec<(i32,)> = Vec::new();
        fetch_all(&mut stmt, &mut rows).unwrap();
        assert_eq!(rows, vec![(i32::MAX,)]);

        let calls = calls.borrow();
        assert!(!calls.iter().any(|c| matches!(c, Call::FetchColumn { .. })));
        assert_eq!(
            calls.iter().filter(|c| matches!(c, Call::BindResult(_))).count(),
            1
        );
    }
}
