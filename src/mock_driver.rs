//! Scripted [`StmtDriver`] for unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::bind::{BindType, InputBind, OutputBind};
use crate::driver::{FetchStatus, StmtDriver};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    BindParam(Vec<(BindType, bool, Vec<u8>)>),
    Execute,
    BindResult(usize),
    Fetch,
    FetchColumn { column: usize, offset: usize },
    FreeResult,
    Close,
}

/// One fetch outcome; column values are native-endian bytes, `None` for NULL
pub enum Step {
    Row(Vec<Option<Vec<u8>>>),
    /// A row that reports truncation even though every column fits
    LossyRow(Vec<Option<Vec<u8>>>),
    /// A raw fetch status code
    Code(i32),
}

pub fn int(v: i32) -> Option<Vec<u8>> {
    Some(v.to_ne_bytes().to_vec())
}

pub fn text(s: &str) -> Option<Vec<u8>> {
    Some(s.as_bytes().to_vec())
}

pub struct MockDriver {
    param_count: usize,
    field_count: usize,
    affected_rows: u64,
    steps: VecDeque<Step>,
    current: Vec<Option<Vec<u8>>>,
    fail_execute: Option<Error>,
    fail_free: Option<String>,
    fail_close: Option<String>,
    calls: Rc<RefCell<Vec<Call>>>,
}

impl MockDriver {
    pub fn command(param_count: usize, affected_rows: u64) -> Self {
        Self {
            param_count,
            field_count: 0,
            affected_rows,
            steps: VecDeque::new(),
            current: Vec::new(),
            fail_execute: None,
            fail_free: None,
            fail_close: None,
            calls: Rc::default(),
        }
    }

    pub fn query(param_count: usize, field_count: usize) -> Self {
        Self {
            field_count,
            ..Self::command(param_count, 0)
        }
    }

    pub fn script(&mut self, steps: impl IntoIterator<Item = Step>) {
        self.steps.extend(steps);
    }

    pub fn fail_execute(&mut self, error: Error) {
        self.fail_execute = Some(error);
    }

    pub fn fail_free(&mut self, message: &str) {
        self.fail_free = Some(message.to_string());
    }

    pub fn fail_close(&mut self, message: &str) {
        self.fail_close = Some(message.to_string());
    }

    /// Shared call log that outlives the statement owning the driver
    pub fn calls(&self) -> Rc<RefCell<Vec<Call>>> {
        Rc::clone(&self.calls)
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn write_column(bind: &mut OutputBind, value: Option<&Vec<u8>>, offset: usize) -> bool {
        let Some(bytes) = value else {
            bind.is_null = true;
            bind.length = 0;
            return false;
        };
        bind.is_null = false;
        bind.length = bytes.len();
        let tail = bytes.get(offset..).unwrap_or_default();
        let window = bind.window_mut();
        let n = tail.len().min(window.len());
        window[..n].copy_from_slice(&tail[..n]);
        bytes.len() > bind.capacity()
    }
}

impl StmtDriver for MockDriver {
    fn param_count(&self) -> usize {
        self.param_count
    }

    fn field_count(&self) -> usize {
        self.field_count
    }

    fn bind_param(&mut self, binds: &[InputBind<'_>]) -> Result<()> {
        self.record(Call::BindParam(
            binds
                .iter()
                .map(|b| (b.bind_type, b.is_unsigned, b.buffer.to_vec()))
                .collect(),
        ));
        Ok(())
    }

    fn execute(&mut self) -> Result<()> {
        self.record(Call::Execute);
        match self.fail_execute.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn affected_rows(&self) -> u64 {
        self.affected_rows
    }

    fn bind_result(&mut self, binds: &[OutputBind]) -> Result<()> {
        self.record(Call::BindResult(binds.len()));
        Ok(())
    }

    fn fetch(&mut self, binds: &mut [OutputBind]) -> FetchStatus {
        self.record(Call::Fetch);
        let (row, lossy) = match self.steps.pop_front() {
            None => return FetchStatus::NoData,
            Some(Step::Code(code)) => {
                return FetchStatus::from_code(code, || "scripted fetch failure".to_string());
            }
            Some(Step::Row(row)) => (row, false),
            Some(Step::LossyRow(row)) => (row, true),
        };

        let mut truncated = lossy;
        for (bind, value) in binds.iter_mut().zip(&row) {
            truncated |= Self::write_column(bind, value.as_ref(), 0);
        }
        self.current = row;
        if truncated {
            FetchStatus::Truncated
        } else {
            FetchStatus::Row
        }
    }

    fn fetch_column(&mut self, bind: &mut OutputBind, column: usize, offset: usize) -> Result<()> {
        self.record(Call::FetchColumn { column, offset });
        let value = self.current.get(column).ok_or(Error::InvalidPacket)?;
        Self::write_column(bind, value.as_ref(), offset);
        Ok(())
    }

    fn free_result(&mut self) -> Result<()> {
        self.record(Call::FreeResult);
        match self.fail_free.take() {
            Some(message) => Err(Error::Driver(message)),
            None => Ok(()),
        }
    }

    fn close(&mut self) -> Result<()> {
        self.record(Call::Close);
        match self.fail_close.take() {
            Some(message) => Err(Error::Driver(message)),
            None => Ok(()),
        }
    }
}
