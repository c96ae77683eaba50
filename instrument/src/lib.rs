//! Column-oriented capture of simulation tracing events.
//!
//! Every `tracing::info!` event becomes one row of the table named by its
//! `target`; columns appear as fields are first seen and are typed by the
//! first value recorded. A later value of another type widens the column
//! (integers to floats, anything else to text) instead of being dropped. Capture is scoped to the current thread, so
//! parallel tests never see each other's rows.
//!
//! ```ignore
//! let capture = instrument::RunCapture::start();
//! let history = ailab_core::run_simulation(&dataset, &sliders, &params, 10);
//! let years = capture.frame("year")?;
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use polars::prelude::*;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Record};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Id, Metadata, Subscriber};

// ============================================================================
// Tables
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    I64(Vec<i64>),
    U64(Vec<u64>),
    F64(Vec<f64>),
    Bool(Vec<bool>),
    Str(Vec<String>),
}

/// One recorded field value.
#[derive(Debug, Clone, PartialEq)]
enum Cell {
    I64(i64),
    U64(u64),
    F64(f64),
    Bool(bool),
    Str(String),
}

impl Cell {
    fn rendered(self) -> String {
        match self {
            Cell::I64(x) => x.to_string(),
            Cell::U64(x) => x.to_string(),
            Cell::F64(x) => x.to_string(),
            Cell::Bool(x) => x.to_string(),
            Cell::Str(x) => x,
        }
    }
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::I64(v) => v.len(),
            ColumnData::U64(v) => v.len(),
            ColumnData::F64(v) => v.len(),
            ColumnData::Bool(v) => v.len(),
            ColumnData::Str(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Empty column of `cell`'s type with `rows` default entries.
    fn filled_for(cell: &Cell, rows: usize) -> Self {
        match cell {
            Cell::I64(_) => ColumnData::I64(vec![0; rows]),
            Cell::U64(_) => ColumnData::U64(vec![0; rows]),
            Cell::F64(_) => ColumnData::F64(vec![f64::NAN; rows]),
            Cell::Bool(_) => ColumnData::Bool(vec![false; rows]),
            Cell::Str(_) => ColumnData::Str(vec![String::new(); rows]),
        }
    }

    fn push_default(&mut self) {
        match self {
            ColumnData::I64(v) => v.push(0),
            ColumnData::U64(v) => v.push(0),
            ColumnData::F64(v) => v.push(f64::NAN),
            ColumnData::Bool(v) => v.push(false),
            ColumnData::Str(v) => v.push(String::new()),
        }
    }

    /// Column able to hold both the current values and `cell`, when the
    /// current type cannot. Integers widen to floats; any other mismatch
    /// turns the column into text.
    fn widened_for(&self, cell: &Cell) -> Option<ColumnData> {
        match (self, cell) {
            (ColumnData::I64(v), Cell::F64(_)) => {
                Some(ColumnData::F64(v.iter().map(|&x| x as f64).collect()))
            }
            (ColumnData::U64(v), Cell::F64(_)) => {
                Some(ColumnData::F64(v.iter().map(|&x| x as f64).collect()))
            }
            (
                ColumnData::I64(_) | ColumnData::U64(_) | ColumnData::F64(_),
                Cell::I64(_) | Cell::U64(_) | Cell::F64(_),
            )
            | (ColumnData::Bool(_), Cell::Bool(_))
            | (ColumnData::Str(_), _) => None,
            (col, _) => Some(ColumnData::Str(col.rendered())),
        }
    }

    fn rendered(&self) -> Vec<String> {
        match self {
            ColumnData::I64(v) => v.iter().map(ToString::to_string).collect(),
            ColumnData::U64(v) => v.iter().map(ToString::to_string).collect(),
            ColumnData::F64(v) => v.iter().map(ToString::to_string).collect(),
            ColumnData::Bool(v) => v.iter().map(ToString::to_string).collect(),
            ColumnData::Str(v) => v.clone(),
        }
    }

    /// Append `cell`, widening the column first if its type cannot hold it.
    fn push(&mut self, cell: Cell) {
        if let Some(widened) = self.widened_for(&cell) {
            *self = widened;
        }
        match (self, cell) {
            (ColumnData::I64(v), Cell::I64(x)) => v.push(x),
            (ColumnData::I64(v), Cell::U64(x)) => v.push(x as i64),
            (ColumnData::U64(v), Cell::U64(x)) => v.push(x),
            (ColumnData::U64(v), Cell::I64(x)) => v.push(x.max(0) as u64),
            (ColumnData::F64(v), Cell::F64(x)) => v.push(x),
            (ColumnData::F64(v), Cell::I64(x)) => v.push(x as f64),
            (ColumnData::F64(v), Cell::U64(x)) => v.push(x as f64),
            (ColumnData::Bool(v), Cell::Bool(x)) => v.push(x),
            (ColumnData::Str(v), cell) => v.push(cell.rendered()),
            // Not reachable once widened
            (col, _) => col.push_default(),
        }
    }

    fn to_column(&self, name: &str) -> Column {
        match self {
            ColumnData::I64(v) => Column::new(name.into(), v),
            ColumnData::U64(v) => Column::new(name.into(), v),
            ColumnData::F64(v) => Column::new(name.into(), v),
            ColumnData::Bool(v) => Column::new(name.into(), v),
            ColumnData::Str(v) => Column::new(name.into(), v),
        }
    }
}

/// Rows recorded under one tracing target. All columns have `rows` entries;
/// a field missing from an event gets the column type's default (`NaN` for
/// floats).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: BTreeMap<String, ColumnData>,
    pub rows: usize,
}

impl Table {
    fn append(&mut self, row: Vec<(&'static str, Cell)>) {
        let rows = self.rows;
        for (name, cell) in row {
            let column = self
                .columns
                .entry(name.to_string())
                .or_insert_with(|| ColumnData::filled_for(&cell, rows));
            if column.len() == rows {
                column.push(cell);
            }
        }
        self.rows += 1;
        for column in self.columns.values_mut() {
            if column.len() < self.rows {
                column.push_default();
            }
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnData> {
        self.columns.get(name)
    }

    /// Float column by name, if present with that type.
    pub fn f64s(&self, name: &str) -> Option<&[f64]> {
        match self.columns.get(name)? {
            ColumnData::F64(v) => Some(v),
            _ => None,
        }
    }

    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let columns = self
            .columns
            .iter()
            .map(|(name, data)| data.to_column(name))
            .collect();
        DataFrame::new(columns)
    }
}

/// Tables keyed by tracing target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recorder {
    pub tables: BTreeMap<String, Table>,
}

impl Recorder {
    pub fn table(&self, target: &str) -> Option<&Table> {
        self.tables.get(target)
    }

    pub fn to_dataframes(&self) -> PolarsResult<BTreeMap<String, DataFrame>> {
        self.tables
            .iter()
            .map(|(name, table)| Ok((name.clone(), table.to_dataframe()?)))
            .collect()
    }
}

// ============================================================================
// Subscriber
// ============================================================================

#[derive(Default)]
struct RowVisitor {
    row: Vec<(&'static str, Cell)>,
}

impl Visit for RowVisitor {
    fn record_i64(&mut self, field: &Field, value: i64) {
        self.row.push((field.name(), Cell::I64(value)));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.row.push((field.name(), Cell::U64(value)));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.row.push((field.name(), Cell::F64(value)));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.row.push((field.name(), Cell::Bool(value)));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.row.push((field.name(), Cell::Str(value.to_string())));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.row.push((field.name(), Cell::Str(format!("{value:?}"))));
    }
}

/// Collects info-level events into a shared [`Recorder`]. Spans are ignored.
#[derive(Clone, Default)]
pub struct TableSubscriber {
    recorder: Arc<Mutex<Recorder>>,
}

impl TableSubscriber {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far.
    pub fn snapshot(&self) -> Recorder {
        self.recorder
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Take everything recorded so far, leaving the recorder empty.
    pub fn drain(&self) -> Recorder {
        std::mem::take(&mut *self.recorder.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Subscriber for TableSubscriber {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.is_event() && *metadata.level() <= tracing::Level::INFO
    }

    fn new_span(&self, _span: &Attributes<'_>) -> Id {
        Id::from_u64(1)
    }

    fn record(&self, _span: &Id, _values: &Record<'_>) {}

    fn record_follows_from(&self, _span: &Id, _follows: &Id) {}

    fn event(&self, event: &Event<'_>) {
        let mut visitor = RowVisitor::default();
        event.record(&mut visitor);
        let target = event.metadata().target();

        let mut recorder = self.recorder.lock().unwrap_or_else(PoisonError::into_inner);
        recorder
            .tables
            .entry(target.to_string())
            .or_default()
            .append(visitor.row);
    }

    fn enter(&self, _span: &Id) {}

    fn exit(&self, _span: &Id) {}
}

// ============================================================================
// RunCapture - RAII capture scope
// ============================================================================

/// Routes this thread's events into a fresh [`Recorder`] until dropped.
/// With [`RunCapture::persisting_to`], the frames are also written as
/// `{dir}/{target}.parquet` on drop.
pub struct RunCapture {
    subscriber: TableSubscriber,
    persist_dir: Option<PathBuf>,
    _guard: DefaultGuard,
}

impl RunCapture {
    pub fn start() -> Self {
        let subscriber = TableSubscriber::new();
        let guard = tracing::subscriber::set_default(subscriber.clone());
        Self {
            subscriber,
            persist_dir: None,
            _guard: guard,
        }
    }

    pub fn persisting_to(dir: impl Into<PathBuf>) -> Self {
        let mut capture = Self::start();
        capture.persist_dir = Some(dir.into());
        capture
    }

    pub fn recorder(&self) -> Recorder {
        self.subscriber.snapshot()
    }

    pub fn frames(&self) -> PolarsResult<BTreeMap<String, DataFrame>> {
        self.recorder().to_dataframes()
    }

    /// The frame for one target.
    pub fn frame(&self, target: &str) -> PolarsResult<DataFrame> {
        let recorder = self.subscriber.snapshot();
        match recorder.table(target) {
            Some(table) => table.to_dataframe(),
            None => Err(PolarsError::NoData(
                format!("no events recorded for target '{target}'").into(),
            )),
        }
    }

    pub fn persist_dir(&self) -> Option<&Path> {
        self.persist_dir.as_deref()
    }
}

impl Drop for RunCapture {
    fn drop(&mut self) {
        let Some(dir) = self.persist_dir.take() else {
            return;
        };
        let result = self
            .subscriber
            .drain()
            .to_dataframes()
            .and_then(|mut frames| save_parquet(&mut frames, &dir));
        if let Err(e) = result {
            eprintln!("RunCapture: failed to write {}: {e}", dir.display());
        }
    }
}

fn io_error(e: std::io::Error) -> PolarsError {
    PolarsError::IO {
        error: e.into(),
        msg: None,
    }
}

/// Write each frame as `{dir}/{name}.parquet`, creating `dir` if needed.
pub fn save_parquet(frames: &mut BTreeMap<String, DataFrame>, dir: &Path) -> PolarsResult<()> {
    std::fs::create_dir_all(dir).map_err(io_error)?;
    for (name, df) in frames.iter_mut() {
        let file = std::fs::File::create(dir.join(format!("{name}.parquet"))).map_err(io_error)?;
        ParquetWriter::new(file).finish(df)?;
    }
    Ok(())
}
