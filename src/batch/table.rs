use std::fmt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::BatchJob;
use crate::pipeline::Status;

/// Column holding the addresses to verify. Matched case-sensitively.
pub const EMAIL_COLUMN: &str = "email";
/// Column written back with each row's classification.
pub const STATUS_COLUMN: &str = "status";

/// Problems with the input file as a whole. Reported once, before any
/// address is verified.
#[derive(Debug, Error)]
pub enum BatchInputError {
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("CSV writer error: {0}")]
    Write(#[from] io::Error),
    #[error("missing required column 'email' (found: {})", found.join(", "))]
    MissingEmailColumn { found: Vec<String> },
    #[error("batch has {actual} results for {expected} rows")]
    RowCountMismatch { expected: usize, actual: usize },
}

/// Per-row state of the status column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RowStatus {
    #[default]
    Pending,
    Done(Status),
}

impl fmt::Display for RowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("Pending"),
            Self::Done(status) => fmt::Display::fmt(status, f),
        }
    }
}

/// An uploaded address list: the table as read plus a status per row.
///
/// Columns and cell values are kept as read. Short rows are accepted; their
/// missing `email` cell reads as an empty address. On export short rows are
/// padded to the header width, then an existing `status` column is
/// overwritten in place, otherwise one is appended.
#[derive(Debug, Clone)]
pub struct AddressTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    email_column: usize,
    status_column: Option<usize>,
    statuses: Vec<RowStatus>,
}

impl AddressTable {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, BatchInputError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| BatchInputError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, BatchInputError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let email_column = headers
            .iter()
            .position(|header| header == EMAIL_COLUMN)
            .ok_or_else(|| BatchInputError::MissingEmailColumn {
                found: headers.clone(),
            })?;
        let status_column = headers.iter().position(|header| header == STATUS_COLUMN);

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }
        let statuses = vec![RowStatus::Pending; rows.len()];
        tracing::debug!(rows = rows.len(), "address table loaded");

        Ok(Self {
            headers,
            rows,
            email_column,
            status_column,
            statuses,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// The `email` cell of every row, in row order.
    pub fn addresses(&self) -> Vec<&str> {
        self.rows
            .iter()
            .map(|row| row.get(self.email_column).map_or("", String::as_str))
            .collect()
    }

    pub fn statuses(&self) -> &[RowStatus] {
        &self.statuses
    }

    /// Writes each entry's status onto the row at the same position.
    pub fn apply(&mut self, job: &BatchJob) -> Result<(), BatchInputError> {
        if job.len() != self.rows.len() {
            return Err(BatchInputError::RowCountMismatch {
                expected: self.rows.len(),
                actual: job.len(),
            });
        }
        for (slot, entry) in self.statuses.iter_mut().zip(&job.entries) {
            *slot = RowStatus::Done(entry.status);
        }
        Ok(())
    }

    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), BatchInputError> {
        let mut writer = csv::Writer::from_writer(writer);

        let mut headers = self.headers.clone();
        if self.status_column.is_none() {
            headers.push(STATUS_COLUMN.to_string());
        }
        writer.write_record(&headers)?;

        for (row, status) in self.rows.iter().zip(&self.statuses) {
            let mut record = row.clone();
            if record.len() < self.headers.len() {
                record.resize(self.headers.len(), String::new());
            }
            let status = status.to_string();
            match self.status_column {
                Some(column) => {
                    if let Some(cell) = record.get_mut(column) {
                        *cell = status;
                    }
                }
                None => record.push(status),
            }
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn to_csv_bytes(&self) -> Result<Vec<u8>, BatchInputError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(buffer)
    }
}
