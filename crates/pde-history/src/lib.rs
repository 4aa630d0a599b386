//! Records named scalar values per solver step, and logs them to a
//! tab-separated file on rank 0.

use pde_comm::Comm;
use pde_table::{Buffer, Table, TableError};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

const BUFFER_BLOCK_SIZE: usize = 32;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history table error: {0}")]
    Table(#[from] TableError),
    #[error("I/O error writing {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },
}

fn io_err(path: &Path, source: std::io::Error) -> HistoryError {
    HistoryError::Io { path: path.display().to_string(), source }
}

/// One named scalar (or vector-expanded `name[i]`) series, recorded once per
/// [`History::save_entry`].
pub struct History {
    variables: Vec<String>,
    var_index: HashMap<String, usize>,
    staged: HashMap<String, f64>,
    table: Table<f64>,
    buffer: Option<Buffer<f64>>,
    needs_resize: bool,
    pub logging: bool,
    file_path: PathBuf,
    file: Option<File>,
}

impl History {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            variables: Vec::new(),
            var_index: HashMap::new(),
            staged: HashMap::new(),
            table: Table::new(),
            buffer: None,
            needs_resize: false,
            logging: true,
            file_path: file_path.into(),
            file: None,
        }
    }

    fn declare(&mut self, name: &str) {
        if !self.var_index.contains_key(name) {
            self.var_index.insert(name.to_string(), self.variables.len());
            self.variables.push(name.to_string());
            self.needs_resize = true;
        }
    }

    /// Stages a scalar value for the current (not-yet-saved) entry.
    /// Registering a new name resizes the table lazily on the next
    /// [`save_entry`](Self::save_entry).
    pub fn set(&mut self, name: &str, value: f64) {
        self.declare(name);
        self.staged.insert(name.to_string(), value);
    }

    /// Expands to `name[0], name[1], ...`.
    pub fn set_vector(&mut self, name: &str, values: &[f64]) {
        for (i, &v) in values.iter().enumerate() {
            self.set(&format!("{name}[{i}]"), v);
        }
    }

    /// Grows the table to fit newly-declared variables, padding existing
    /// rows with zero in the new columns. Returns whether a resize happened.
    fn resize_if_necessary(&mut self) -> Result<bool, HistoryError> {
        if !self.needs_resize {
            return Ok(false);
        }
        if let Some(buffer) = self.buffer.take() {
            let mut buffer = buffer;
            buffer.flush(&mut self.table)?;
        }

        let new_width = self.variables.len();
        let old_size = self.table.size();
        let mut new_table = Table::with_row_size(new_width);
        new_table.resize(old_size);
        for row in 0..old_size {
            let old_row = self.table.get_row(row)?.to_vec();
            let mut padded = vec![0.0; new_width];
            padded[..old_row.len()].copy_from_slice(&old_row);
            new_table.set_row(row, &padded)?;
        }
        self.table = new_table;
        self.buffer = Some(self.table.create_buffer(BUFFER_BLOCK_SIZE));
        self.needs_resize = false;
        Ok(true)
    }

    /// Materializes any buffered rows into the table.
    pub fn flush(&mut self) -> Result<(), HistoryError> {
        if let Some(buffer) = self.buffer.as_mut() {
            buffer.flush(&mut self.table)?;
        }
        Ok(())
    }

    /// Commits one row built from the currently staged values (missing
    /// values default to zero), and logs it on rank 0 if logging is on.
    pub fn save_entry(&mut self, comm: &dyn Comm) -> Result<(), HistoryError> {
        let resized = self.resize_if_necessary()?;
        let row: Vec<f64> = self.variables.iter().map(|name| *self.staged.get(name).unwrap_or(&0.0)).collect();
        self.buffer.as_mut().expect("resize_if_necessary always leaves a buffer").add_row(&row)?;

        if self.logging && comm.rank() == 0 {
            if resized {
                self.file = None;
            }
            if self.file.is_none() {
                self.flush()?;
                self.open_file()?;
                self.write_full_table()?;
            } else {
                self.append_entry_line(&row)?;
            }
        }
        Ok(())
    }

    fn open_file(&mut self) -> Result<(), HistoryError> {
        tracing::debug!(path = %self.file_path.display(), nb_variables = self.variables.len(), "opening history file");
        let file = File::create(&self.file_path).map_err(|e| io_err(&self.file_path, e))?;
        self.file = Some(file);
        Ok(())
    }

    fn header_line(&self) -> String {
        let mut line = String::from("#");
        for name in &self.variables {
            line.push_str(&format!("\t{name:>16}"));
        }
        line.push('\n');
        line
    }

    fn row_line(row: &[f64]) -> String {
        let mut line = String::new();
        for v in row {
            line.push_str(&format!("\t{v:>16.9e}"));
        }
        line.push('\n');
        line
    }

    fn write_full_table(&mut self) -> Result<(), HistoryError> {
        self.flush()?;
        let header = self.header_line();
        let rows: Vec<String> = self.table.rows().map(Self::row_line).collect();
        let file = self.file.as_mut().expect("open_file called just before this");
        file.write_all(header.as_bytes()).map_err(|e| io_err(&self.file_path, e))?;
        for row in rows {
            file.write_all(row.as_bytes()).map_err(|e| io_err(&self.file_path, e))?;
        }
        file.flush().map_err(|e| io_err(&self.file_path, e))?;
        Ok(())
    }

    fn append_entry_line(&mut self, row: &[f64]) -> Result<(), HistoryError> {
        let line = Self::row_line(row);
        let file = self.file.as_mut().expect("file is open in this branch");
        file.write_all(line.as_bytes()).map_err(|e| io_err(&self.file_path, e))?;
        file.flush().map_err(|e| io_err(&self.file_path, e))?;
        Ok(())
    }

    /// Writes the current table to `file_uri` on rank 0, independent of the
    /// logging file.
    pub fn write_to(&mut self, path: impl AsRef<Path>, comm: &dyn Comm) -> Result<(), HistoryError> {
        if comm.rank() != 0 {
            return Ok(());
        }
        self.flush()?;
        let path = path.as_ref();
        let mut file = OpenOptions::new().write(true).create(true).truncate(true).open(path).map_err(|e| io_err(path, e))?;
        file.write_all(self.header_line().as_bytes()).map_err(|e| io_err(path, e))?;
        for row in self.table.rows() {
            file.write_all(Self::row_line(row).as_bytes()).map_err(|e| io_err(path, e))?;
        }
        Ok(())
    }
}
