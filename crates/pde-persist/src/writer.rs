use crate::error::PersistError;
use crate::manifest::{write_manifest, BlockInfo, RankManifest};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use pde_comm::Comm;
use std::fs::File;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};

const BLOCK_TAG: &[u8; 14] = b"__CFDATA_BEGIN";
const FORMAT_VERSION: u64 = 1;

fn rank_filename(basename: &Path, rank: usize) -> PathBuf {
    let dir = basename.parent().unwrap_or_else(|| Path::new(""));
    let stem = basename.file_name().and_then(|s| s.to_str()).unwrap_or("out");
    dir.join(format!("{stem}_P{rank}.cfbin"))
}

fn io_err(path: &Path, source: std::io::Error) -> PersistError {
    PersistError::Io { path: path.display().to_string(), source }
}

/// Writes this rank's binary data blocks to `<basename>_P<rank>.cfbin`, and
/// (collectively, on close) rank 0's `<basename>.cfbinxml` manifest
/// describing every rank's blocks.
pub struct BinaryDataWriter {
    basename: PathBuf,
    path: PathBuf,
    out_file: File,
    index: u32,
    total_count: u64,
    /// Only populated on rank 0: one entry per rank, in write order.
    rank_blocks: Vec<Vec<BlockInfo>>,
    closed: bool,
}

impl BinaryDataWriter {
    pub fn create(basename: impl Into<PathBuf>, comm: &dyn Comm) -> Result<Self, PersistError> {
        let basename = basename.into();
        let path = rank_filename(&basename, comm.rank());
        let mut out_file = File::create(&path).map_err(|e| io_err(&path, e))?;
        out_file.write_all(&FORMAT_VERSION.to_le_bytes()).map_err(|e| io_err(&path, e))?;

        let rank_blocks = if comm.rank() == 0 { vec![Vec::new(); comm.size()] } else { Vec::new() };

        Ok(Self { basename, path, out_file, index: 0, total_count: 0, rank_blocks, closed: false })
    }

    /// Writes one data block: a fixed tag, then (if `data` is non-empty) a
    /// zlib-compressed copy of `data`. Returns the block's index, which is
    /// the same on every rank (the write is collective).
    pub fn write_data_block(
        &mut self,
        data: &[u8],
        list_name: &str,
        nb_rows: u64,
        nb_cols: u64,
        type_name: &str,
        comm: &dyn Comm,
    ) -> Result<u32, PersistError> {
        self.out_file.write_all(BLOCK_TAG).map_err(|e| io_err(&self.path, e))?;

        let block_begin = self.out_file.stream_position().map_err(|e| io_err(&self.path, e))?;
        if !data.is_empty() {
            let mut encoder = ZlibEncoder::new(&mut self.out_file, Compression::default());
            encoder.write_all(data).map_err(|e| io_err(&self.path, e))?;
            encoder.finish().map_err(|e| io_err(&self.path, e))?;
        }
        let block_end = self.out_file.stream_position().map_err(|e| io_err(&self.path, e))?;

        let my_info = [nb_rows, nb_cols, block_begin, block_end];
        if let Some(gathered) = comm.gather_u64(&my_info, 0) {
            for (rank, chunk) in gathered.chunks_exact(4).enumerate() {
                self.rank_blocks[rank].push(BlockInfo {
                    name: list_name.to_string(),
                    index: self.index,
                    type_name: type_name.to_string(),
                    nb_rows: chunk[0],
                    nb_cols: chunk[1],
                    begin: chunk[2],
                    end: chunk[3],
                });
            }
        }

        self.total_count += data.len() as u64;
        let written = self.index;
        self.index += 1;
        Ok(written)
    }

    /// Finalizes the file, and on rank 0 writes the XML manifest. Collective:
    /// every rank must call this.
    pub fn close(&mut self, comm: &dyn Comm) -> Result<(), PersistError> {
        if self.closed {
            return Err(PersistError::AlreadyClosed);
        }
        self.closed = true;
        self.log_compression_ratio();
        self.out_file.flush().map_err(|e| io_err(&self.path, e))?;

        if comm.rank() == 0 {
            let manifest_path = self.basename.with_extension("cfbinxml");
            let ranks: Vec<RankManifest> = (0..comm.size())
                .map(|rank| RankManifest {
                    filename: rank_filename(&self.basename, rank).display().to_string(),
                    rank,
                    blocks: self.rank_blocks[rank].clone(),
                })
                .collect();
            write_manifest(&manifest_path, FORMAT_VERSION, &ranks)?;
        }
        comm.barrier();
        Ok(())
    }

    fn log_compression_ratio(&mut self) {
        if self.total_count == 0 {
            return;
        }
        let written = self.out_file.stream_position().unwrap_or(0);
        let ratio = written as f64 / self.total_count as f64 * 100.0;
        tracing::debug!(written, uncompressed = self.total_count, ratio_pct = ratio, "binary data writer closing");
    }
}

impl Drop for BinaryDataWriter {
    fn drop(&mut self) {
        if !self.closed {
            self.log_compression_ratio();
        }
    }
}
