use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use csv::{Terminator, Writer, WriterBuilder};

use crate::{CpuVendor, EnergySample, csv_header};

/// Where a RAPL probe writes its samples, in addition to keeping them in memory.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum SampleDestination {
    /// `<Vendor>_<power unit register value>.csv` in the working directory.
    #[default]
    DefaultFile,

    /// The given file.
    File(PathBuf),

    /// Samples are only kept in memory.
    MemoryOnly,
}

impl SampleDestination {
    /// The file that samples will be appended to, if any.
    pub(crate) fn resolve(&self, vendor: CpuVendor, power_unit_raw: u64) -> Option<PathBuf> {
        match self {
            Self::DefaultFile => Some(PathBuf::from(format!("{vendor}_{power_unit_raw}.csv"))),
            Self::File(path) => Some(path.clone()),
            Self::MemoryOnly => None,
        }
    }
}

/// An append-only CSV file of energy samples.
///
/// Rows from earlier processes are preserved. The header is only written when the file is
/// empty, so that a series of benchmark runs accumulates into one table.
///
/// Every row must have the columns of the header, one start and one end counter per domain of
/// the vendor.
#[derive(Debug)]
pub(crate) struct SampleFile {
    path: PathBuf,
    writer: Writer<File>,
}

impl SampleFile {
    pub(crate) fn open(path: PathBuf, vendor: CpuVendor) -> io::Result<Self> {
        let file = OpenOptions::new().append(true).create(true).open(&path)?;
        let is_empty = file.metadata()?.len() == 0;

        let mut writer = WriterBuilder::new()
            .terminator(Terminator::Any(b'\n'))
            .from_writer(file);

        if is_empty {
            writer.write_record(csv_header(vendor))?;
            writer.flush()?;
        }

        Ok(Self { path, writer })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one row and flushes it, so that a crash later in the run loses nothing.
    pub(crate) fn append(&mut self, sample: &EnergySample) -> io::Result<()> {
        self.writer.write_record(sample.csv_record())?;
        self.writer.flush()
    }
}
