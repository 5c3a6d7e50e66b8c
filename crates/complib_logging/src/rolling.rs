//! Size-bounded log file with numbered generations.
//!
//! `complib.log` is the live file; `complib.log.1` is the most recent
//! full one and so on up to `keep - 1`.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing_subscriber::fmt::MakeWriter;

struct Generations {
    dir: PathBuf,
    stem: String,
    keep: usize,
}

impl Generations {
    fn live(&self) -> PathBuf {
        self.dir.join(format!("{}.log", self.stem))
    }

    fn numbered(&self, n: usize) -> PathBuf {
        self.dir.join(format!("{}.log.{}", self.stem, n))
    }

    /// Move every generation up by one and drop the oldest. With `keep == 1`
    /// the live file is simply discarded.
    fn shift(&self) -> io::Result<()> {
        if self.keep <= 1 {
            return remove_if_present(&self.live());
        }
        remove_if_present(&self.numbered(self.keep - 1))?;
        for n in (1..self.keep - 1).rev() {
            rename_if_present(&self.numbered(n), &self.numbered(n + 1))?;
        }
        rename_if_present(&self.live(), &self.numbered(1))
    }
}

fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

fn rename_if_present(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

fn open_for_append(path: &Path) -> io::Result<(File, u64)> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let len = file.metadata()?.len();
    Ok((file, len))
}

/// Replace anything outside `[A-Za-z0-9_-]` so the name is a safe file stem.
pub(crate) fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => c,
            _ => '_',
        })
        .collect()
}

pub(crate) struct RollingFile {
    generations: Generations,
    limit: u64,
    // closed only for the duration of a roll
    file: Option<File>,
    written: u64,
}

impl RollingFile {
    pub(crate) fn open(dir: PathBuf, name: &str, keep: usize, limit: u64) -> io::Result<Self> {
        fs::create_dir_all(&dir)?;
        let generations = Generations {
            dir,
            stem: file_stem(name),
            keep: keep.max(1),
        };
        let (file, written) = open_for_append(&generations.live())?;
        let mut rolling = Self {
            generations,
            limit,
            file: Some(file),
            written,
        };
        if rolling.written > rolling.limit {
            rolling.roll()?;
        }
        Ok(rolling)
    }

    fn roll(&mut self) -> io::Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush()?;
        }
        self.generations.shift()?;
        let (file, written) = open_for_append(&self.generations.live())?;
        self.file = Some(file);
        self.written = written;
        Ok(())
    }
}

impl Write for RollingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // a single oversized record still lands in a fresh file
        if self.written > 0 && self.written + buf.len() as u64 > self.limit {
            self.roll()?;
        }
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "log file is closed"))?;
        let n = file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

/// [`RollingFile`] shared by every fmt layer event.
pub(crate) struct SharedLog(Mutex<RollingFile>);

impl SharedLog {
    pub(crate) fn new(file: RollingFile) -> Self {
        Self(Mutex::new(file))
    }
}

pub(crate) struct SharedLogWriter<'a>(&'a Mutex<RollingFile>);

impl<'a> MakeWriter<'a> for SharedLog {
    type Writer = SharedLogWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        SharedLogWriter(&self.0)
    }
}

impl Write for SharedLogWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).flush()
    }
}
