use anyhow::Context;
use chrono::{Days, Local, NaiveDate};
use news_keyword_core::LogConfig;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::{fmt, prelude::*, registry::Registry, EnvFilter, Layer};

/// Appends to `<prefix>.<YYYYMMDD>.log`, switching files at local midnight and
/// deleting files older than the retention window when it switches.
pub struct DailyFileWriter {
    directory: PathBuf,
    prefix: String,
    retention_days: u32,
    current: Option<(NaiveDate, File)>,
}

impl DailyFileWriter {
    pub fn new(directory: &Path, prefix: &str, retention_days: u32) -> io::Result<Self> {
        fs::create_dir_all(directory)?;
        Ok(Self {
            directory: directory.to_path_buf(),
            prefix: prefix.to_string(),
            retention_days,
            current: None,
        })
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.directory
            .join(format!("{}.{}.log", self.prefix, date.format("%Y%m%d")))
    }

    fn file_for(&mut self, date: NaiveDate) -> io::Result<&mut File> {
        let stale = self.current.as_ref().map_or(true, |(open, _)| *open != date);
        if stale {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(self.path_for(date))?;
            self.current = Some((date, file));
            self.prune(date)?;
        }

        match self.current.as_mut() {
            Some((_, file)) => Ok(file),
            None => Err(io::Error::new(io::ErrorKind::Other, "log file not open")),
        }
    }

    pub fn write_dated(&mut self, date: NaiveDate, buf: &[u8]) -> io::Result<usize> {
        self.file_for(date)?.write(buf)
    }

    /// Removes this writer's files dated before `today - retention_days`.
    pub fn prune(&self, today: NaiveDate) -> io::Result<usize> {
        let Some(cutoff) = today.checked_sub_days(Days::new(u64::from(self.retention_days))) else {
            return Ok(0);
        };

        let mut removed = 0;
        for entry in fs::read_dir(&self.directory)? {
            let path = entry?.path();
            let dated = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(|name| self.date_of(name));

            if dated.is_some_and(|date| date < cutoff) {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn date_of(&self, file_name: &str) -> Option<NaiveDate> {
        let stamp = file_name
            .strip_prefix(self.prefix.as_str())?
            .strip_prefix('.')?
            .strip_suffix(".log")?;
        NaiveDate::parse_from_str(stamp, "%Y%m%d").ok()
    }
}

impl Write for DailyFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_dated(Local::now().date_naive(), buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.current.as_mut() {
            Some((_, file)) => file.flush(),
            None => Ok(()),
        }
    }
}

/// Builds the run's subscriber from `config` and makes it the default for the
/// calling thread until the returned guard drops.
pub fn install(config: &LogConfig) -> anyhow::Result<DefaultGuard> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .with_context(|| format!("invalid log level {:?}", config.level))?;

    let output: Box<dyn Layer<Registry> + Send + Sync> = match &config.directory {
        Some(directory) => {
            let writer = DailyFileWriter::new(directory, &config.file_prefix, config.retention_days)
                .with_context(|| format!("cannot open log directory {}", directory.display()))?;
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(writer))
                .boxed()
        }
        None => fmt::layer().with_writer(io::stderr).boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(output).with(filter);
    Ok(tracing::subscriber::set_default(subscriber))
}
