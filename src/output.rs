use std::io::Write;

use anyhow::anyhow;
use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::schema::{RaceMeta, RunnerRecord};

pub const HEADER: [&str; 23] = [
    "date", "course", "time", "race_name", "class", "band", "distance", "going", "pos", "draw",
    "btn", "name", "sp", "age", "weight", "gear", "jockey", "trainer", "or", "ts", "rpr", "prize",
    "comment",
];

pub fn row<'a>(meta: &'a RaceMeta, runner: &'a RunnerRecord) -> [&'a str; 23] {
    [
        meta.date(),
        meta.course(),
        meta.time(),
        meta.title(),
        meta.class(),
        meta.band(),
        meta.distance(),
        meta.going(),
        runner.position(),
        runner.draw(),
        runner.beaten(),
        runner.name(),
        runner.starting_price(),
        runner.age(),
        runner.weight(),
        runner.headgear(),
        // Follows HEADER, not the field order of RunnerRecord.
        runner.jockey(),
        runner.trainer(),
        runner.official_rating(),
        runner.speed_figure(),
        runner.rating_figure(),
        runner.prize(),
        runner.comment(),
    ]
}

/// Comma-joined rows with no quoting. Free-text fields have their commas
/// removed during extraction, so nothing here escapes.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvSink<W> {
    /// Writes the header right away.
    pub fn new(inner: W) -> csv::Result<Self> {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .quote_style(QuoteStyle::Never)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(inner);
        writer.write_record(HEADER)?;
        Ok(Self { writer })
    }

    pub fn write(&mut self, meta: &RaceMeta, runner: &RunnerRecord) -> csv::Result<()> {
        self.writer.write_record(row(meta, runner))
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }

    pub fn into_inner(self) -> anyhow::Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| anyhow!("Failed to flush CSV output: {}", e.error()))
    }
}
