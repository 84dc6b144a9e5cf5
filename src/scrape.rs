use std::{
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;
use fs_err::File;
use log::info;
use reqwest::StatusCode;
use scraper::Html;

use crate::{
    api::{Fetched, PageSource, RacingPostClient},
    config::Config,
    extract::extract,
    index::RaceIndexFetcher,
    output::CsvSink,
    schema::{CourseName, RaceCode, RaceLocation, TrackCode},
};

/// Outcome of fetching one result page.
#[derive(Debug)]
pub enum PageFetch {
    Fetched(String),
    Unavailable(Option<StatusCode>),
}

/// Only a success status yields a page body.
pub fn page_outcome(response: Option<Fetched>) -> PageFetch {
    match response {
        Some(fetched) if fetched.status.is_success() => PageFetch::Fetched(fetched.body),
        Some(fetched) => PageFetch::Unavailable(Some(fetched.status)),
        None => PageFetch::Unavailable(None),
    }
}

pub async fn fetch_page<S: PageSource>(source: &S, url: &str) -> PageFetch {
    page_outcome(source.get_page(url).await)
}

/// Extracts one page and appends its rows. Returns the number of rows written.
pub fn write_race<W: Write>(
    page: PageFetch,
    location: &RaceLocation,
    sink: &mut CsvSink<W>,
) -> anyhow::Result<usize> {
    let body = match page {
        PageFetch::Fetched(body) => body,
        PageFetch::Unavailable(status) => {
            let reason = status.map_or("no response".to_owned(), |status| status.to_string());
            println!(
                "Skipping race {} at {} on {}: {reason}",
                location.race_instance_uid(),
                location.name(),
                location.date()
            );
            return Ok(0);
        }
    };
    let html = Html::parse_document(&body);
    let (meta, runners) = extract(&html, location);
    for runner in &runners {
        sink.write(&meta, runner)?;
    }
    Ok(runners.len())
}

#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct ScrapeSummary {
    pub races: usize,
    pub skipped: usize,
    pub rows: usize,
}

/// Drains `fetcher`, one page at a time, into `sink`.
pub async fn scrape_races<S: PageSource, W: Write>(
    source: &S,
    results_base: &str,
    mut fetcher: RaceIndexFetcher<'_, S>,
    sink: &mut CsvSink<W>,
) -> anyhow::Result<ScrapeSummary> {
    let mut summary = ScrapeSummary::default();
    while let Some(location) = fetcher.next_location().await {
        let url = location.url(results_base);
        let page = fetch_page(source, &url).await;
        if matches!(page, PageFetch::Unavailable(_)) {
            summary.skipped += 1;
        }
        let rows = write_race(page, &location, sink)?;
        info!("{url}: {rows} runners");
        summary.races += 1;
        summary.rows += rows;
    }
    sink.flush()?;
    Ok(summary)
}

/// `{data_dir}/{target}-{years}.csv`, with `target` lower-cased.
pub fn output_path(data_dir: &Path, target: &str, years: &str) -> PathBuf {
    data_dir.join(format!("{}-{years}.csv", target.to_lowercase()))
}

/// Scrapes every (track, year) into one CSV file and returns its path.
pub async fn run(
    config: &Config,
    tracks: &[(TrackCode, CourseName)],
    years: &[i32],
    code: RaceCode,
    target: &str,
    years_arg: &str,
) -> anyhow::Result<(PathBuf, ScrapeSummary)> {
    fs_err::create_dir_all(&config.data_dir)?;
    let path = output_path(&config.data_dir, target, years_arg);
    let file = BufWriter::new(File::create(&path)?);
    let mut sink = CsvSink::new(file).context("Failed to write CSV header")?;

    let client = RacingPostClient::new(config)?;
    let fetcher = RaceIndexFetcher::new(&client, &config.index_base, tracks, years, code);
    let summary = scrape_races(&client, &config.results_base, fetcher, &mut sink).await?;
    sink.into_inner()?;
    Ok((path, summary))
}
