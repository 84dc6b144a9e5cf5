//! Enumeration of result-page locations from the per-course race index.

use std::collections::VecDeque;

use chrono::NaiveDate;
use log::debug;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_with::{serde_as, DisplayFromStr, PickFirst};
use thiserror::Error;

use crate::{
    api::{Fetched, PageSource},
    schema::{CourseName, RaceCode, RaceInstanceUid, RaceLocation, TrackCode},
};

/// One (track, year) request against the index endpoint.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct IndexTarget {
    pub track: TrackCode,
    pub name: CourseName,
    pub year: i32,
    pub code: RaceCode,
}

impl IndexTarget {
    pub fn url(&self, index_base: &str) -> String {
        format!(
            "{}/{}/{}/{}/all-races",
            index_base.trim_end_matches('/'),
            self.track,
            self.year,
            self.code,
        )
    }
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Unable to access races from {name} in {year}")]
    Unavailable {
        name: CourseName,
        year: i32,
        status: Option<StatusCode>,
    },
    #[error("No {code} race data for {name} in {year}.")]
    NoData {
        name: CourseName,
        year: i32,
        code: RaceCode,
    },
    #[error("Malformed race index for {name} in {year}: {source}")]
    Malformed {
        name: CourseName,
        year: i32,
        source: serde_json::Error,
    },
    #[error("Unexpected race date {value:?} for {name} in {year}: {source}")]
    InvalidDate {
        name: CourseName,
        year: i32,
        value: String,
        source: chrono::ParseError,
    },
}

impl IndexError {
    /// Whether the user is told about the skip. Decoding problems are only logged.
    pub fn is_notice(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::NoData { .. })
    }
}

#[derive(Debug, Deserialize)]
struct IndexResponse {
    data: IndexData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexData {
    #[serde(default)]
    principle_race_results: Option<Vec<IndexEntry>>,
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexEntry {
    race_datetime: String,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    race_instance_uid: u64,
}

/// Turns one index response into the locations it lists, in response order.
pub fn parse_index(
    status: StatusCode,
    body: &str,
    target: &IndexTarget,
) -> Result<Vec<RaceLocation>, IndexError> {
    if !status.is_success() {
        return Err(IndexError::Unavailable {
            name: target.name.clone(),
            year: target.year,
            status: Some(status),
        });
    }
    let response: IndexResponse =
        serde_json::from_str(body).map_err(|source| IndexError::Malformed {
            name: target.name.clone(),
            year: target.year,
            source,
        })?;
    let Some(entries) = response.data.principle_race_results else {
        return Err(IndexError::NoData {
            name: target.name.clone(),
            year: target.year,
            code: target.code,
        });
    };
    entries
        .into_iter()
        .map(|entry| {
            let date: String = entry.race_datetime.chars().take(10).collect();
            let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|source| {
                IndexError::InvalidDate {
                    name: target.name.clone(),
                    year: target.year,
                    value: entry.race_datetime.clone(),
                    source,
                }
            })?;
            Ok(RaceLocation::builder()
                .track(target.track.clone())
                .name(target.name.clone())
                .date(date)
                .race_instance_uid(RaceInstanceUid::from(entry.race_instance_uid))
                .build())
        })
        .collect()
}

/// Maps the answer to one index request onto its locations or the reason it
/// was skipped. `None` means no response arrived at all.
pub fn index_outcome(
    response: Option<Fetched>,
    target: &IndexTarget,
) -> Result<Vec<RaceLocation>, IndexError> {
    match response {
        Some(fetched) => parse_index(fetched.status, &fetched.body, target),
        None => Err(IndexError::Unavailable {
            name: target.name.clone(),
            year: target.year,
            status: None,
        }),
    }
}

/// Lazily walks the race index, one request per (track, year) as locations are consumed.
pub struct RaceIndexFetcher<'a, S> {
    source: &'a S,
    index_base: &'a str,
    targets: std::vec::IntoIter<IndexTarget>,
    pending: VecDeque<RaceLocation>,
}

impl<'a, S: PageSource> RaceIndexFetcher<'a, S> {
    /// `tracks` is visited in order, each over all of `years`.
    pub fn new(
        source: &'a S,
        index_base: &'a str,
        tracks: &[(TrackCode, CourseName)],
        years: &[i32],
        code: RaceCode,
    ) -> Self {
        let targets = tracks
            .iter()
            .flat_map(|(track, name)| {
                years.iter().map(move |&year| IndexTarget {
                    track: track.clone(),
                    name: name.clone(),
                    year,
                    code,
                })
            })
            .collect::<Vec<_>>();
        Self {
            source,
            index_base,
            targets: targets.into_iter(),
            pending: VecDeque::new(),
        }
    }

    pub async fn next_location(&mut self) -> Option<RaceLocation> {
        loop {
            if let Some(location) = self.pending.pop_front() {
                return Some(location);
            }
            let target = self.targets.next()?;
            let response = self.source.get_page(&target.url(self.index_base)).await;
            match index_outcome(response, &target) {
                Ok(locations) => {
                    debug!(
                        "{} races for {} in {}",
                        locations.len(),
                        target.name,
                        target.year
                    );
                    self.pending.extend(locations);
                }
                Err(e) => match notice(&e) {
                    Some(notice) => println!("{notice}"),
                    None => debug!("Skipping: {e}"),
                },
            }
        }
    }
}

/// The line shown to the user for a skipped (track, year), if any.
pub fn notice(error: &IndexError) -> Option<String> {
    error.is_notice().then(|| error.to_string())
}
