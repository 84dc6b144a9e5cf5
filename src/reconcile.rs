//! Reconciliation of independently queried runner lists.
//!
//! A result page exposes every runner attribute as its own list. The lists do
//! not line up one-to-one: some repeat every entry, some interleave markers,
//! some carry a leading total or omit the winner. Each field therefore has a
//! [`Policy`] that brings its raw list to one entry per runner, measured
//! against the de-duplicated finishing positions (the canonical length).
//! Assembly then zips the reconciled lists; the shortest one decides how many
//! records come out.

use itertools::izip;
use log::warn;

use crate::schema::RunnerRecord;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Step {
    /// Keep indices 0, 2, 4, ...; the page renders each value twice.
    DropRepeats,
    /// Keep indices 1, 3, 5, ...; even entries are allowance/claim markers.
    DropMarkers,
    /// Drop the first entry (a race total rather than a runner value).
    DropFirst,
    /// Insert `""` at the front (the winner has no figure).
    PrependEmpty,
    /// Append `""` until the list reaches the canonical length. Never truncates.
    PadToCanonical,
}

pub type Policy = &'static [Step];

pub const POSITION: Policy = &[Step::DropRepeats];
pub const PRIZE: Policy = &[Step::DropFirst, Step::PadToCanonical];
pub const BEATEN: Policy = &[Step::DropRepeats, Step::PrependEmpty, Step::PadToCanonical];
pub const JOCKEY: Policy = &[Step::DropMarkers];
pub const TRAINER: Policy = &[Step::DropMarkers];
/// Draw, name, starting price, age, ratings, comment, weight and headgear.
pub const AS_IS: Policy = &[];

pub fn reconcile(policy: &[Step], mut values: Vec<String>, canonical: usize) -> Vec<String> {
    for step in policy {
        match step {
            Step::DropRepeats => values = values.into_iter().step_by(2).collect(),
            Step::DropMarkers => values = values.into_iter().skip(1).step_by(2).collect(),
            Step::DropFirst => {
                if !values.is_empty() {
                    values.remove(0);
                }
            }
            Step::PrependEmpty => values.insert(0, String::new()),
            Step::PadToCanonical => {
                if values.len() < canonical {
                    values.resize(canonical, String::new());
                }
            }
        }
    }
    values
}

/// Runner lists after reconciliation, one entry per runner in finishing order.
#[derive(Clone, Debug, Default)]
pub struct RunnerColumns {
    pub position: Vec<String>,
    pub draw: Vec<String>,
    pub beaten: Vec<String>,
    pub name: Vec<String>,
    pub starting_price: Vec<String>,
    pub age: Vec<String>,
    pub weight: Vec<String>,
    pub headgear: Vec<String>,
    pub trainer: Vec<String>,
    pub jockey: Vec<String>,
    pub official_rating: Vec<String>,
    pub speed_figure: Vec<String>,
    pub rating_figure: Vec<String>,
    pub prize: Vec<String>,
    pub comment: Vec<String>,
}

impl RunnerColumns {
    fn lengths(&self) -> [(&'static str, usize); 15] {
        [
            ("position", self.position.len()),
            ("draw", self.draw.len()),
            ("beaten", self.beaten.len()),
            ("name", self.name.len()),
            ("starting_price", self.starting_price.len()),
            ("age", self.age.len()),
            ("weight", self.weight.len()),
            ("headgear", self.headgear.len()),
            ("trainer", self.trainer.len()),
            ("jockey", self.jockey.len()),
            ("official_rating", self.official_rating.len()),
            ("speed_figure", self.speed_figure.len()),
            ("rating_figure", self.rating_figure.len()),
            ("prize", self.prize.len()),
            ("comment", self.comment.len()),
        ]
    }

    /// Number of records [`Self::into_records`] yields.
    pub fn row_count(&self) -> usize {
        self.lengths().iter().map(|&(_, len)| len).min().unwrap_or(0)
    }

    /// Zips the columns positionally. Runners past the shortest column are dropped.
    pub fn into_records(self) -> Vec<RunnerRecord> {
        let rows = self.row_count();
        if rows < self.position.len() {
            let short = self
                .lengths()
                .into_iter()
                .filter(|&(_, len)| len == rows)
                .map(|(field, _)| field)
                .collect::<Vec<_>>();
            warn!(
                "Keeping {rows} of {} runners; shortest columns: {short:?}",
                self.position.len()
            );
        }
        izip!(
            self.position,
            self.draw,
            self.beaten,
            self.name,
            self.starting_price,
            self.age,
            self.weight,
            self.headgear,
            self.trainer,
            self.jockey,
            self.official_rating,
            self.speed_figure,
            self.rating_figure,
            self.prize,
            self.comment,
        )
        .map(
            |(
                position,
                draw,
                beaten,
                name,
                starting_price,
                age,
                weight,
                headgear,
                trainer,
                jockey,
                official_rating,
                speed_figure,
                rating_figure,
                prize,
                comment,
            )| {
                RunnerRecord::builder()
                    .position(position)
                    .draw(draw)
                    .beaten(beaten)
                    .name(name)
                    .starting_price(starting_price)
                    .age(age)
                    .weight(weight)
                    .headgear(headgear)
                    .trainer(trainer)
                    .jockey(jockey)
                    .official_rating(official_rating)
                    .speed_figure(speed_figure)
                    .rating_figure(rating_figure)
                    .prize(prize)
                    .comment(comment)
                    .build()
            },
        )
        .collect()
    }
}
