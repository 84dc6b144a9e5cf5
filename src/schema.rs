use chrono::NaiveDate;
use clap::ValueEnum;
use derive_more::{AsRef, Display, From};
use getset::{CopyGetters, Getters};
use typed_builder::TypedBuilder;

/// Placeholder written for a race-level field the page does not carry.
pub const NOT_FOUND: &str = "not found";

#[derive(Clone, PartialEq, Eq, Hash, Debug, From, AsRef, Display)]
#[as_ref(forward)]
pub struct TrackCode(String);
impl TrackCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Course name as it appears in result-page URLs (`Newmarket-July`).
#[derive(Clone, PartialEq, Eq, Hash, Debug, From, AsRef, Display)]
#[as_ref(forward)]
pub struct CourseName(String);
impl CourseName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, From, Display)]
pub struct RaceInstanceUid(u64);

#[derive(Clone, Copy, PartialEq, Eq, Debug, Display, ValueEnum)]
pub enum RaceCode {
    #[display("flat")]
    #[value(alias = "f")]
    Flat,
    #[display("jumps")]
    #[value(aliases = ["jump", "j"])]
    Jumps,
}

#[derive(Clone, PartialEq, Eq, Debug, TypedBuilder, Getters, CopyGetters)]
pub struct RaceLocation {
    #[getset(get = "pub")]
    track: TrackCode,
    #[getset(get = "pub")]
    name: CourseName,
    #[getset(get_copy = "pub")]
    date: NaiveDate,
    #[getset(get_copy = "pub")]
    race_instance_uid: RaceInstanceUid,
}
impl RaceLocation {
    pub fn url(&self, results_base: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            results_base.trim_end_matches('/'),
            self.track,
            self.name,
            self.date.format("%Y-%m-%d"),
            self.race_instance_uid,
        )
    }
}

#[derive(Clone, PartialEq, Eq, Debug, TypedBuilder, Getters)]
#[getset(get = "pub")]
pub struct RaceMeta {
    date: String,
    course: String,
    time: String,
    title: String,
    class: String,
    band: String,
    distance: String,
    going: String,
}

#[derive(Clone, PartialEq, Eq, Debug, TypedBuilder, Getters)]
#[getset(get = "pub")]
pub struct RunnerRecord {
    position: String,
    draw: String,
    beaten: String,
    name: String,
    starting_price: String,
    age: String,
    weight: String,
    headgear: String,
    trainer: String,
    jockey: String,
    official_rating: String,
    speed_figure: String,
    rating_figure: String,
    prize: String,
    comment: String,
}
