//! Course and region reference data.
//!
//! Courses live in `{dir}/{region}_course_ids`, one `code-name` per line
//! (`all_course_ids` lists every course). Regions live in `{dir}/_countries`
//! as a JSON object from region code to region name.

use std::path::PathBuf;

use anyhow::Context;
use getset::Getters;
use indexmap::IndexMap;
use rpscrape_utils::fs_json_util::read_json;

use crate::schema::{CourseName, TrackCode};

pub const ALL_REGIONS: &str = "all";

#[derive(Clone, PartialEq, Eq, Debug, Getters)]
#[getset(get = "pub")]
pub struct Course {
    code: TrackCode,
    name: String,
}

impl Course {
    pub fn new(code: TrackCode, name: String) -> Self {
        Self { code, name }
    }

    /// Name used in result-page URLs.
    pub fn url_name(&self) -> CourseName {
        self.name.replace("()", "").replace(' ', "-").into()
    }

    pub fn parse_line(line: &str) -> Option<Self> {
        let mut parts = line.split('-');
        let code = parts.next()?.trim();
        if code.is_empty() {
            return None;
        }
        let name = parts.collect::<Vec<_>>().join(" ").trim().to_owned();
        Some(Self::new(code.to_owned().into(), name))
    }
}

pub struct CourseTable {
    dir: PathBuf,
}

impl CourseTable {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn courses(&self, region: &str) -> anyhow::Result<Vec<Course>> {
        let path = self.dir.join(format!("{region}_course_ids"));
        let text = fs_err::read_to_string(&path)
            .with_context(|| format!("Failed to read course list for region {region:?}"))?;
        Ok(text.lines().filter_map(Course::parse_line).collect())
    }

    pub fn all_courses(&self) -> anyhow::Result<Vec<Course>> {
        self.courses(ALL_REGIONS)
    }

    pub fn find_course(&self, code: &str) -> anyhow::Result<Option<Course>> {
        Ok(self
            .all_courses()?
            .into_iter()
            .find(|course| course.code.as_str() == code))
    }

    pub fn search_courses(&self, term: &str) -> anyhow::Result<Vec<Course>> {
        let term = term.to_lowercase();
        Ok(self
            .all_courses()?
            .into_iter()
            .filter(|course| course.name.to_lowercase().contains(&term))
            .collect())
    }

    pub fn regions(&self) -> anyhow::Result<IndexMap<String, String>> {
        read_json(self.dir.join("_countries"))
    }

    pub fn is_region(&self, code: &str) -> anyhow::Result<bool> {
        Ok(self.regions()?.contains_key(code))
    }

    pub fn search_regions(&self, term: &str) -> anyhow::Result<Vec<(String, String)>> {
        let term = term.to_lowercase();
        Ok(self
            .regions()?
            .into_iter()
            .filter(|(_, region)| region.to_lowercase().contains(&term))
            .collect())
    }
}

pub fn format_course(course: &Course) -> String {
    format!("     CODE: {:<5}| {}", course.code.to_string(), course.name)
}

pub fn format_region(code: &str, region: &str) -> String {
    format!("     CODE: {code:<4}| {region}")
}
