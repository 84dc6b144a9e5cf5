use std::{fmt::Debug, path::PathBuf, time::Duration};

use anyhow::Context;
use chrono::{Datelike, Local};
use rpscrape_utils::fs_json_util::read_toml_or_default;
use serde::Deserialize;
use serde_with::{serde_as, DurationMilliSeconds};
use thiserror::Error;
use url::Url;

#[serde_as]
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Prefix of `{track}/{year}/{code}/all-races`.
    pub index_base: String,
    /// Prefix of `{track}/{name}/{date}/{race_instance_uid}`.
    pub results_base: String,
    pub user_agent: String,
    pub data_dir: PathBuf,
    pub courses_dir: PathBuf,
    pub first_year: i32,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub request_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            index_base: "https://www.racingpost.com:443/profile/course/filter/results".into(),
            results_base: "https://www.racingpost.com/results".into(),
            user_agent: "Mozilla/5.0".into(),
            data_dir: "data".into(),
            courses_dir: "courses".into(),
            first_year: 1996,
            request_interval: Duration::ZERO,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("Invalid year, must be in range {first}-{last}.")]
pub struct InvalidYears {
    pub first: i32,
    pub last: i32,
}

impl Config {
    pub fn load<P: Into<PathBuf> + Debug>(path: P) -> anyhow::Result<Self> {
        let config: Self = read_toml_or_default(path)?;
        for base in [&config.index_base, &config.results_base] {
            Url::parse(base).with_context(|| format!("Invalid base URL in config: {base:?}"))?;
        }
        Ok(config)
    }

    pub fn last_year(&self) -> i32 {
        Local::now().year()
    }

    /// Expands `2015` or `2015-2018` into the years it covers.
    pub fn parse_years(&self, arg: &str) -> Result<Vec<i32>, InvalidYears> {
        self.parse_years_until(arg, self.last_year())
    }

    fn parse_years_until(&self, arg: &str, last: i32) -> Result<Vec<i32>, InvalidYears> {
        let error = InvalidYears {
            first: self.first_year,
            last,
        };
        let parse = |s: &str| -> Result<i32, InvalidYears> {
            let s = s.trim();
            if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                return Err(error.clone());
            }
            s.parse().map_err(|_| error.clone())
        };
        let (from, to) = match arg.split_once('-') {
            Some((from, to)) => (parse(from)?, parse(to)?),
            None => {
                let year = parse(arg)?;
                (year, year)
            }
        };
        if !(self.first_year <= from && from <= to && to <= last) {
            return Err(error);
        }
        Ok((from..=to).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{Config, InvalidYears};

    #[test]
    fn parse_single_year_and_range() {
        let config = Config::default();
        assert_eq!(config.parse_years_until("2015", 2018), Ok(vec![2015]));
        assert_eq!(
            config.parse_years_until("2015-2018", 2018),
            Ok(vec![2015, 2016, 2017, 2018])
        );
    }

    #[test]
    fn reject_invalid_years() {
        let config = Config::default();
        let error = Err(InvalidYears {
            first: 1996,
            last: 2018,
        });
        assert_eq!(config.parse_years_until("1995", 2018), error);
        assert_eq!(config.parse_years_until("2019", 2018), error);
        assert_eq!(config.parse_years_until("2018-2016", 2018), error);
        assert_eq!(config.parse_years_until("20x5", 2018), error);
        assert_eq!(config.parse_years_until("-2018", 2018), error);
        assert_eq!(config.parse_years_until("1-2000000000", 2018), error);
        assert_eq!(config.parse_years_until("2016-99999999999", 2018), error);
        assert_eq!(
            error.unwrap_err().to_string(),
            "Invalid year, must be in range 1996-2018."
        );
    }

    #[test]
    fn load_partial_config() {
        let path = std::env::temp_dir().join(format!("rpscrape-config-{}.toml", std::process::id()));
        fs_err::write(&path, "first_year = 2000\nrequest_interval = 1500\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.first_year, 2000);
        assert_eq!(config.request_interval, Duration::from_millis(1500));
        assert_eq!(config.user_agent, "Mozilla/5.0");
        fs_err::remove_file(path).unwrap();
    }

    #[test]
    fn reject_invalid_base_url() {
        let path = std::env::temp_dir().join(format!("rpscrape-bad-url-{}.toml", std::process::id()));
        fs_err::write(&path, "results_base = \"not a url\"\n").unwrap();
        assert!(Config::load(&path).is_err());
        fs_err::remove_file(path).unwrap();
    }
}
