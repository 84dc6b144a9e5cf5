use std::{fmt::Debug, io::BufReader, path::PathBuf};

use anyhow::Context;
use fs_err::File;
use serde::Deserialize;

pub fn read_json<P: Into<PathBuf> + Debug, T: for<'de> Deserialize<'de>>(
    path: P,
) -> anyhow::Result<T> {
    let path = path.into();
    (|| serde_json::from_reader(BufReader::new(File::open(&path)?)).map_err(anyhow::Error::new))()
        .with_context(|| {
            format!(
                "While trying to parse {path:?} as {}",
                std::any::type_name::<T>()
            )
        })
}

pub fn read_toml<P: Into<PathBuf> + Debug, T: for<'de> Deserialize<'de>>(
    path: P,
) -> anyhow::Result<T> {
    let path = path.into();
    (|| toml::from_str(&fs_err::read_to_string(&path)?).map_err(anyhow::Error::new))().with_context(
        || {
            format!(
                "While trying to parse {path:?} as {}",
                std::any::type_name::<T>()
            )
        },
    )
}

/// Like [`read_toml`], but a missing file yields `T::default()`.
pub fn read_toml_or_default<P: Into<PathBuf> + Debug, T: for<'de> Deserialize<'de> + Default>(
    path: P,
) -> anyhow::Result<T> {
    let path = path.into();
    if path.exists() {
        read_toml(path)
    } else {
        Ok(T::default())
    }
}
