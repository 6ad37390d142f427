use std::{io, fs};
use std::io::Read;
use std::path::Path;
use serde::Deserialize;

use crate::error::BoxedErrorTrait;

const CONFIG_FILE_PATH: &'static str = "config.toml";

/// Settings read from `config.toml`. Every key is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Stop enumerating a query's answers after this many
    pub solution_limit: Option<usize>,
    /// Print the compiled procedures before running the query
    pub dump_ir: bool,
    /// The query to run when none is given on the command line
    pub query: Option<String>,
}

impl Config {
    /// Read `config.toml` from the working directory, falling back to the defaults if there is none
    pub fn load() -> Result<Config, BoxedErrorTrait> {
        match Config::from_path(CONFIG_FILE_PATH) {
            Err(why) if is_not_found(&*why) => {
                debug!("no {}, using the default configuration", CONFIG_FILE_PATH);
                Ok(Config::default())
            }
            result => result,
        }
    }
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Config, BoxedErrorTrait> {
        let mut file = fs::File::open(path)?;
        let mut buf = String::new();
        file.read_to_string(&mut buf)?;
        Config::parse(buf.as_str())
    }
    pub fn parse(text: &str) -> Result<Config, BoxedErrorTrait> {
        let config = toml::from_str(text)?;
        Ok(config)
    }
}

fn is_not_found(why: &(dyn std::error::Error + 'static)) -> bool {
    why.downcast_ref::<io::Error>()
        .map_or(false, |why| why.kind() == io::ErrorKind::NotFound)
}
