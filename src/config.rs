use std::{fs, path::PathBuf};

use serde::Deserialize;

use crate::error::Error;

pub const USAGE: &str = "Usage: csim [-hv] -s <s> -E <E> -b <b> -t <tracefile>
Options:
  -h             Print this help message.
  -v             Optional verbose flag.
  -s <num>       Number of set index bits.
  -E <num>       Number of lines per set.
  -b <num>       Number of block offset bits.
  -t <file>      Trace file (.xz traces are decompressed).
  --config <json>, -p <path>
                 Cache geometry as JSON, e.g. {\"s\": 4, \"E\": 1, \"b\": 4}.
  --json <path>  Also write the final counters as JSON.";

/// Widest address the decoder can split.
pub const ADDR_BITS: u32 = u64::BITS;

/// Cache geometry as supplied by the user, before validation.
///
/// Values stay signed so that `-s -1` is reported as a non-positive
/// parameter rather than a parse failure.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(alias = "s")]
    pub set_bits: Option<i64>,
    #[serde(alias = "E")]
    pub ways: Option<i64>,
    #[serde(alias = "b")]
    pub block_bits: Option<i64>,
}

/// Validated geometry: `2^set_bits` sets of `ways` lines, `2^block_bits` byte blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub set_bits: u32,
    pub ways: usize,
    pub block_bits: u32,
}

impl Geometry {
    pub fn new(set_bits: u32, ways: usize, block_bits: u32) -> Result<Self, Error> {
        Config {
            set_bits: Some(set_bits.into()),
            ways: Some(ways.try_into().map_err(|_| Error::config("E is too large"))?),
            block_bits: Some(block_bits.into()),
        }
        .validate()
    }

    pub fn n_sets(&self) -> Option<usize> {
        1usize.checked_shl(self.set_bits)
    }
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// Fields set in `self` win over those in `fallback`.
    pub fn or(self, fallback: Config) -> Config {
        Config {
            set_bits: self.set_bits.or(fallback.set_bits),
            ways: self.ways.or(fallback.ways),
            block_bits: self.block_bits.or(fallback.block_bits),
        }
    }

    pub fn validate(&self) -> Result<Geometry, Error> {
        let set_bits = positive("s", self.set_bits)?;
        let ways = positive("E", self.ways)?;
        let block_bits = positive("b", self.block_bits)?;

        if set_bits + block_bits > i64::from(ADDR_BITS) {
            return Err(Error::config(format!(
                "s + b = {} exceeds the {ADDR_BITS}-bit address width",
                set_bits + block_bits
            )));
        }
        let ways = usize::try_from(ways).map_err(|_| Error::config("E is too large"))?;

        // both bounded by ADDR_BITS above
        Ok(Geometry {
            set_bits: set_bits as u32,
            ways,
            block_bits: block_bits as u32,
        })
    }
}

fn positive(name: &str, value: Option<i64>) -> Result<i64, Error> {
    match value {
        None => Err(Error::config(format!("missing required parameter -{name}"))),
        Some(v) if v <= 0 => Err(Error::config(format!(
            "-{name} must be positive, got {v}"
        ))),
        Some(v) => Ok(v),
    }
}

/// Everything the simulator needs from the command line.
#[derive(Debug)]
pub struct Options {
    pub geometry: Geometry,
    pub trace: PathBuf,
    pub verbose: bool,
    pub json: Option<PathBuf>,
}

impl Options {
    /// Consumes the remaining arguments. `-h` must be checked by the caller first.
    pub fn parse(mut args: pico_args::Arguments) -> Result<Options, Error> {
        let verbose = args.contains("-v");

        let flags = Config {
            set_bits: args.opt_value_from_str("-s")?,
            ways: args.opt_value_from_str("-E")?,
            block_bits: args.opt_value_from_str("-b")?,
        };

        let config_str: Option<String> =
            if let Some(config_str) = args.opt_value_from_str("--config")? {
                Some(config_str)
            } else if let Some(config_path) = args.opt_value_from_str::<_, PathBuf>("-p")? {
                let config_str = fs::read_to_string(&config_path).map_err(|source| {
                    Error::SourceUnavailable {
                        path: config_path,
                        source,
                    }
                })?;
                Some(config_str)
            } else {
                None
            };
        let config = match config_str {
            Some(json) => flags.or(Config::from_json(&json)?),
            None => flags,
        };

        let trace: Option<PathBuf> = args.opt_value_from_str("-t")?;
        let json: Option<PathBuf> = args.opt_value_from_str("--json")?;

        let rest = args.finish();
        if !rest.is_empty() {
            return Err(Error::config(format!("unexpected arguments: {rest:?}")));
        }

        let geometry = config.validate()?;
        let trace = trace.ok_or_else(|| Error::config("missing required parameter -t"))?;

        Ok(Options {
            geometry,
            trace,
            verbose,
            json,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions_sorted as diff;

    fn args(list: &[&str]) -> pico_args::Arguments {
        pico_args::Arguments::from_vec(list.iter().map(|s| (*s).into()).collect())
    }

    #[test]
    fn parses_cachelab_flags() {
        let opts = Options::parse(args(&["-v", "-s", "4", "-E", "2", "-b", "5", "-t", "a.trace"]))
            .unwrap();
        diff::assert_eq!(
            opts.geometry,
            Geometry {
                set_bits: 4,
                ways: 2,
                block_bits: 5
            }
        );
        assert!(opts.verbose);
        diff::assert_eq!(opts.trace, PathBuf::from("a.trace"));
        assert!(opts.json.is_none());
    }

    #[test]
    fn flags_override_json() {
        let opts = Options::parse(args(&[
            "--config",
            r#"{"s": 1, "E": 1, "b": 1}"#,
            "-E",
            "8",
            "-t",
            "a.trace",
        ]))
        .unwrap();
        diff::assert_eq!(
            opts.geometry,
            Geometry {
                set_bits: 1,
                ways: 8,
                block_bits: 1
            }
        );
        assert!(!opts.verbose);
    }

    #[test]
    fn rejects_non_positive() {
        let err = Options::parse(args(&["-s", "0", "-E", "1", "-b", "1", "-t", "x"])).unwrap_err();
        assert!(matches!(err, Error::Config(_)), "{err}");

        let config = Config::from_json(r#"{"s": 2, "E": -3, "b": 2}"#).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("-E must be positive"), "{err}");
    }

    #[test]
    fn rejects_missing_parameters() {
        let err = Options::parse(args(&["-s", "1", "-b", "1", "-t", "x"])).unwrap_err();
        assert!(err.to_string().contains("-E"), "{err}");

        let err = Options::parse(args(&["-s", "1", "-E", "1", "-b", "1"])).unwrap_err();
        assert!(err.to_string().contains("-t"), "{err}");
    }

    #[test]
    fn rejects_unparsable_and_unknown() {
        let err = Options::parse(args(&["-s", "four", "-E", "1", "-b", "1", "-t", "x"]))
            .unwrap_err();
        assert!(matches!(err, Error::Args(_)), "{err}");

        let err = Options::parse(args(&["-s", "1", "-E", "1", "-b", "1", "-t", "x", "-q"]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)), "{err}");
    }

    #[test]
    fn address_width_bound() {
        assert!(Geometry::new(32, 1, 32).is_ok());
        let err = Geometry::new(32, 1, 33).unwrap_err();
        assert!(err.to_string().contains("address width"), "{err}");
    }

    #[test]
    fn bad_json_document() {
        let err = Config::from_json("{\"s\": ").unwrap_err();
        assert!(matches!(err, Error::ConfigDocument(_)), "{err}");
    }
}
