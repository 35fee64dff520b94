use std::{
    fmt, fs,
    io::{self, Write},
};

use crate::{
    cache::Cache,
    config::{Geometry, Options},
    error::Error,
    replace::{counter::Counter, AccessResult},
    stats::Stats,
    trace::{Access, Kind},
};

/// Classification of one trace line. Only a modify produces `second`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub first: AccessResult,
    pub second: Option<AccessResult>,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.first)?;
        if let Some(second) = self.second {
            write!(f, " {second}")?;
        }
        Ok(())
    }
}

pub struct Simulator {
    cache: Cache<Counter>,
    stats: Stats,
    verbose: bool,
}

impl Simulator {
    pub fn new(geometry: Geometry) -> Result<Self, Error> {
        Ok(Simulator {
            cache: Cache::new(geometry, Counter)?,
            stats: Stats::default(),
            verbose: false,
        })
    }

    /// Echo every classified line to the output passed to [`Simulator::run`].
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn cache(&self) -> &Cache<Counter> {
        &self.cache
    }

    /// Applies a single trace line. Instruction fetches leave everything untouched.
    pub fn step(&mut self, access: &Access) -> Option<Outcome> {
        if access.kind == Kind::Instr {
            return None;
        }

        let addr = self.cache.split_addr(access.addr);
        let first = self.cache.access(addr);
        self.stats.record(first);

        // the store half of a modify always finds the line the load just touched,
        // but it still ages the rest of the set
        let second = (access.kind == Kind::Modify).then(|| {
            let second = self.cache.access(addr);
            debug_assert!(second.is_hit(), "store after load missed: {addr:?}");
            self.stats.record(second);
            second
        });

        let outcome = Outcome { first, second };
        log::trace!("{access} -> {outcome} (set {}, tag {:#x})", addr.set, addr.tag);
        Some(outcome)
    }

    /// Drives the whole trace and returns the final counters.
    pub fn run<I, W>(&mut self, trace: I, out: &mut W) -> Result<Stats, Error>
    where
        I: IntoIterator<Item = Result<Access, Error>>,
        W: Write,
    {
        for access in trace {
            let access = access?;
            if let Some(outcome) = self.step(&access) {
                if self.verbose {
                    writeln!(out, "{access} {outcome}")?;
                }
            }
        }
        Ok(self.stats)
    }
}

/// Runs a whole trace for `options`, then prints the summary line to `out` and
/// writes the JSON report if one was requested. Nothing is printed when the run
/// fails part way through.
pub fn simulate<I, W>(options: &Options, trace: I, out: &mut W) -> Result<Stats, Error>
where
    I: IntoIterator<Item = Result<Access, Error>>,
    W: Write,
{
    let mut sim = Simulator::new(options.geometry)?.verbose(options.verbose);
    let stats = sim.run(trace, out)?;
    writeln!(out, "{stats}")?;

    if let Some(stats_path) = &options.json {
        let report = |source| Error::Report {
            path: stats_path.clone(),
            source,
        };
        let stats_file = fs::File::create(stats_path).map_err(report)?;
        serde_json::to_writer_pretty(stats_file, &stats.make_report())
            .map_err(|err| report(io::Error::from(err)))?;
    }
    Ok(stats)
}
