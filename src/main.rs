use std::io;

use color_eyre::eyre;

use csim::{
    config::{Options, USAGE},
    sim,
    trace::Trace,
};

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut args = pico_args::Arguments::from_env();
    if args.contains("-h") {
        eprintln!("{USAGE}");
        std::process::exit(1);
    }
    let options = Options::parse(args)?;
    log::info!(
        "s={} E={} b={} trace={}",
        options.geometry.set_bits,
        options.geometry.ways,
        options.geometry.block_bits,
        options.trace.display()
    );

    let trace = Trace::open(&options.trace)?;
    let stdout = io::stdout();
    sim::simulate(&options, trace, &mut stdout.lock())?;
    Ok(())
}
