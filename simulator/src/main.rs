use std::io::{BufRead, Write};
use std::time;

use structopt::StructOpt;

#[derive(StructOpt)]
#[structopt(name = "ringleader-sim")]
struct Opt {
    /// Number of processes (prompted for when omitted)
    #[structopt(short = "c", long = "count")]
    count: Option<usize>,

    /// Heartbeat and failure detection period (in milliseconds)
    #[structopt(short = "i", long = "interval", default_value = "4000")]
    interval: u64,

    /// Age after which a stuck election is retried (in milliseconds)
    #[structopt(short = "t", long = "timeout")]
    timeout: Option<u64>,

    /// Seconds between crash injections
    #[structopt(long = "crash-every", default_value = "10")]
    crash_every: u64,

    /// Crash the initial coordinator before any random crash
    #[structopt(long = "crash-coordinator-first")]
    coordinator_first: bool,

    /// Minimum seconds between data mutations
    #[structopt(long = "mutate-min", default_value = "5")]
    mutate_min: u64,

    /// Maximum seconds between data mutations
    #[structopt(long = "mutate-max", default_value = "15")]
    mutate_max: u64,

    /// Probability of crashing one successor during each election
    #[structopt(long = "election-chaos", default_value = "0")]
    chaos: f64,

    /// Increase log verbosity (-v, -vv)
    #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
    verbose: u8,
}

fn prompt() -> Option<usize> {
    print!("Enter the number of processes: ");
    std::io::stdout().flush().ok()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line).ok()?;
    line.trim().parse().ok()
}

fn main() {
    let opt = Opt::from_args();

    if let Err(error) = simulator::setup_logger(opt.verbose) {
        eprintln!("[INTERNAL ERROR]: could not install logger: {}", error);
        std::process::exit(1);
    }

    let count = match opt.count.or_else(prompt) {
    | Some(count) => count,
    | None => {
        eprintln!("expected a number of processes");
        std::process::exit(1);
    }
    };

    let mut config = ringleader::Config::new(count)
        .with_interval(time::Duration::from_millis(opt.interval))
        .with_election_chaos(opt.chaos);
    if let Some(timeout) = opt.timeout {
        config = config.with_election_timeout(time::Duration::from_millis(timeout));
    }

    let cluster = match config.run(|_| rand::random::<u32>() % simulator::DATA_RANGE, ringleader::sink::Logger) {
    | Ok(cluster) => cluster,
    | Err(error) => {
        eprintln!("{}", error);
        std::process::exit(1);
    }
    };

    let mutator = simulator::Mutator::new(cluster.shared(), opt.mutate_min..opt.mutate_max);
    if let Err(error) = mutator.spawn() {
        log::error!("failed to spawn data mutator: {}", error);
    }

    simulator::Crasher::new(
        cluster.shared(),
        time::Duration::from_secs(opt.crash_every),
        opt.coordinator_first,
    ).run();

    log::info!("all processes have ended, terminating");
    cluster.shutdown();
}
