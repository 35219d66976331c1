use std::sync::Arc;
use std::time;

use ringleader::sink::{Logger, Recorder};
use ringleader::Cluster;
use structopt::StructOpt;

mod command;

use crate::command::{Command, Execution};

#[derive(StructOpt)]
#[structopt(name = "harness")]
struct Opt {
    /// Scenario to replay
    #[structopt(short = "f", long = "file")]
    file: std::path::PathBuf,

    /// Where to write the recorded events as JSON
    #[structopt(short = "t", long = "trace")]
    trace: Option<std::path::PathBuf>,

    /// Increase log verbosity (-v, -vv)
    #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
    verbose: u8,
}

fn setup_logger(verbosity: u8) -> Result<(), log::SetLoggerError> {
    let level = match verbosity {
    | 0 => log::LevelFilter::Warn,
    | 1 => log::LevelFilter::Info,
    | _ => log::LevelFilter::Debug,
    };
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}] {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                message,
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
}

fn cluster(cluster: &Option<Cluster<u32>>) -> &Cluster<u32> {
    cluster.as_ref()
        .expect("[SCENARIO ERROR]: command issued before Start")
}

fn main() {
    let opt = Opt::from_args();

    setup_logger(opt.verbose)
        .expect("[INTERNAL ERROR]: could not install logger");

    let execution: Execution = std::fs::File::open(&opt.file)
        .map(serde_json::from_reader)
        .expect("[INTERNAL ERROR]: could not find file")
        .expect("[INTERNAL ERROR]: could not parse scenario");

    let recorder: Arc<Recorder<u32>> = Arc::new(Recorder::new());
    let mut running: Option<Cluster<u32>> = None;
    let mut failures = 0;

    for command in execution.0 {
        println!("Executing command {:?}", command);
        match command {
        | Command::Start { count, interval_ms, timeout_ms, chaos } => {
            let mut config = ringleader::Config::new(count)
                .with_interval(time::Duration::from_millis(interval_ms))
                .with_election_chaos(chaos);
            if let Some(timeout) = timeout_ms {
                config = config.with_election_timeout(time::Duration::from_millis(timeout));
            }
            if let Some(previous) = running.take() {
                previous.shutdown();
            }
            let started = config
                .run(|id| id as u32, (Logger, recorder.clone()))
                .expect("[SCENARIO ERROR]: could not start cluster");
            running = Some(started);
        }
        | Command::Crash { id } => {
            if let Err(error) = cluster(&running).crash(id) {
                println!("crash failed: {}", error);
                failures += 1;
            }
        }
        | Command::Update { id, data } => {
            if let Err(error) = cluster(&running).update(id, data) {
                println!("update failed: {}", error);
                failures += 1;
            }
        }
        | Command::Sleep { ms } => {
            std::thread::sleep(time::Duration::from_millis(ms));
        }
        | Command::ExpectCoordinator { id } => {
            let actual = cluster(&running).coordinator();
            if actual != id {
                println!("expected coordinator {}, found {}", id, actual);
                failures += 1;
            }
        }
        | Command::ExpectData { data } => {
            let cluster = cluster(&running);
            for id in cluster.live() {
                let actual = cluster.process(id).map(|process| process.data());
                if actual != Some(data) {
                    println!("expected process {} to hold {}, found {:?}", id, data, actual);
                    failures += 1;
                }
            }
        }
        | Command::ExpectConverged => {
            let cluster = cluster(&running);
            let coordinator = cluster.coordinator();
            let data = match cluster.process(coordinator) {
            | Some(process) if process.is_alive() => process.data(),
            | _ => {
                println!("coordinator {} is not alive", coordinator);
                failures += 1;
                continue
            }
            };
            let diverged = cluster.live()
                .into_iter()
                .filter(|id| cluster.process(*id).map(|process| process.data()) != Some(data))
                .collect::<Vec<_>>();
            if !diverged.is_empty() {
                println!("processes {:?} diverge from coordinator {}", diverged, coordinator);
                failures += 1;
            }
        }
        }
    }

    if let Some(cluster) = running {
        cluster.shutdown();
    }

    if let Some(path) = opt.trace {
        let file = std::fs::File::create(path)
            .expect("[INTERNAL ERROR]: could not create trace file");
        serde_json::to_writer_pretty(file, &recorder.events())
            .expect("[INTERNAL ERROR]: could not write trace");
    }

    if failures > 0 {
        println!("{} expectation(s) failed", failures);
        std::process::exit(1);
    }
    println!("all expectations held");
}
