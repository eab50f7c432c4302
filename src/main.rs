use clap::{value_parser, Arg, ArgMatches, Command};
use msise00_rust::{
    config::Config,
    grid::{AltitudeInput, LatLonInput},
    indices::FileIndexProvider,
    model::SubprocessModel,
    parallel, sweep,
    time_utils::TimeInput,
    AtmosphereDataset,
};
use ndarray::Array2;
use std::path::PathBuf;
use std::time::Duration;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = build_cli().get_matches();

    match matches.subcommand() {
        Some(("run", sub_matches)) => {
            if let Err(e) = run_query(sub_matches) {
                eprintln!("Query error: {}", e);
                std::process::exit(1);
            }
        }
        _ => {
            eprintln!("Please specify a subcommand. Use --help for more information.");
            std::process::exit(1);
        }
    }
}

fn run_query(matches: &ArgMatches) -> Result<(), String> {
    let times: Vec<String> = matches
        .get_many::<String>("time")
        .map(|vals| vals.cloned().collect())
        .unwrap_or_default();
    let altitudes: Vec<f64> = matches
        .get_many::<f64>("alt")
        .map(|vals| vals.copied().collect())
        .unwrap_or_default();
    let lats: Vec<f64> = matches
        .get_many::<f64>("lat")
        .map(|vals| vals.copied().collect())
        .unwrap_or_default();
    let lons: Vec<f64> = matches
        .get_many::<f64>("lon")
        .map(|vals| vals.copied().collect())
        .unwrap_or_default();

    let config = Config {
        model_exe: matches.get_one::<PathBuf>("driver").cloned().unwrap(),
        indices_path: matches.get_one::<PathBuf>("indices").cloned().unwrap(),
        model_timeout: Duration::from_secs(*matches.get_one::<u64>("timeout").unwrap()),
        num_threads: *matches.get_one::<usize>("threads").unwrap(),
    };
    config.validate().map_err(|e| e.to_string())?;

    let time = if times.len() == 1 {
        TimeInput::single(times[0].as_str())
    } else {
        TimeInput::sequence(times.iter().map(String::as_str))
    };
    let altitude_km = AltitudeInput::Column(altitudes);
    let latitude = latlon_input(lats);
    let longitude = latlon_input(lons);

    let indices = FileIndexProvider::open(&config.indices_path).map_err(|e| e.to_string())?;
    let model = SubprocessModel::new(config.model_exe.clone(), config.model_timeout);

    let dataset = if matches.get_flag("parallel") {
        if config.num_threads > 0 {
            rayon::ThreadPoolBuilder::new()
                .num_threads(config.num_threads)
                .build_global()
                .map_err(|e| e.to_string())?;
        }
        parallel::run_parallel(&model, &indices, &time, &altitude_km, &latitude, &longitude)
    } else {
        sweep::run(&model, &indices, &time, &altitude_km, &latitude, &longitude)
    }
    .map_err(|e| e.to_string())?;

    print_summary(&dataset);
    Ok(())
}

/// One value stays scalar; several values form a single-row grid.
fn latlon_input(values: Vec<f64>) -> LatLonInput {
    if values.len() == 1 {
        LatLonInput::Scalar(values[0])
    } else {
        let n = values.len();
        LatLonInput::Grid(Array2::from_shape_vec((1, n), values).expect("1xN shape"))
    }
}

fn print_summary(dataset: &AtmosphereDataset) {
    println!("time:   {:?}", dataset.times());
    println!("alt_km: {:?}", dataset.alt_km());
    println!("lat:    {:?}", dataset.lat());
    println!("lon:    {:?}", dataset.lon());

    if let Some(attrs) = dataset.attrs() {
        println!(
            "Ap={} f107={} f107a={}",
            attrs.ap, attrs.f107, attrs.f107a
        );
    }

    for name in dataset.variables() {
        if let Some(values) = dataset.variable(name) {
            let first = values.iter().next().copied().unwrap_or(f64::NAN);
            println!("{:<12} shape {:?}  [0,0,0,0] = {:e}", name, values.shape(), first);
        }
    }
}

fn build_cli() -> Command {
    Command::new("msise00")
        .version("0.1.0")
        .about("NRLMSISE-00 atmosphere model sweeps over time, location, and altitude")
        .subcommand_required(true)
        .subcommand(
            Command::new("run")
                .about("Compute atmospheric state for the given query")
                .arg(
                    Arg::new("time")
                        .short('t')
                        .long("time")
                        .value_name("TIME")
                        .help("Instant, start/stop pair (hourly range), or explicit list")
                        .num_args(1..)
                        .required(true),
                )
                .arg(
                    Arg::new("alt")
                        .short('a')
                        .long("alt")
                        .value_name("KM")
                        .help("Altitude(s) in km")
                        .num_args(1..)
                        .required(true)
                        .value_parser(value_parser!(f64)),
                )
                .arg(
                    Arg::new("lat")
                        .long("lat")
                        .value_name("DEGREES")
                        .help("Latitude value(s); several values form a 1xN grid")
                        .num_args(1..)
                        .required(true)
                        .value_parser(value_parser!(f64)),
                )
                .arg(
                    Arg::new("lon")
                        .long("lon")
                        .value_name("DEGREES")
                        .help("Longitude value(s); shape must match --lat")
                        .num_args(1..)
                        .required(true)
                        .value_parser(value_parser!(f64)),
                )
                .arg(
                    Arg::new("driver")
                        .long("driver")
                        .value_name("PATH")
                        .help("Path to the compiled MSISE-00 driver executable")
                        .default_value("build/msise00_driver")
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("indices")
                        .long("indices")
                        .value_name("FILE")
                        .help("Daily geomagnetic indices table (date F107 Ap per line)")
                        .default_value("data/indices.txt")
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("timeout")
                        .long("timeout")
                        .value_name("SECONDS")
                        .help("Per-invocation driver timeout")
                        .default_value("30")
                        .value_parser(value_parser!(u64)),
                )
                .arg(
                    Arg::new("parallel")
                        .long("parallel")
                        .help("Evaluate grid points on a thread pool")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("threads")
                        .short('j')
                        .long("threads")
                        .value_name("COUNT")
                        .help("Thread count for --parallel (0 = automatic)")
                        .default_value("0")
                        .value_parser(value_parser!(usize)),
                ),
        )
}
