use clap::{Arg, Command as ClapCommand, ArgAction};
use std::process;
use std::time::Duration;
use log::{error, LevelFilter};

use fitslice::api::FitsCutout;
use fitslice::commands::{CommandFactory, FitsliceCommandFactory};
use fitslice::config::CutoutConfig;
use fitslice::utils::logger::init_logging;

fn main() {
    let matches = ClapCommand::new("fitslice")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Maurice Schilpp")
        .about("Cut pixel regions out of multi-extension FITS files, local or over HTTP")
        .arg(
            Arg::new("input")
                .help("Input FITS file path or http(s) URL")
                .required_unless_present("validate")
                .index(1),
        )
        .arg(
            Arg::new("cutout")
                .short('c')
                .long("cutout")
                .help("Cutout specification, e.g. '[SCI,1][100:200,*]'")
                .value_name("SPEC")
                .requires("output"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("Output FITS file")
                .value_name("FILE"),
        )
        .arg(
            Arg::new("validate")
                .long("validate")
                .help("Parse a cutout specification and print its normalized form")
                .value_name("SPEC")
                .conflicts_with("cutout"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("Configuration file (default: ./fitslice.toml if present)")
                .value_name("FILE"),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .help("Write log output to this file as well as the console")
                .value_name("FILE"),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .help("HTTP request timeout in seconds, 0 for none")
                .value_name("SECONDS")
                .value_parser(clap::value_parser!(u64)),
        )
        .get_matches();

    let mut config = match CutoutConfig::load(matches.get_one::<String>("config").map(String::as_str)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if matches.get_flag("verbose") {
        config.log_level = LevelFilter::Debug;
    }
    if let Some(path) = matches.get_one::<String>("log-file") {
        config.log_file = Some(path.clone());
    }
    if let Some(&secs) = matches.get_one::<u64>("timeout") {
        config.http.timeout = if secs > 0 { Some(Duration::from_secs(secs)) } else { None };
    }

    if let Err(e) = init_logging(config.log_file.as_deref(), config.log_level) {
        eprintln!("Error setting up logger: {}", e);
        process::exit(1);
    }

    let api = FitsCutout::new(config);
    let factory = FitsliceCommandFactory::new();

    let command_result = factory.create_command(&matches, &api);
    match command_result {
        Ok(command) => {
            if let Err(e) = command.execute() {
                error!("Command execution error: {}", e);
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        },
        Err(e) => {
            error!("Failed to create command: {}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
}
