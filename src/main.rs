mod cli;
mod form;
mod formula;
mod load;

use std::io::BufReader;

use clap::{App, Arg};

use cli::session::Session;

fn main() {
    tracing_subscriber::fmt::init();

    let matches = App::new("checksheet")
        .about("Descriptor-driven inspection form with reactive formula evaluation")
        .arg(
            Arg::with_name("registry")
                .help("Path to a JSON field-descriptor registry (builtin form if omitted)")
                .index(1),
        )
        .arg(
            Arg::with_name("script")
                .long("script")
                .takes_value(true)
                .help("Read form commands from a file instead of stdin"),
        )
        .get_matches();

    let registry = match matches.value_of("registry") {
        Some(path) => match load::read_registry(path) {
            Ok(registry) => registry,
            Err(err) => {
                // terminal error state: nothing renders, no retry
                eprintln!("--> Error: {}", err);
                std::process::exit(1);
            }
        },
        None => load::builtin(),
    };

    let mut session = Session::new(&registry);
    match matches.value_of("script") {
        Some(path) => match std::fs::File::open(path) {
            Ok(file) => session.run(BufReader::new(file)),
            Err(err) => {
                eprintln!("--> Error: cannot open script '{}': {}", path, err);
                std::process::exit(1);
            }
        },
        None => session.run(std::io::stdin().lock()),
    }
}
