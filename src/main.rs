//! ember - Durable Ordered Key-Value Store
//! Line-oriented front end: reads one command per line from standard
//! input and writes the response lines to standard output.

use std::io::{self, BufRead, BufWriter, Write};
use std::process;

use ember::config::Config;
use ember::engine::Engine;

fn main() {
    env_logger::init();

    let config = Config::default();
    let mut engine = match Engine::open(config) {
        Ok(engine) => engine,
        Err(err) => {
            eprintln!("failed to open database: {err}");
            process::exit(1);
        }
    };

    if let Err(err) = serve(&mut engine) {
        eprintln!("error reading input: {err}");
        process::exit(1);
    }

    let stats = engine.metrics().snapshot();
    log::info!(
        "session closed after {:?}: {} sets, {} gets, {} dels, {} commits, {} aborts",
        stats.uptime,
        stats.sets,
        stats.gets,
        stats.dels,
        stats.commits,
        stats.aborts
    );
}

/// Process commands until EXIT or end of input. Every response is
/// fully emitted before the next command is read.
fn serve(engine: &mut Engine) -> io::Result<()> {
    let stdin = io::stdin();
    let mut out = BufWriter::new(io::stdout().lock());

    for line in stdin.lock().lines() {
        let line = line?;
        let exiting = is_exit(&line);
        for response in engine.execute(&line).into_lines() {
            writeln!(out, "{response}")?;
        }
        out.flush()?;
        if exiting {
            break;
        }
    }
    Ok(())
}

/// EXIT (any case) finalizes the session; EOF is an implicit EXIT.
fn is_exit(line: &str) -> bool {
    line.split_whitespace()
        .next()
        .is_some_and(|verb| verb.eq_ignore_ascii_case("EXIT"))
}
