//! Stream Ledger CLI
//!
//! Replays a CSV of ledger operations and outputs final stream states.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- operations.csv > streams.csv
//! ```
//!
//! # Replay format
//!
//! Input columns: `op,caller,stream,recipient,amount,rate,duration,at`
//! where `op` is one of `create`, `pause`, `resume`, `cancel`,
//! `withdraw`, `push`; `stream` targets an existing stream id (empty for
//! `create`); `recipient`/`amount`/`rate`/`duration` apply to `create`
//! only; `at` is the logical timestamp of the operation in seconds:
//!
//! ```csv
//! op,caller,stream,recipient,amount,rate,duration,at
//! create,alice,,bob,1000,10,100,1000
//! pause,alice,1,,,,,1020
//! resume,bob,1,,,,,1050
//! withdraw,bob,1,,,,,1060
//! ```
//!
//! Malformed rows and failed operations are logged and skipped; the run
//! always produces the final state of every stream, sorted by id.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity

use std::env;
use std::fs::File;
use std::io::{self, BufReader};
use std::process;
use stream_ledger::{Result, StreamError, StreamLedger};

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        return Err(StreamError::MissingArgument);
    }

    let input_path = &args[1];
    let file = File::open(input_path)?;
    let reader = BufReader::new(file);

    let mut ledger = StreamLedger::new();
    ledger.replay_csv(reader)?;

    let stdout = io::stdout();
    let handle = stdout.lock();
    ledger.write_output(handle)?;

    Ok(())
}
