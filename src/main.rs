use std::env;
use std::io::{self, BufRead, Write};

use simpledb::Engine;

fn main() -> io::Result<()> {
    let path = env::args().nth(1).unwrap_or_else(|| "simpledb.json".into());

    let mut engine = match Engine::open(&path) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    println!("simpledb, backed by {path} (type 'exit' to quit)");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("simpledb> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        match engine.execute(line) {
            Ok(result) => println!("{result}"),
            Err(e) => println!("Error: {e}"),
        }
    }
    Ok(())
}
