//! Arena lifecycle walkthrough.
//!
//! Demonstrates: create a small arena → dump → allocate → dump → reset →
//! dump → free. Progress and dumps share stdout so they print in order.

use std::process::ExitCode;

use rkmem_bench::walkthrough;

fn main() -> ExitCode {
    let mut transcript = String::new();
    let result = walkthrough(&mut transcript);
    print!("{transcript}");
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Walkthrough failed: {e}");
            ExitCode::FAILURE
        }
    }
}
