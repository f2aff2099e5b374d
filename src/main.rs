//! Binary entry point for `fs-undo`.

use std::process;

fn main() {
    if let Err(e) = fs_undo::run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
