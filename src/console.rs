//! Operator transcript on stdout: `[+]` progress, `[!]` failures, `[?]` prompts.

use std::fmt::Display;
use std::io::{self, Write};

pub fn progress(msg: impl Display) {
    println!("[+] {}", msg);
}

pub fn failure(msg: impl Display) {
    println!("[!] {}", msg);
}

pub fn prompt(msg: impl Display) {
    print!("[?] {}", msg);
    let _ = io::stdout().flush();
}
