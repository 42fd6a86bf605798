fn main() {
    if let Err(err) = userrescue::cli::run() {
        println!("[!] {:#}", err);
        std::process::exit(1);
    }
}
