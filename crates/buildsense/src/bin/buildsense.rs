fn main() {
    if let Err(err) = buildsense::run() {
        eprintln!("{}", buildsense::format_error(&err));
        std::process::exit(1);
    }
}
