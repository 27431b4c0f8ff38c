fn main() {
    if let Err(err) = testgen_arena::cli::run() {
        testgen_arena::ui::eprintln_error(&err);
        std::process::exit(testgen_arena::exit::exit_code(&err));
    }
}
