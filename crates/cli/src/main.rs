use std::process::ExitCode;

fn main() -> ExitCode {
    myshop_cli::run()
}
