use std::process::ExitCode;

fn main() -> ExitCode {
    strategist_cli::run()
}
