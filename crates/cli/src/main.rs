use std::process::ExitCode;

fn main() -> ExitCode {
    tripmate_cli::run()
}
