use colored::Colorize;
use std::process::ExitCode;

fn main() -> ExitCode {
    match deploycheck::run() {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("{} {}", "error:".bright_red().bold(), e);
            ExitCode::from(1)
        }
    }
}
