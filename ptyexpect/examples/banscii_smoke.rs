//! Emulator smoke test
//!
//! Boots the banscii demo under QEMU, types a line at its prompt and then
//! shuts the emulator down with its escape sequence.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example banscii_smoke -- --command "make run" --log log.txt --timeout 1
//! ```
//!
//! This example will:
//! 1. Spawn the command on a PTY, logging all output to the log file
//! 2. Wait for the `banscii>` prompt and send "Hello World"
//! 3. Wait for the prompt again
//! 4. Send Ctrl-A followed by `x` and wait for "QEMU: Terminated"

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use ptyexpect::{Expect, Script, SessionBuilder};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    println!("=== ptyexpect banscii smoke test ===\n");

    let mut session = SessionBuilder::from_command_line(&args.command)?
        .timeout(Duration::from_secs(args.timeout))
        .log_file(&args.log)
        .spawn()?;

    println!("Spawned '{}' (pid {:?})", session.command(), session.pid());

    let timeout = Duration::from_secs(args.timeout);
    let smoke = Script::builder()
        .expect("banscii>", timeout)
        .send_line("Hello World\r")
        .expect("banscii>", timeout)
        .send_control('A')
        .send("x")
        .expect("QEMU: Terminated", timeout)
        .build();

    let outcome = session.run_script(&smoke);
    session.close()?;

    match outcome {
        Ok(result) => {
            println!("Passed {} checks in {:?}", result.steps.len(), result.elapsed);
            println!("Log written to {:?}", args.log);
            Ok(())
        }
        Err(e) => {
            eprintln!("Smoke test failed: {}", e);
            if let Some(output) = e.timeout_buffer() {
                eprintln!("--- output so far ---\n{}", output);
            }
            std::process::exit(1);
        }
    }
}

struct Args {
    command: String,
    log: PathBuf,
    timeout: u64,
}

const USAGE: &str = "Usage: banscii_smoke [OPTIONS]

Options:
  -c, --command <CMD>    Command that boots the emulator (default: make run)
  -l, --log <PATH>       Output log file (default: log.txt)
  -t, --timeout <SECS>   Timeout per expect (default: 1)";

impl Args {
    fn parse() -> Self {
        match Self::parse_from(env::args().skip(1)) {
            Ok(Some(args)) => args,
            Ok(None) => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            Err(message) => {
                eprintln!("error: {message}\n\n{USAGE}");
                std::process::exit(2);
            }
        }
    }

    /// `Ok(None)` means help was requested.
    fn parse_from(args: impl IntoIterator<Item = String>) -> Result<Option<Self>, String> {
        let mut command = "make run".to_string();
        let mut log = PathBuf::from("log.txt");
        let mut timeout = 1u64;

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--command" | "-c" => {
                    command = args.next().ok_or("--command needs a value")?;
                }
                "--log" | "-l" => {
                    log = PathBuf::from(args.next().ok_or("--log needs a value")?);
                }
                "--timeout" | "-t" => {
                    let value = args.next().ok_or("--timeout needs a value")?;
                    timeout = value
                        .parse()
                        .map_err(|_| format!("invalid --timeout value '{value}'"))?;
                }
                "--help" | "-h" => return Ok(None),
                other => return Err(format!("unknown argument '{other}'")),
            }
        }

        Ok(Some(Self {
            command,
            log,
            timeout,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Option<Args>, String> {
        Args::parse_from(args.iter().map(|a| a.to_string()))
    }

    #[test]
    fn test_invalid_timeout_is_rejected() {
        let err = parse(&["--timeout", "abc"]).err().unwrap();
        assert_eq!(err, "invalid --timeout value 'abc'");
        assert!(parse(&["-t"]).is_err());
    }

    #[test]
    fn test_defaults_and_overrides() {
        let args = parse(&[]).unwrap().unwrap();
        assert_eq!(args.command, "make run");
        assert_eq!(args.timeout, 1);

        let args = parse(&["-c", "sh -c 'true'", "-t", "5", "-l", "out.txt"])
            .unwrap()
            .unwrap();
        assert_eq!(args.command, "sh -c 'true'");
        assert_eq!(args.timeout, 5);
        assert_eq!(args.log, PathBuf::from("out.txt"));
        assert!(parse(&["--help"]).unwrap().is_none());
    }
}
