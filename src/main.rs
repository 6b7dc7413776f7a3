//! Purpose: `jsoncontract` CLI entry point: re-encode JSON under a chosen format policy.
//! Role: Binary crate root; parses args, runs commands, emits JSON on stdout.
//! Invariants: stdout carries only JSON documents; diagnostics and logs go to stderr.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
#![allow(clippy::result_large_err)]
use std::io::{self, IsTerminal, Read, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint, error::ErrorKind as ClapErrorKind};
use serde_json::{Map, Value, json};
use std::error::Error as StdError;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use jsoncontract::api::{
    DEFAULT_MAX_DEPTH, DateRepresentation, Error, ErrorKind, FloatParseTarget, FormatPolicy,
    LayoutMode, Serializer, SerializerSettings, to_exit_code,
};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn run() -> Result<RunOutcome, Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Try `jsoncontract --help`."));
            }
        },
    };

    let result = match cli.command {
        Command::Reencode { input, policy } => reencode(input, &policy),
        Command::Policy { policy } => {
            let value = serde_json::to_value(policy.format_policy()).map_err(|err| {
                Error::new(ErrorKind::Internal)
                    .with_message("failed to encode policy")
                    .with_source(err)
            })?;
            emit_json(&value)?;
            Ok(RunOutcome::ok())
        }
    };

    result.map_err(add_io_hint).map_err(add_decode_hint)
}

#[derive(Parser)]
#[command(
    name = "jsoncontract",
    version,
    about = "Re-encode JSON under an explicit format policy",
    long_about = r#"Decode JSON under a format policy and write it back out.

The policy picks the date representation, the parse target for floating
literals, and the output layout."#,
    after_help = r#"EXAMPLES
  $ echo '{"at":"/Date(1332308400000)/"}' | jsoncontract reencode --detect-dates
  $ jsoncontract reencode prices.json --floats decimal --indent
  $ jsoncontract policy --dates epoch-millis"#,
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Decode JSON and write it back under the policy")]
    Reencode {
        #[arg(help = "Input file (default: stdin)", value_hint = ValueHint::FilePath)]
        input: Option<PathBuf>,
        #[command(flatten)]
        policy: PolicyArgs,
    },
    #[command(about = "Print the effective format policy as JSON")]
    Policy {
        #[command(flatten)]
        policy: PolicyArgs,
    },
}

#[derive(Args, Debug)]
struct PolicyArgs {
    #[arg(long, value_enum, default_value = "iso8601", help = "Date representation on output")]
    dates: DatesArg,
    #[arg(long, value_enum, default_value = "binary64", help = "Parse target for floating literals")]
    floats: FloatsArg,
    #[arg(long, help = "Indent output two spaces per level")]
    indent: bool,
    #[arg(long, help = "Read date-shaped strings as dates")]
    detect_dates: bool,
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH, help = "Maximum nesting depth accepted on input")]
    max_depth: usize,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum DatesArg {
    Iso8601,
    EpochMillis,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FloatsArg {
    Binary64,
    Decimal,
}

impl PolicyArgs {
    fn format_policy(&self) -> FormatPolicy {
        let dates = match self.dates {
            DatesArg::Iso8601 => DateRepresentation::Iso8601,
            DatesArg::EpochMillis => DateRepresentation::EpochMillisTagged,
        };
        let floats = match self.floats {
            FloatsArg::Binary64 => FloatParseTarget::Binary64,
            FloatsArg::Decimal => FloatParseTarget::DecimalExact,
        };
        let layout = if self.indent {
            LayoutMode::Indented
        } else {
            LayoutMode::Compact
        };
        FormatPolicy::new(dates, floats, layout)
    }

    fn serializer(&self) -> Serializer {
        Serializer::new(
            SerializerSettings::new()
                .with_policy(self.format_policy())
                .with_date_detection(self.detect_dates)
                .with_max_depth(self.max_depth),
        )
    }
}

fn reencode(input: Option<PathBuf>, policy: &PolicyArgs) -> Result<RunOutcome, Error> {
    let text = read_input(input.as_ref())?;
    let serializer = policy.serializer();
    debug!(policy = ?serializer.policy(), bytes = text.len(), "re-encoding input");

    let node = serializer.from_str_any(&text)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serializer.write_to(&node, &mut out)?;
    writeln!(out).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to write output")
            .with_source(err)
    })?;
    Ok(RunOutcome::ok())
}

fn read_input(input: Option<&PathBuf>) -> Result<String, Error> {
    match input {
        Some(path) => std::fs::read_to_string(path).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message(format!("failed to read {}", path.display()))
                .with_source(err)
        }),
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text).map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to read stdin")
                    .with_source(err)
            })?;
            Ok(text)
        }
    }
}

fn emit_json(value: &Value) -> Result<(), Error> {
    let json = serde_json::to_string(value).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to encode output")
            .with_source(err)
    })?;
    println!("{json}");
    Ok(())
}

fn add_io_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Io || err.hint().is_some() {
        return err;
    }
    err.with_hint("I/O error. Check the input path and that stdout is writable.")
}

fn add_decode_hint(err: Error) -> Error {
    if err.hint().is_some() {
        return err;
    }
    match err.kind() {
        ErrorKind::Overflow => {
            err.with_hint("The literal does not fit the decimal target. Use `--floats binary64` to accept rounding.")
        }
        ErrorKind::Mismatch => err.with_hint("Input does not match the expected shape."),
        _ => err,
    }
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("{}", error_text(err));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::Syntax => "malformed json".to_string(),
        ErrorKind::Mismatch => "json does not match the declared type".to_string(),
        ErrorKind::ContractViolation => "type contract cannot be satisfied".to_string(),
        ErrorKind::Overflow => "value out of range".to_string(),
        ErrorKind::ConverterPredicate => "converter claim check failed".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(type_name) = err.type_name() {
        inner.insert("type".to_string(), json!(type_name));
    }
    if let Some(member) = err.member() {
        inner.insert("member".to_string(), json!(member));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error) -> String {
    let mut lines = vec![format!("error: {}", error_message(err))];
    if let Some(hint) = err.hint() {
        lines.push(format!("hint: {hint}"));
    }
    if let Some(type_name) = err.type_name() {
        lines.push(format!("type: {type_name}"));
    }
    if let Some(member) = err.member() {
        lines.push(format!("member: {member}"));
    }
    if let Some(cause) = error_causes(err).first() {
        lines.push(format!("caused by: {cause}"));
    }
    lines.join("\n")
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}
