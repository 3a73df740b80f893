mod plan;

use std::ffi::OsString;
use std::path::Path;

use clap::{ArgMatches, CommandFactory, FromArgMatches};

use crate::args::BenchArgs;
use crate::config::default_config_in;
use crate::error::{AppError, AppResult, ValidationError};
use plan::{build_plan, execute_plan};

pub(crate) fn run() -> AppResult<()> {
    let (args, matches, invocation) = parse_args()?;

    crate::logger::init_logging(args.verbose, args.no_color);

    let plan = match build_plan(args, &matches, invocation) {
        Ok(plan) => plan,
        Err(err) => {
            if err.is_usage_error() {
                eprintln!("error: {}\n\n{}", err, BenchArgs::command().render_usage());
            }
            return Err(err);
        }
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(execute_plan(plan))
}

fn parse_args() -> AppResult<(BenchArgs, ArgMatches, Vec<String>)> {
    let mut cmd = BenchArgs::command();
    let raw_args: Vec<OsString> = std::env::args_os().collect();

    // A bare invocation with nothing to fall back on still lacks an endpoint.
    if should_show_help(&raw_args) {
        eprintln!("{}", cmd.render_help());
        return Err(AppError::validation(ValidationError::MissingEndpoint));
    }

    let invocation = raw_args
        .iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();
    let matches = cmd.get_matches_from(raw_args);
    let args = BenchArgs::from_arg_matches(&matches)?;

    Ok((args, matches, invocation))
}

fn should_show_help(raw_args: &[OsString]) -> bool {
    let treat_as_empty =
        matches!(raw_args, [] | [_]) || matches!(raw_args, [_, second] if second == "--");
    if !treat_as_empty {
        return false;
    }

    !has_default_config()
}

fn has_default_config() -> bool {
    default_config_in(Path::new(".")).is_some()
}
