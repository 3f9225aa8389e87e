//! Splits an argument list between the parser that recognises a flag and
//! everyone else.
//!
//! The engine and the process configuration each read only their own flags.
//! [`split_recognized`] looks up the flag table of a `clap` parser and moves
//! matching flags (and their values) out of the list. Everything else stays
//! in `remaining` in its original relative order.

use clap::{Arg, CommandFactory};

/// Result of removing one parser's flags from an argument list.
///
/// Both halves start with the program name so each can be handed straight to
/// a `clap` parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgSplit {
    /// Program name followed by the recognised flags and their values.
    pub consumed: Vec<String>,
    /// Program name followed by every argument the parser did not claim.
    pub remaining: Vec<String>,
}

impl ArgSplit {
    /// Arguments left over after the program name.
    #[must_use]
    pub fn leftovers(&self) -> &[String] {
        self.remaining.get(1..).unwrap_or_default()
    }
}

struct FlagSpec {
    long: Option<String>,
    short: Option<char>,
    needs_value: bool,
}

impl FlagSpec {
    fn from_arg(arg: &Arg) -> Self {
        // `num_args(0..=1)` flags only take inline `--flag=value` values.
        let needs_value = arg.get_num_args().map_or_else(
            || arg.get_action().takes_values(),
            |range| range.min_values() > 0,
        );
        Self {
            long: arg.get_long().map(str::to_owned),
            short: arg.get_short(),
            needs_value,
        }
    }
}

fn flag_table<P: CommandFactory>() -> Vec<FlagSpec> {
    let mut command = P::command();
    command.build();
    command
        .get_arguments()
        .filter(|arg| !arg.is_positional())
        .map(FlagSpec::from_arg)
        .collect()
}

fn lookup<'a>(table: &'a [FlagSpec], arg: &str) -> Option<(&'a FlagSpec, bool)> {
    if let Some(body) = arg.strip_prefix("--") {
        let (name, inline) = body
            .split_once('=')
            .map_or((body, false), |(name, _)| (name, true));
        return table
            .iter()
            .find(|spec| spec.long.as_deref() == Some(name))
            .map(|spec| (spec, inline));
    }
    let mut chars = arg.strip_prefix('-')?.chars();
    let short = chars.next()?;
    let inline = chars.next().is_some();
    table
        .iter()
        .find(|spec| spec.short == Some(short))
        .map(|spec| (spec, inline))
}

/// Moves the flags recognised by parser `P` out of `args`.
///
/// `args` must start with the program name. A literal `--` stops the scan;
/// it and everything after it stay in `remaining`.
///
/// ```
/// use clap::Parser;
/// use gravitas::args::split_recognized;
///
/// #[derive(Parser)]
/// struct Flags {
///     #[arg(long)]
///     level: Option<u8>,
/// }
///
/// let args: Vec<String> = ["prog", "a", "--level", "3", "b"]
///     .iter()
///     .map(ToString::to_string)
///     .collect();
/// let split = split_recognized::<Flags>(&args);
/// assert_eq!(split.consumed, ["prog", "--level", "3"]);
/// assert_eq!(split.remaining, ["prog", "a", "b"]);
/// ```
#[must_use]
pub fn split_recognized<P: CommandFactory>(args: &[String]) -> ArgSplit {
    let table = flag_table::<P>();
    let program = args.first().cloned().unwrap_or_default();
    let mut consumed = vec![program.clone()];
    let mut remaining = vec![program];

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--" {
            remaining.push(arg.clone());
            remaining.extend(iter.by_ref().cloned());
            break;
        }
        match lookup(&table, arg) {
            Some((spec, inline)) => {
                consumed.push(arg.clone());
                if spec.needs_value && !inline {
                    consumed.extend(iter.next().cloned());
                }
            }
            None => remaining.push(arg.clone()),
        }
    }

    ArgSplit {
        consumed,
        remaining,
    }
}
