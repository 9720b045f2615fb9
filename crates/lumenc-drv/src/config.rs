use std::path::PathBuf;

/// Default output path when none is given: the CLI surface takes
/// exactly one positional argument, so there is nowhere to name one.
pub const DEFAULT_OUTPUT: &str = "compiled_test.txt";

/// The driver's configuration for a single compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl Config {
    /// Builds a `Config` from a raw argument vector (`args[0]` is the
    /// binary name, matching `std::env::args()`). `argc != 2` is a usage
    /// error, not a `CompileError`: the literal text it must print
    /// (`Usage: <binary> <filename>`) has no diagnostic span to attach and
    /// is printed without the `error:` prefix every other failure gets.
    pub fn from_args(args: &[String]) -> Result<Config, String> {
        if args.len() != 2 {
            let binary = args.first().map(String::as_str).unwrap_or("lumenc");
            return Err(format!("Usage: {binary} <filename>"));
        }
        Ok(Config {
            input: PathBuf::from(&args[1]),
            output: PathBuf::from(DEFAULT_OUTPUT),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_one_argument_succeeds() {
        let args = vec!["lumenc".to_string(), "main.lum".to_string()];
        let config = Config::from_args(&args).unwrap();
        assert_eq!(config.input, PathBuf::from("main.lum"));
        assert_eq!(config.output, PathBuf::from(DEFAULT_OUTPUT));
    }

    #[test]
    fn no_arguments_is_a_usage_error() {
        let args = vec!["lumenc".to_string()];
        let err = Config::from_args(&args).unwrap_err();
        assert_eq!(err, "Usage: lumenc <filename>");
    }

    #[test]
    fn too_many_arguments_is_a_usage_error() {
        let args = vec!["lumenc".to_string(), "a.lum".to_string(), "b.lum".to_string()];
        let err = Config::from_args(&args).unwrap_err();
        assert_eq!(err, "Usage: lumenc <filename>");
    }
}
