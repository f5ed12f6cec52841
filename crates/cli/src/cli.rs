//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Preview the server-list responses MiniMOTD would send.
#[derive(Debug, Clone, Parser)]
#[command(name = "minimotd", version, about)]
pub struct Args {
    /// Configuration file. Defaults to `<config dir>/minimotd/config.toml`,
    /// created with default contents if missing.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Icon directory. Defaults to `icons/` next to the config file.
    #[arg(short, long, value_name = "DIR")]
    pub icons: Option<PathBuf>,

    /// Real number of online players.
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(i64).range(0..))]
    pub online: i64,

    /// Real maximum number of players.
    #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(i64).range(0..))]
    pub max: i64,

    /// Responses to print per (re)load.
    #[arg(short = 'n', long, default_value_t = 1)]
    pub samples: usize,

    /// Keep running and print fresh responses whenever the config or icons change.
    #[arg(short, long)]
    pub watch: bool,

    /// Directory for the log file.
    #[arg(long, value_name = "DIR", default_value = "logs")]
    pub log_dir: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["minimotd"]).expect("parse");
        assert!(args.config.is_none());
        assert_eq!(args.online, 0);
        assert_eq!(args.max, 20);
        assert_eq!(args.samples, 1);
        assert!(!args.watch);
        assert_eq!(args.log_dir, PathBuf::from("logs"));
    }

    #[test]
    fn parses_overrides() {
        let args = Args::try_parse_from([
            "minimotd", "-c", "motd.toml", "--online", "12", "--max", "100", "-n", "3", "--watch",
        ])
        .expect("parse");
        assert_eq!(args.config, Some(PathBuf::from("motd.toml")));
        assert_eq!(args.online, 12);
        assert_eq!(args.max, 100);
        assert_eq!(args.samples, 3);
        assert!(args.watch);
    }

    #[test]
    fn rejects_negative_counts() {
        assert!(Args::try_parse_from(["minimotd", "--online", "-1"]).is_err());
    }
}
