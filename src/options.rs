use async_cron_scheduler::cron::Schedule;
use clap::Parser;
use env_logger::Env;
use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::PathBuf;
use std::str::FromStr;

pub const USERS_FILE: &str = "users.json";

#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
pub struct Options {
    /// Increase verbosity, and can be used multiple times
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Cron options for the daily verse broadcast
    #[arg(long, default_value_t = String::from("0 0 8 * * * *"))]
    pub verse_cron: String,

    /// Cron options for checking whether an event starts
    #[arg(long, default_value_t = String::from("0 * * * * * *"))]
    pub events_cron: String,

    /// Directory holding users.json, verses.json, quizzes.json and events.json
    #[arg(long, env = "DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Telegram ids allowed to run administrator commands
    #[arg(long, env = "ADMIN_IDS", value_delimiter = ',')]
    pub admin_ids: Vec<i64>,

    /// Keep registered users in memory only
    #[arg(long)]
    pub ephemeral: bool,
}

impl Options {
    pub fn users_file(&self) -> PathBuf {
        self.data_dir.join(USERS_FILE)
    }
}

pub fn parse() -> Result<Options> {
    let opts = Options::parse();

    let debug_level = match opts.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(debug_level)).init();

    check(&opts)?;

    Ok(opts)
}

fn check(opts: &Options) -> Result<()> {
    Schedule::from_str(&opts.verse_cron)
        .into_diagnostic()
        .wrap_err("invalid --verse-cron")?;
    Schedule::from_str(&opts.events_cron)
        .into_diagnostic()
        .wrap_err("invalid --events-cron")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let opts = Options::try_parse_from(["youth-bot"]).unwrap();
        assert!(check(&opts).is_ok());
        assert_eq!(opts.users_file(), PathBuf::from("data").join(USERS_FILE));
    }

    #[test]
    fn admin_ids_are_comma_separated() {
        let opts = Options::try_parse_from(["youth-bot", "--admin-ids", "11,22"]).unwrap();
        assert_eq!(opts.admin_ids, vec![11, 22]);
    }

    #[test]
    fn bad_cron_is_rejected() {
        let opts = Options::try_parse_from(["youth-bot", "--verse-cron", "at eight"]).unwrap();
        assert!(check(&opts).is_err());
    }
}
