use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Validate { root: PathBuf, relative: String },
    Prune { directory: PathBuf, pattern: String, limit: usize },
    Backup { root: PathBuf, files: Vec<PathBuf>, settings: Option<PathBuf> },
    Watch { root: PathBuf, settings: Option<PathBuf> },
    Help,
}

impl CliCommand {
    pub fn parse_from_env() -> Result<Self> {
        Self::parse(env::args())
    }

    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut iter = args.into_iter().map(|arg| arg.as_ref().to_string());
        let _ = iter.next(); // skip program name if present
        let Some(command) = iter.next() else {
            return Ok(CliCommand::Help);
        };
        let mut positional = Vec::new();
        let mut settings = None;
        while let Some(arg) = iter.next() {
            if let Some(flag) = arg.strip_prefix("--") {
                let value = iter.next().ok_or_else(|| anyhow!("Expected a value after '{arg}'"))?;
                match flag {
                    "settings" => settings = Some(PathBuf::from(value)),
                    _ => bail!("Unknown flag '{arg}'. Supported flags: --settings."),
                }
            } else {
                positional.push(arg);
            }
        }

        match command.as_str() {
            "validate" => {
                let [root, relative] = take_exact::<2>(positional, "validate <root> <relative>")?;
                Ok(CliCommand::Validate { root: PathBuf::from(root), relative })
            }
            "prune" => {
                let [directory, pattern, limit] = take_exact::<3>(positional, "prune <dir> <glob> <limit>")?;
                let limit = limit.parse::<usize>().with_context(|| format!("Invalid limit '{limit}'"))?;
                if limit == 0 {
                    bail!("Limit must be at least 1");
                }
                Ok(CliCommand::Prune { directory: PathBuf::from(directory), pattern, limit })
            }
            "backup" => {
                let mut positional = positional.into_iter();
                let root = positional.next().ok_or_else(|| anyhow!("Usage: backup <root> <file>..."))?;
                let files: Vec<PathBuf> = positional.map(PathBuf::from).collect();
                if files.is_empty() {
                    bail!("backup needs at least one file");
                }
                Ok(CliCommand::Backup { root: PathBuf::from(root), files, settings })
            }
            "watch" => {
                let [root] = take_exact::<1>(positional, "watch <root>")?;
                Ok(CliCommand::Watch { root: PathBuf::from(root), settings })
            }
            "help" | "-h" | "--help" => Ok(CliCommand::Help),
            other => bail!("Unknown command '{other}'. Use validate, prune, backup or watch."),
        }
    }
}

fn take_exact<const N: usize>(values: Vec<String>, usage: &str) -> Result<[String; N]> {
    let count = values.len();
    values.try_into().map_err(|_| anyhow!("Expected {N} argument(s), got {count}. Usage: {usage}"))
}

pub fn usage() -> &'static str {
    "kestrel_autosave

Usage:
  kestrel_autosave validate <root> <relative>
  kestrel_autosave prune <dir> <glob> <limit>
  kestrel_autosave backup <root> <file>... [--settings <json>]
  kestrel_autosave watch <root> [--settings <json>]"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_prune() {
        let command = CliCommand::parse(["app", "prune", "backups/Level", "*.scene", "5"]).expect("parse");
        assert_eq!(
            command,
            CliCommand::Prune { directory: PathBuf::from("backups/Level"), pattern: "*.scene".into(), limit: 5 }
        );
    }

    #[test]
    fn settings_flag_can_appear_anywhere() {
        let command =
            CliCommand::parse(["app", "backup", "--settings", "cfg.json", "Assets", "Enemy.prefab"]).expect("parse");
        assert_eq!(
            command,
            CliCommand::Backup {
                root: PathBuf::from("Assets"),
                files: vec![PathBuf::from("Enemy.prefab")],
                settings: Some(PathBuf::from("cfg.json")),
            }
        );
    }

    #[test]
    fn missing_arguments_error() {
        let err = CliCommand::parse(["app", "validate", "Assets"]).unwrap_err();
        assert!(err.to_string().contains("Expected 2 argument(s)"));
        let err = CliCommand::parse(["app", "prune", "dir", "*.scene", "0"]).unwrap_err();
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn rejects_unknown_flags_and_commands() {
        assert!(CliCommand::parse(["app", "watch", "--foo", "bar"]).unwrap_err().to_string().contains("Unknown flag"));
        assert!(CliCommand::parse(["app", "explode"]).unwrap_err().to_string().contains("Unknown command"));
        assert_eq!(CliCommand::parse(["app"]).expect("parse"), CliCommand::Help);
    }
}
