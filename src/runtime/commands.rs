//! Line commands read from stdin.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    /// Zero-based playlist index, or the current entry.
    Play(Option<usize>),
    Pause,
    Stop,
    Next,
    Prev,
    Shuffle,
    Loop,
    Exclude(String),
    Include(String),
    Filter(bool),
    Remove(usize),
    Import(PathBuf),
    Export(PathBuf),
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  list                 show the playlist
  play [n]             play entry n (1-based) or resume
  pause                toggle pause
  stop | next | prev   transport
  shuffle | loop       toggle playback modes
  exclude <segment>    skip a segment name
  include <segment>    stop skipping a segment name
  filter on|off        enable or disable segment skipping
  remove <n>           drop entry n from the playlist
  import <file>        append an m3u/m3u8 playlist
  export <file>        write the playlist as m3u/m3u8
  status               show what is playing
  quit";

/// Parse one input line. Playlist numbers are 1-based on the command line.
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };

    let cmd = match word.to_ascii_lowercase().as_str() {
        "list" | "ls" => Command::List,
        "play" | "p" => {
            if rest.is_empty() {
                Command::Play(None)
            } else {
                Command::Play(Some(entry_number(rest)?))
            }
        }
        "pause" => Command::Pause,
        "stop" => Command::Stop,
        "next" | "n" => Command::Next,
        "prev" => Command::Prev,
        "shuffle" => Command::Shuffle,
        "loop" => Command::Loop,
        "exclude" => Command::Exclude(argument(word, rest)?.to_string()),
        "include" => Command::Include(argument(word, rest)?.to_string()),
        "filter" => match rest.to_ascii_lowercase().as_str() {
            "on" => Command::Filter(true),
            "off" => Command::Filter(false),
            _ => return Err("usage: filter on|off".to_string()),
        },
        "remove" | "rm" => Command::Remove(entry_number(rest)?),
        "import" => Command::Import(PathBuf::from(argument(word, rest)?)),
        "export" => Command::Export(PathBuf::from(argument(word, rest)?)),
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        other => return Err(format!("unknown command: {other} (try `help`)")),
    };
    Ok(Some(cmd))
}

fn argument<'a>(word: &str, rest: &'a str) -> Result<&'a str, String> {
    if rest.is_empty() {
        Err(format!("{word} needs an argument"))
    } else {
        Ok(rest)
    }
}

fn entry_number(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(format!("not a playlist number: {s}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_transport_and_numbered_commands() {
        assert_eq!(parse("  ").unwrap(), None);
        assert_eq!(parse("play").unwrap(), Some(Command::Play(None)));
        assert_eq!(parse("PLAY 3").unwrap(), Some(Command::Play(Some(2))));
        assert_eq!(parse("rm 1").unwrap(), Some(Command::Remove(0)));
        assert_eq!(parse("q").unwrap(), Some(Command::Quit));
        assert!(parse("play 0").is_err());
        assert!(parse("remove").is_err());
    }

    #[test]
    fn parses_arguments_with_spaces() {
        assert_eq!(
            parse("export  my list.m3u8").unwrap(),
            Some(Command::Export(PathBuf::from("my list.m3u8")))
        );
        assert_eq!(
            parse("exclude SPC1.ACM").unwrap(),
            Some(Command::Exclude("SPC1.ACM".to_string()))
        );
        assert_eq!(parse("filter OFF").unwrap(), Some(Command::Filter(false)));
        assert!(parse("filter maybe").is_err());
        assert!(parse("import").is_err());
        assert!(parse("dance").is_err());
    }
}
