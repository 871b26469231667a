//! Command-line parsing
//!
//! Usage:
//!   moyeora new <name> [YYYY-MM-DD...] [--this-weekend] [--next-week]
//!               [--weekdays-next-week] [--range FROM..TO]
//!   moyeora show <room>
//!   moyeora join <room> <nickname>
//!   moyeora vote <room> <YYYY-MM-DD>
//!   moyeora locate <room> (--gps | <place...>)
//!   moyeora clear-location <room>
//!   moyeora title <room> <text...>
//!   moyeora spin <room>
//!   moyeora share <room>
//!   moyeora watch <room>
//!   moyeora feed-server [addr]
//!
//! `<room>` is a share link or a bare room code.

use std::net::SocketAddr;

use chrono::NaiveDate;
use moyeora_core::{parse_date, QuickPick};
use moyeora_net::RoomLink;
use uuid::Uuid;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum LocateTarget {
    Gps,
    Place(String),
}

/// Date selection for a new room
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DateSelection {
    pub dates: Vec<NaiveDate>,
    pub picks: Vec<QuickPick>,
    pub ranges: Vec<(NaiveDate, NaiveDate)>,
}

impl DateSelection {
    /// Resolve relative picks against `today`
    pub fn resolve(&self, today: NaiveDate) -> moyeora_core::Result<Vec<NaiveDate>> {
        let mut dates = self.dates.clone();
        for pick in &self.picks {
            dates.extend(pick.dates(today));
        }
        for (from, to) in &self.ranges {
            dates.extend(moyeora_core::expand_range(*from, *to, today)?);
        }
        Ok(dates)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    New { name: String, selection: DateSelection },
    Show { room_id: Uuid },
    Join { room_id: Uuid, nickname: String },
    Vote { room_id: Uuid, date: NaiveDate },
    Locate { room_id: Uuid, target: LocateTarget },
    ClearLocation { room_id: Uuid },
    Title { room_id: Uuid, title: String },
    Spin { room_id: Uuid },
    Share { room_id: Uuid },
    Watch { room_id: Uuid },
    FeedServer { addr: Option<SocketAddr> },
    Help,
}

pub fn print_usage() {
    eprintln!("moyeora - 날짜 투표, 중간 위치, 총무 선정을 한 곳에서");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  moyeora new <name> [dates...] [options]   Create a room");
    eprintln!("      --this-weekend                        Add the coming Saturday and Sunday");
    eprintln!("      --weekdays-next-week                  Add Monday to Friday of next week");
    eprintln!("      --next-week                           Add all of next week");
    eprintln!("      --range FROM..TO                      Add every date in a range");
    eprintln!("  moyeora show <room>                       Show a room");
    eprintln!("  moyeora join <room> <nickname>            Join (or rejoin) a room");
    eprintln!("  moyeora vote <room> <date>                Toggle your vote for a date");
    eprintln!("  moyeora locate <room> --gps               Register the device position");
    eprintln!("  moyeora locate <room> <place...>          Register a place by name");
    eprintln!("  moyeora clear-location <room>             Remove your location");
    eprintln!("  moyeora title <room> <text...>            Rename the treasurer roulette");
    eprintln!("  moyeora spin <room>                       Pick the treasurer");
    eprintln!("  moyeora share <room>                      Print the invitation");
    eprintln!("  moyeora watch <room>                      Follow live changes");
    eprintln!("  moyeora feed-server [addr]                Run the change feed hub");
    eprintln!();
    eprintln!("<room> is a share link or a room code. Dates are YYYY-MM-DD.");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  MOYEORA_CONFIG            Config file path");
    eprintln!("  MOYEORA_DEVICE_LOCATION   Device position as lat,lng");
    eprintln!("  RUST_LOG                  Log filter (logs go to stderr)");
}

fn usage(msg: impl Into<String>) -> AppError {
    AppError::Usage(msg.into())
}

fn room_arg(args: &[String], cmd: &str) -> Result<Uuid> {
    let raw = args
        .get(1)
        .ok_or_else(|| usage(format!("{} requires a room link or code", cmd)))?;
    Ok(RoomLink::room_id_from(raw)?)
}

/// Everything after the room argument, joined with spaces
fn rest_text(args: &[String], cmd: &str, what: &str) -> Result<String> {
    let text = args.get(2..).unwrap_or_default().join(" ");
    if text.trim().is_empty() {
        return Err(usage(format!("{} requires {}", cmd, what)));
    }
    Ok(text)
}

fn parse_range(value: &str) -> Result<(NaiveDate, NaiveDate)> {
    let (from, to) = value
        .split_once("..")
        .ok_or_else(|| usage(format!("Invalid range '{}': expected FROM..TO", value)))?;
    Ok((parse_date(from)?, parse_date(to)?))
}

fn parse_new(args: &[String]) -> Result<Command> {
    let name = args
        .get(1)
        .ok_or_else(|| usage("new requires a room name"))?
        .clone();

    let mut selection = DateSelection::default();
    let mut rest = args[2..].iter();
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--this-weekend" => selection.picks.push(QuickPick::ThisWeekend),
            "--weekdays-next-week" => selection.picks.push(QuickPick::NextWeekWeekdays),
            "--next-week" => selection.picks.push(QuickPick::NextWeek),
            "--range" => {
                let value = rest
                    .next()
                    .ok_or_else(|| usage("--range requires FROM..TO"))?;
                selection.ranges.push(parse_range(value)?);
            }
            flag if flag.starts_with("--") => {
                return Err(usage(format!("Unknown option '{}'", flag)));
            }
            date => selection.dates.push(parse_date(date)?),
        }
    }

    Ok(Command::New { name, selection })
}

/// Parse arguments without the program name
pub fn parse(args: &[String]) -> Result<Command> {
    let Some(cmd) = args.first() else {
        return Ok(Command::Help);
    };

    let command = match cmd.as_str() {
        "help" | "-h" | "--help" => Command::Help,
        "new" => parse_new(args)?,
        "show" => Command::Show {
            room_id: room_arg(args, cmd)?,
        },
        "join" => Command::Join {
            room_id: room_arg(args, cmd)?,
            nickname: rest_text(args, cmd, "a nickname")?,
        },
        "vote" => {
            let room_id = room_arg(args, cmd)?;
            let date = args
                .get(2)
                .ok_or_else(|| usage("vote requires a date"))?;
            Command::Vote {
                room_id,
                date: parse_date(date)?,
            }
        }
        "locate" => {
            let room_id = room_arg(args, cmd)?;
            let target = match args.get(2).map(String::as_str) {
                Some("--gps") => LocateTarget::Gps,
                _ => LocateTarget::Place(rest_text(args, cmd, "--gps or a place name")?),
            };
            Command::Locate { room_id, target }
        }
        "clear-location" => Command::ClearLocation {
            room_id: room_arg(args, cmd)?,
        },
        "title" => Command::Title {
            room_id: room_arg(args, cmd)?,
            title: args.get(2..).unwrap_or_default().join(" "),
        },
        "spin" => Command::Spin {
            room_id: room_arg(args, cmd)?,
        },
        "share" => Command::Share {
            room_id: room_arg(args, cmd)?,
        },
        "watch" => Command::Watch {
            room_id: room_arg(args, cmd)?,
        },
        "feed-server" => {
            let addr = match args.get(1) {
                Some(raw) => Some(
                    raw.parse()
                        .map_err(|_| usage(format!("Invalid address '{}'", raw)))?,
                ),
                None => None,
            };
            Command::FeedServer { addr }
        }
        other => return Err(usage(format!("Unknown command '{}'", other))),
    };

    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOM: &str = "550e8400-e29b-41d4-a716-446655440000";

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn room_id() -> Uuid {
        Uuid::parse_str(ROOM).unwrap()
    }

    fn d(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn test_new_with_dates_and_picks() {
        let cmd = parse(&args(&[
            "new",
            "금요일 번개",
            "2025-06-06",
            "--this-weekend",
            "--range",
            "2025-06-10..2025-06-12",
        ]))
        .unwrap();

        match cmd {
            Command::New { name, selection } => {
                assert_eq!(name, "금요일 번개");
                assert_eq!(selection.dates, vec![d("2025-06-06")]);
                assert_eq!(selection.picks, vec![QuickPick::ThisWeekend]);
                assert_eq!(selection.ranges, vec![(d("2025-06-10"), d("2025-06-12"))]);

                let resolved = selection.resolve(d("2025-06-04")).unwrap();
                assert!(resolved.contains(&d("2025-06-07")));
                assert!(resolved.contains(&d("2025-06-08")));
                assert!(resolved.contains(&d("2025-06-11")));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_room_argument_accepts_link() {
        let link = format!("https://moyeora.app/room/{}", ROOM);
        assert_eq!(
            parse(&args(&["show", &link])).unwrap(),
            Command::Show { room_id: room_id() }
        );
        assert_eq!(
            parse(&args(&["join", ROOM, "김", "철수"])).unwrap(),
            Command::Join {
                room_id: room_id(),
                nickname: "김 철수".into()
            }
        );
    }

    #[test]
    fn test_locate_variants() {
        assert_eq!(
            parse(&args(&["locate", ROOM, "--gps"])).unwrap(),
            Command::Locate {
                room_id: room_id(),
                target: LocateTarget::Gps
            }
        );
        assert_eq!(
            parse(&args(&["locate", ROOM, "강남역", "2번", "출구"])).unwrap(),
            Command::Locate {
                room_id: room_id(),
                target: LocateTarget::Place("강남역 2번 출구".into())
            }
        );
        assert!(parse(&args(&["locate", ROOM])).is_err());
    }

    #[test]
    fn test_title_may_be_blank() {
        assert_eq!(
            parse(&args(&["title", ROOM])).unwrap(),
            Command::Title {
                room_id: room_id(),
                title: String::new()
            }
        );
    }

    #[test]
    fn test_errors() {
        assert!(matches!(parse(&args(&["bogus"])), Err(AppError::Usage(_))));
        assert!(matches!(parse(&args(&["show"])), Err(AppError::Usage(_))));
        assert!(matches!(parse(&args(&["show", "abc"])), Err(AppError::Net(_))));
        assert!(matches!(
            parse(&args(&["vote", ROOM, "tomorrow"])),
            Err(AppError::Core(_))
        ));
        assert!(parse(&args(&["new", "x", "--someday"])).is_err());
        assert!(parse(&args(&["feed-server", "nowhere"])).is_err());
        assert_eq!(parse(&[]).unwrap(), Command::Help);
    }

    #[test]
    fn test_feed_server_addr() {
        assert_eq!(
            parse(&args(&["feed-server", "0.0.0.0:7341"])).unwrap(),
            Command::FeedServer {
                addr: Some("0.0.0.0:7341".parse().unwrap())
            }
        );
    }
}
