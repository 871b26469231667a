//! Command execution
//!
//! Each command loads what it needs, performs at most one write, then
//! announces the write on the change feed and prints the refreshed view.

use std::io::Write;
use std::net::SocketAddr;

use chrono::{Local, NaiveDate};
use moyeora_core::{
    location, Database, Error as CoreError, LocalStore, NewRoom, Room, RoomLocalState,
    RoomRepository, RoomSession,
};
use moyeora_net::{ChangeKind, ChangeSource, FeedEvent, FeedServer, RoomLink};
use tracing::{info, warn};

use crate::cli::{Command, DateSelection, LocateTarget};
use crate::device::DeviceLocator;
use crate::error::{AppError, Result};
use crate::feed;
use crate::geocode::Geocoder;
use crate::render;
use crate::state::AppState;

type Session<'a> = RoomSession<'a, Database, LocalStore>;

/// Create a room from a date selection and remember its host token
pub fn create_room(
    state: &AppState,
    name: &str,
    selection: &DateSelection,
    today: NaiveDate,
) -> Result<Room> {
    let new_room = NewRoom::new(name, selection.resolve(today)?)?;
    let room = state.db.create_room(&new_room)?;
    state.local.save_host_token(room.id, &room.host_token)?;
    info!(room_id = %room.id, dates = room.candidate_dates.len(), "Room created");
    Ok(room)
}

fn ensure_joined(session: &Session<'_>) -> Result<()> {
    match session.current_participant() {
        Some(_) => Ok(()),
        None => Err(CoreError::InvalidOperation(
            "join the room first: moyeora join <room> <nickname>".into(),
        )
        .into()),
    }
}

fn print_room(out: &mut dyn Write, session: &Session<'_>) -> Result<()> {
    write!(out, "{}", render::room(session))?;
    Ok(())
}

/// Run a command that needs the stores
pub async fn execute(state: &AppState, command: Command, out: &mut dyn Write) -> Result<()> {
    let config = &state.config;

    match command {
        Command::New { name, selection } => {
            let room = create_room(state, &name, &selection, Local::now().date_naive())?;
            feed::announce(&config.feed, room.id, ChangeSource::Room, ChangeKind::Insert).await;

            let link = RoomLink::new(&config.share.base_url, room.id);
            writeln!(out, "약속방이 만들어졌어요: {}", room.name)?;
            writeln!(out, "코드: {}", room.id)?;
            writeln!(out, "링크: {}", link)?;
        }

        Command::Show { room_id } => {
            print_room(out, &state.session(room_id)?)?;
        }

        Command::Join { room_id, nickname } => {
            let mut session = state.session(room_id)?;
            let outcome = session.join(&nickname)?;
            if outcome.rejoined {
                writeln!(out, "다시 오셨네요, {}님", outcome.participant.nickname)?;
            } else {
                feed::announce(&config.feed, room_id, ChangeSource::Participants, ChangeKind::Insert)
                    .await;
                writeln!(out, "{}님으로 참여했어요", outcome.participant.nickname)?;
            }
            print_room(out, &session)?;
        }

        Command::Vote { room_id, date } => {
            let mut session = state.session(room_id)?;
            session.toggle_vote(date)?;
            feed::announce(&config.feed, room_id, ChangeSource::Participants, ChangeKind::Update).await;
            print_room(out, &session)?;
        }

        Command::Locate { room_id, target } => {
            let mut session = state.session(room_id)?;
            ensure_joined(&session)?;

            let update = match target {
                LocateTarget::Gps => {
                    let position = DeviceLocator::from_env(&config.device)?.current_position()?;
                    location::gps(position)
                }
                LocateTarget::Place(place) => {
                    let resolved = Geocoder::new(config.geocoder.clone())?.lookup(&place).await?;
                    let (update, warning) = location::manual(&place, resolved)
                        .ok_or_else(|| AppError::Usage("place name is empty".into()))?;
                    if let Some(warning) = warning {
                        warn!(%room_id, place = %place, "Place did not resolve to coordinates");
                        writeln!(out, "{}", render::location_warning(&warning))?;
                    }
                    update
                }
            };

            session.set_location(&update)?;
            feed::announce(&config.feed, room_id, ChangeSource::Participants, ChangeKind::Update).await;
            writeln!(out, "위치 등록됨")?;
            print_room(out, &session)?;
        }

        Command::ClearLocation { room_id } => {
            let mut session = state.session(room_id)?;
            ensure_joined(&session)?;
            session.clear_location()?;
            feed::announce(&config.feed, room_id, ChangeSource::Participants, ChangeKind::Update).await;
            print_room(out, &session)?;
        }

        Command::Title { room_id, title } => {
            let mut session = state.session(room_id)?;
            if session.set_roulette_title(&title)? {
                feed::announce(&config.feed, room_id, ChangeSource::Room, ChangeKind::Update).await;
            } else {
                writeln!(out, "제목이 비어 있어 그대로 둡니다")?;
            }
            print_room(out, &session)?;
        }

        Command::Spin { room_id } => {
            let mut session = state.session(room_id)?;
            spin(&mut session, state, out).await?;
        }

        Command::Share { room_id } => {
            let session = state.session(room_id)?;
            let link = RoomLink::new(&config.share.base_url, room_id);
            write!(out, "{}", render::share(&session.room().name, &link.to_url()))?;
            writeln!(out, "코드: {}", room_id)?;
        }

        Command::Watch { room_id } => {
            let mut session = state.session(room_id)?;
            watch(&mut session, state, out).await?;
        }

        Command::FeedServer { addr } => {
            run_feed_server(addr.unwrap_or(config.feed.addr)).await?;
        }

        Command::Help => crate::cli::print_usage(),
    }

    Ok(())
}

async fn spin(session: &mut Session<'_>, state: &AppState, out: &mut dyn Write) -> Result<()> {
    let room_id = session.room().id;
    if let Some(winner) = session.roulette().winner() {
        writeln!(out, "이미 총무가 정해졌어요: {}", winner)?;
        return Ok(());
    }

    let spin = session.start_roulette(&mut rand::thread_rng())?;
    let title = session.room().display_roulette_title().to_string();
    for step in spin.steps(state.config.roulette.timing()) {
        write!(out, "\r{}", render::spin_frame(&title, &step))?;
        out.flush()?;
        tokio::time::sleep(step.delay).await;
    }
    writeln!(out)?;

    match session.finish_roulette() {
        Ok(commit) => {
            writeln!(out, "{}", render::treasurer_result(&commit))?;
            feed::announce(&state.config.feed, room_id, ChangeSource::Room, ChangeKind::Update).await;
            Ok(())
        }
        Err(e) => {
            // The drawn winner is still shown even though it was not saved
            writeln!(out, "🎉 오늘의 총무는 {}", spin.winner())?;
            Err(e.into())
        }
    }
}

async fn watch(session: &mut Session<'_>, state: &AppState, out: &mut dyn Write) -> Result<()> {
    if !state.config.feed.enabled {
        return Err(AppError::Usage("the change feed is disabled in config".into()));
    }
    let room_id = session.room().id;

    print_room(out, session)?;
    let mut client = feed::connect(&state.config.feed).await?;
    client.subscribe(room_id).await?;

    loop {
        tokio::select! {
            event = client.next_event() => match event {
                Some(FeedEvent::Subscribed { .. }) => info!(%room_id, "Watching room"),
                Some(FeedEvent::Changed(change)) => {
                    info!(%room_id, source = ?change.source, "Room changed; reloading");
                    session.reload()?;
                    writeln!(out)?;
                    print_room(out, session)?;
                }
                Some(FeedEvent::Pong) => {}
                Some(FeedEvent::ServerShutdown) | Some(FeedEvent::Disconnected) | None => {
                    warn!(%room_id, "Change feed went away");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                client.disconnect().await;
                break;
            }
        }
    }

    Ok(())
}

/// Run the change feed hub until interrupted
pub async fn run_feed_server(addr: SocketAddr) -> Result<()> {
    let server = FeedServer::start(addr).await?;
    println!("change feed listening on {}", server.addr());
    tokio::signal::ctrl_c().await?;
    server.shutdown().await;
    Ok(())
}
