//! Text views
//!
//! Everything printed to stdout is built here so commands stay thin.

use std::fmt::Write;

use moyeora_core::roulette::MIN_PARTICIPANTS;
use moyeora_core::{
    format_date, map_link, Authority, LocalStateRepository, LocationWarning, RoomSession, Roulette,
    SpinStep, Storage, TreasurerCommit,
};

/// Full room view
pub fn room<S, L>(session: &RoomSession<'_, S, L>) -> String
where
    S: Storage + ?Sized,
    L: LocalStateRepository + ?Sized,
{
    let room = session.room();
    let participants = session.participants();
    let me = session.current_participant();
    let mut out = String::new();

    let _ = writeln!(out, "📅 {}", room.name);
    let mut header = format!("참여자 {}명", participants.len());
    if session.authority() == Authority::Host {
        header.push_str(" · 호스트");
    }
    if let Some(me) = me {
        let _ = write!(header, " · 나: {}", me.nickname);
    }
    let _ = writeln!(out, "{}", header);

    let _ = writeln!(out, "\n[일정]");
    for entry in session.tally().entries() {
        let mut line = format!("  {:<10} {}표", format_date(entry.date), entry.votes);
        if entry.leading {
            line.push_str(" ★");
        }
        if me.is_some_and(|p| p.has_voted_for(entry.date)) {
            line.push_str(" ✓");
        }
        let _ = writeln!(out, "{}", line);
    }

    let _ = writeln!(out, "\n[중간위치]");
    let my_place = me
        .and_then(|p| p.location_name.as_deref())
        .unwrap_or("미등록");
    let _ = writeln!(out, "  내 위치: {}", my_place);
    match session.midpoint() {
        Some(mid) => {
            let _ = writeln!(out, "  중간 지점: {:.4}, {:.4}", mid.lat, mid.lng);
            let _ = writeln!(out, "  지도: {}", map_link(mid));
        }
        None => {
            let _ = writeln!(out, "  중간 지점: 좌표가 등록된 참여자가 없습니다");
        }
    }
    let _ = writeln!(
        out,
        "  {}/{}명 위치 등록",
        session.located_count(),
        participants.len()
    );

    let _ = writeln!(out, "\n[총무]");
    match session.roulette() {
        Roulette::Settled { winner } => {
            let _ = writeln!(out, "  오늘의 총무는 {}", winner);
        }
        _ if participants.len() < MIN_PARTICIPANTS => {
            let _ = writeln!(
                out,
                "  {} (참여자 {}명 이상부터 돌릴 수 있어요)",
                room.display_roulette_title(),
                MIN_PARTICIPANTS
            );
        }
        _ => {
            let _ = writeln!(out, "  {} · 돌리기 가능", room.display_roulette_title());
        }
    }

    out
}

pub fn not_found() -> String {
    "약속방을 찾을 수 없습니다\n\n  홈으로: moyeora new <약속 이름> [날짜...]\n".to_string()
}

pub fn share(room_name: &str, url: &str) -> String {
    format!("모여라 - {}\n약속에 참여해주세요!\n{}\n", room_name, url)
}

pub fn spin_frame(title: &str, step: &SpinStep) -> String {
    format!("🎰 {}  ▶ {}", title, step.nickname)
}

pub fn treasurer_result(commit: &TreasurerCommit) -> String {
    match commit {
        TreasurerCommit::Committed { winner } => {
            format!("🎉 축하합니다! 오늘의 총무는 {}", winner)
        }
        TreasurerCommit::AlreadyDecided { treasurer } => {
            format!("이미 총무가 정해졌어요: {}", treasurer)
        }
    }
}

pub fn location_warning(warning: &LocationWarning) -> String {
    format!("⚠ {}", warning.message())
}
