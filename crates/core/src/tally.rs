//! Vote tally
//!
//! Counts are recomputed from participant state on every call; nothing is cached.

use chrono::NaiveDate;

use crate::models::{Participant, Room};

/// Number of participants whose vote set contains `date`
pub fn count_votes(participants: &[Participant], date: NaiveDate) -> usize {
    participants
        .iter()
        .filter(|p| p.voted_dates.contains(&date))
        .count()
}

/// Vote count for one candidate date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTally {
    pub date: NaiveDate,
    pub votes: usize,
    /// Count equals the maximum and the maximum is above zero; ties all lead
    pub leading: bool,
}

/// Tally over every candidate date of a room, ascending by date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteTally {
    entries: Vec<DateTally>,
    max_votes: usize,
}

impl VoteTally {
    pub fn compute(room: &Room, participants: &[Participant]) -> Self {
        let counts: Vec<(NaiveDate, usize)> = room
            .candidate_dates
            .iter()
            .map(|&date| (date, count_votes(participants, date)))
            .collect();

        let max_votes = counts.iter().map(|(_, votes)| *votes).max().unwrap_or(0);

        let entries = counts
            .into_iter()
            .map(|(date, votes)| DateTally {
                date,
                votes,
                leading: max_votes > 0 && votes == max_votes,
            })
            .collect();

        Self { entries, max_votes }
    }

    pub fn entries(&self) -> &[DateTally] {
        &self.entries
    }

    pub fn max_votes(&self) -> usize {
        self.max_votes
    }

    /// All dates sharing the top count; empty when nobody voted
    pub fn leading_dates(&self) -> Vec<NaiveDate> {
        self.entries
            .iter()
            .filter(|e| e.leading)
            .map(|e| e.date)
            .collect()
    }

    pub fn votes_for(&self, date: NaiveDate) -> Option<usize> {
        self.entries.iter().find(|e| e.date == date).map(|e| e.votes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{date, participant_with_votes, room_with_dates};

    #[test]
    fn test_count_votes_matches_definition() {
        let room = room_with_dates(&["2025-06-06", "2025-06-07"]);
        let participants = vec![
            participant_with_votes(&room, "A", &["2025-06-06"]),
            participant_with_votes(&room, "B", &["2025-06-06", "2025-06-07"]),
            participant_with_votes(&room, "C", &[]),
        ];

        for d in &room.candidate_dates {
            let expected = participants
                .iter()
                .filter(|p| p.voted_dates.contains(d))
                .count();
            assert_eq!(count_votes(&participants, *d), expected);
        }
    }

    #[test]
    fn test_tally_example() {
        let room = room_with_dates(&["2025-06-06", "2025-06-07"]);
        let participants = vec![
            participant_with_votes(&room, "A", &["2025-06-06"]),
            participant_with_votes(&room, "B", &["2025-06-06", "2025-06-07"]),
            participant_with_votes(&room, "C", &[]),
        ];

        let tally = VoteTally::compute(&room, &participants);
        assert_eq!(tally.votes_for(date("2025-06-06")), Some(2));
        assert_eq!(tally.votes_for(date("2025-06-07")), Some(1));
        assert_eq!(tally.leading_dates(), vec![date("2025-06-06")]);
        assert_eq!(tally.max_votes(), 2);
    }

    #[test]
    fn test_all_zero_has_no_leader() {
        let room = room_with_dates(&["2025-06-06", "2025-06-07"]);
        let participants = vec![participant_with_votes(&room, "A", &[])];

        let tally = VoteTally::compute(&room, &participants);
        assert!(tally.leading_dates().is_empty());
        assert!(tally.entries().iter().all(|e| !e.leading));
    }

    #[test]
    fn test_ties_are_not_broken() {
        let room = room_with_dates(&["2025-06-06", "2025-06-07", "2025-06-08"]);
        let participants = vec![
            participant_with_votes(&room, "A", &["2025-06-06"]),
            participant_with_votes(&room, "B", &["2025-06-08"]),
        ];

        let tally = VoteTally::compute(&room, &participants);
        assert_eq!(
            tally.leading_dates(),
            vec![date("2025-06-06"), date("2025-06-08")]
        );
    }

    #[test]
    fn test_entries_sorted_ascending() {
        let room = room_with_dates(&["2025-06-09", "2025-06-01", "2025-06-05"]);
        let tally = VoteTally::compute(&room, &[]);
        let dates: Vec<_> = tally.entries().iter().map(|e| e.date).collect();
        assert_eq!(
            dates,
            vec![date("2025-06-01"), date("2025-06-05"), date("2025-06-09")]
        );
    }
}
