//! Progress flags derived from save state, and the events raised when they
//! change between two snapshots.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::bridge::StorageBridge;
use crate::core_api::Session;
use crate::gen3::types::BADGE_COUNT;
use crate::gen3::variant::Title;
use crate::species::{LEGENDARIES, NATIONAL_DEX_SIZE};

/// Owned-count milestones over the union of every open save's dex.
pub const DEX_THRESHOLDS: [u16; 7] = [50, 100, 150, 200, 250, 300, 386];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleProgress {
    pub trainer_key: u32,
    pub play_time_seconds: u64,
    pub badges: [bool; BADGE_COUNT],
    pub champion: bool,
    pub national_dex: bool,
    /// National numbers, ascending.
    pub dex_owned: Vec<u16>,
}

impl TitleProgress {
    pub fn from_session(session: &Session) -> Self {
        let save = &session.document().save;
        Self {
            trainer_key: save.trainer.transfer_key(),
            play_time_seconds: save.trainer.play_time.total_seconds(),
            badges: save.badges(),
            champion: save.is_champion(),
            national_dex: save.dex.national_enabled,
            dex_owned: save
                .dex
                .owned_numbers()
                .into_iter()
                .filter(|&n| n <= NATIONAL_DEX_SIZE)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub titles: BTreeMap<Title, TitleProgress>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProgressFlag {
    Badge { title: Title, index: u8 },
    Champion { title: Title },
    NationalDex { title: Title },
    DexOwned { threshold: u16 },
    LegendaryOwned { national: u16 },
    AllTitlesStarted,
}

impl ProgressFlag {
    fn is_per_title(self) -> bool {
        matches!(
            self,
            Self::Badge { .. } | Self::Champion { .. } | Self::NationalDex { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProgressEvent {
    NewGameDetected { title: Title },
    Unlocked(ProgressFlag),
}

impl ProgressSnapshot {
    pub fn capture(bridge: &StorageBridge) -> Self {
        Self::from_sessions(bridge.sessions().map(|(_, session)| session))
    }

    pub fn from_sessions<'a>(sessions: impl IntoIterator<Item = &'a Session>) -> Self {
        Self {
            titles: sessions
                .into_iter()
                .map(|session| (session.title(), TitleProgress::from_session(session)))
                .collect(),
        }
    }

    pub fn owned_union(&self) -> BTreeSet<u16> {
        self.titles
            .values()
            .flat_map(|progress| progress.dex_owned.iter().copied())
            .collect()
    }

    /// Every flag that holds in this snapshot.
    pub fn flags(&self) -> BTreeSet<ProgressFlag> {
        let mut flags = BTreeSet::new();
        for (&title, progress) in &self.titles {
            for (index, &earned) in progress.badges.iter().enumerate() {
                if earned {
                    flags.insert(ProgressFlag::Badge {
                        title,
                        index: index as u8,
                    });
                }
            }
            if progress.champion {
                flags.insert(ProgressFlag::Champion { title });
            }
            if progress.national_dex {
                flags.insert(ProgressFlag::NationalDex { title });
            }
        }

        let owned = self.owned_union();
        for threshold in DEX_THRESHOLDS {
            if owned.len() >= threshold as usize {
                flags.insert(ProgressFlag::DexOwned { threshold });
            }
        }
        for national in LEGENDARIES {
            if owned.contains(&national) {
                flags.insert(ProgressFlag::LegendaryOwned { national });
            }
        }

        let started = Title::ALL.iter().all(|title| {
            self.titles
                .get(title)
                .is_some_and(|progress| progress.trainer_key != 0)
        });
        if started {
            flags.insert(ProgressFlag::AllTitlesStarted);
        }
        flags
    }
}

/// Events between two snapshots. Pure: the same inputs always give the same
/// set, and `evaluate(s, s)` is empty.
pub fn evaluate(previous: &ProgressSnapshot, current: &ProgressSnapshot) -> BTreeSet<ProgressEvent> {
    let mut events = BTreeSet::new();

    let mut baseline = previous.clone();
    for (&title, now) in &current.titles {
        let Some(before) = previous.titles.get(&title) else {
            continue;
        };
        if before.trainer_key != now.trainer_key
            || now.play_time_seconds < before.play_time_seconds
        {
            events.insert(ProgressEvent::NewGameDetected { title });
            baseline.titles.remove(&title);
        }
    }

    // Cross-save flags keep comparing against the real previous state.
    let mut before: BTreeSet<ProgressFlag> = baseline
        .flags()
        .into_iter()
        .filter(|flag| flag.is_per_title())
        .collect();
    before.extend(previous.flags().into_iter().filter(|flag| !flag.is_per_title()));

    events.extend(
        current
            .flags()
            .difference(&before)
            .map(|&flag| ProgressEvent::Unlocked(flag)),
    );
    events
}
