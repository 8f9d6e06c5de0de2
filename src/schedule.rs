//! Weekly schedule grid and the resolver that turns it into a desired state.
//!
//! The grid is 7 days × 24 hours. Each cell holds a [`SlotState`]; a `Half`
//! cell covers the first thirty minutes of its hour. The resolver runs at
//! thirty-minute resolution and never fails: any cell that was never set
//! reads back as `Empty`.

use chrono::{Datelike, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const DAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

pub const HOURS_PER_DAY: u32 = 24;

// =========================================================================
// Slot state
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotState {
    #[default]
    Empty,
    Full,
    Half,
}

impl SlotState {
    /// Decode the persisted integer form (0, 1, 2).
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(Self::Empty),
            1 => Some(Self::Full),
            2 => Some(Self::Half),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Full => 1,
            Self::Half => 2,
        }
    }
}

impl FromStr for SlotState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "empty" | "off" | "0" => Ok(Self::Empty),
            "full" | "on" | "1" => Ok(Self::Full),
            "half" | "2" => Ok(Self::Half),
            other => Err(format!("unknown slot state '{other}' (empty, full, half)")),
        }
    }
}

// =========================================================================
// Mode
// =========================================================================

/// Whether the schedule marks restricted windows or allowed windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Blacklist,
    Whitelist,
}

impl Mode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Blacklist => Self::Whitelist,
            Self::Whitelist => Self::Blacklist,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blacklist => "blacklist",
            Self::Whitelist => "whitelist",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "blacklist" => Ok(Self::Blacklist),
            "whitelist" => Ok(Self::Whitelist),
            other => Err(format!("unknown mode '{other}' (blacklist, whitelist)")),
        }
    }
}

// =========================================================================
// Weekly schedule
// =========================================================================

/// Sparse 7×24 grid. Only non-empty cells are stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, serde_json::Value>",
    into = "BTreeMap<String, u8>"
)]
pub struct WeeklySchedule {
    slots: BTreeMap<(u32, u32), SlotState>,
}

impl WeeklySchedule {
    pub fn get(&self, day: Weekday, hour: u32) -> SlotState {
        self.slots
            .get(&(day.num_days_from_monday(), hour))
            .copied()
            .unwrap_or_default()
    }

    /// Set one cell. Hours outside 0..24 are ignored.
    pub fn set(&mut self, day: Weekday, hour: u32, state: SlotState) {
        if hour >= HOURS_PER_DAY {
            return;
        }
        let key = (day.num_days_from_monday(), hour);
        if state == SlotState::Empty {
            self.slots.remove(&key);
        } else {
            self.slots.insert(key, state);
        }
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of non-empty cells.
    pub fn active_slots(&self) -> usize {
        self.slots.len()
    }
}

/// Format a grid key the way it is persisted: `"Mon,9"`.
pub fn slot_key(day: Weekday, hour: u32) -> String {
    format!("{day},{hour}")
}

/// Parse a `"<Day>,<Hour>"` key. Malformed keys yield `None`.
pub fn parse_slot_key(key: &str) -> Option<(Weekday, u32)> {
    let (day, hour) = key.split_once(',')?;
    let day = parse_day(day.trim())?;
    let hour: u32 = hour.trim().parse().ok()?;
    (hour < HOURS_PER_DAY).then_some((day, hour))
}

/// Accepts the three-letter abbreviation used on disk (and chrono's longer forms).
pub fn parse_day(s: &str) -> Option<Weekday> {
    s.parse::<Weekday>().ok()
}

impl From<BTreeMap<String, serde_json::Value>> for WeeklySchedule {
    fn from(raw: BTreeMap<String, serde_json::Value>) -> Self {
        let mut schedule = WeeklySchedule::default();
        for (key, value) in raw {
            let slot = parse_slot_key(&key);
            let state = value.as_u64().and_then(SlotState::from_code);
            match (slot, state) {
                (Some((day, hour)), Some(state)) => schedule.set(day, hour, state),
                _ => log::debug!("Skipping schedule entry {key:?} = {value}"),
            }
        }
        schedule
    }
}

impl From<WeeklySchedule> for BTreeMap<String, u8> {
    fn from(schedule: WeeklySchedule) -> Self {
        let mut out = BTreeMap::new();
        for day in DAYS {
            for hour in 0..HOURS_PER_DAY {
                out.insert(slot_key(day, hour), schedule.get(day, hour).code());
            }
        }
        out
    }
}

// =========================================================================
// Schedule configuration
// =========================================================================

/// Each mode owns its own grid; switching modes leaves the other intact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub enabled: bool,
    pub mode: Mode,
    pub blacklist: WeeklySchedule,
    pub whitelist: WeeklySchedule,
}

impl ScheduleConfig {
    pub fn grid(&self, mode: Mode) -> &WeeklySchedule {
        match mode {
            Mode::Blacklist => &self.blacklist,
            Mode::Whitelist => &self.whitelist,
        }
    }

    pub fn grid_mut(&mut self, mode: Mode) -> &mut WeeklySchedule {
        match mode {
            Mode::Blacklist => &mut self.blacklist,
            Mode::Whitelist => &mut self.whitelist,
        }
    }

    pub fn active_grid(&self) -> &WeeklySchedule {
        self.grid(self.mode)
    }
}

// =========================================================================
// Resolver
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Block,
    Unblock,
    NoOp,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Block => "block",
            Self::Unblock => "unblock",
            Self::NoOp => "none",
        })
    }
}

/// Whether the grid has a rule in force at `day hour:minute`.
///
/// A `Half` cell is checked against the current minute (< 30) and the
/// previous hour's `Half` against minute >= 30. The previous hour never
/// wraps across midnight.
pub fn rule_active(grid: &WeeklySchedule, day: Weekday, hour: u32, minute: u32) -> bool {
    let current = grid.get(day, hour);
    let prev = if hour > 0 {
        grid.get(day, hour - 1)
    } else {
        SlotState::Empty
    };

    current == SlotState::Full
        || (current == SlotState::Half && minute < 30)
        || (prev == SlotState::Half && minute >= 30)
}

/// Compute the desired system state for `now`.
pub fn resolve<T: Datelike + Timelike>(config: &ScheduleConfig, now: &T) -> Action {
    if !config.enabled {
        return Action::NoOp;
    }

    let active = rule_active(config.active_grid(), now.weekday(), now.hour(), now.minute());

    match (config.mode, active) {
        (Mode::Blacklist, true) | (Mode::Whitelist, false) => Action::Block,
        (Mode::Blacklist, false) | (Mode::Whitelist, true) => Action::Unblock,
    }
}

// =========================================================================
// Tests
// =========================================================================
