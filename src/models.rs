use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use strum_macros::{Display, EnumIter, EnumString};

/// Wires a strum-parsed enum into serde as a case-insensitive string.
macro_rules! serde_via_str {
    ($ty:ty) => {
        impl TryFrom<String> for $ty {
            type Error = String;
            fn try_from(s: String) -> Result<Self, Self::Error> {
                <$ty>::from_str(s.trim())
                    .map_err(|_| format!("unknown {} '{}'", stringify!($ty), s))
            }
        }

        impl From<$ty> for String {
            fn from(v: $ty) -> String {
                v.to_string()
            }
        }
    };
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, EnumIter,
    Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(try_from = "String", into = "String")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}
serde_via_str!(Weekday);

impl Weekday {
    pub fn short(&self) -> &'static str {
        match self {
            Weekday::Monday => "Mon",
            Weekday::Tuesday => "Tue",
            Weekday::Wednesday => "Wed",
            Weekday::Thursday => "Thu",
            Weekday::Friday => "Fri",
            Weekday::Saturday => "Sat",
            Weekday::Sunday => "Sun",
        }
    }

    pub fn is_weekend(&self) -> bool {
        matches!(self, Weekday::Saturday | Weekday::Sunday)
    }
}

/// Wall-clock time of day, stored as minutes since midnight. Parsed from "HH:MM".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(u16);

impl ClockTime {
    pub const fn hm(hours: u16, minutes: u16) -> Self {
        ClockTime(hours * 60 + minutes)
    }

    pub const fn from_minutes(minutes: u16) -> Self {
        ClockTime(minutes)
    }

    pub fn minutes(&self) -> u16 {
        self.0
    }

    pub fn add_minutes(&self, minutes: u16) -> Self {
        ClockTime(self.0.saturating_add(minutes))
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl FromStr for ClockTime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (h, m) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| format!("time '{}' is not HH:MM", s))?;
        let h: u16 = h.parse().map_err(|_| format!("bad hour in '{}'", s))?;
        let m: u16 = m.parse().map_err(|_| format!("bad minute in '{}'", s))?;
        if h > 23 || m > 59 {
            return Err(format!("time '{}' out of range", s));
        }
        Ok(ClockTime::hm(h, m))
    }
}

impl TryFrom<String> for ClockTime {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ClockTime> for String {
    fn from(t: ClockTime) -> String {
        t.to_string()
    }
}

// --- Teachers ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DayAvailability {
    pub available: bool,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
}

impl Default for DayAvailability {
    fn default() -> Self {
        Self {
            available: true,
            start_time: ClockTime::hm(9, 0),
            end_time: ClockTime::hm(17, 0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(try_from = "String", into = "String")]
pub enum TeacherStatus {
    #[default]
    Active,
    Inactive,
    #[strum(to_string = "on_leave", serialize = "onleave")]
    OnLeave,
}
serde_via_str!(TeacherStatus);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub subjects: Vec<String>,
    /// Empty means the standard working week (Mon-Fri, 09:00-17:00).
    #[serde(default)]
    pub availability: BTreeMap<Weekday, DayAvailability>,
    #[serde(default)]
    pub status: TeacherStatus,
}

impl Teacher {
    pub fn new(id: &str, department: &str) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            department: department.to_string(),
            subjects: Vec::new(),
            availability: BTreeMap::new(),
            status: TeacherStatus::Active,
        }
    }

    /// Restricts availability to the given days and window. Can be chained.
    pub fn available_on(mut self, days: &[Weekday], start: ClockTime, end: ClockTime) -> Self {
        for &day in days {
            self.availability.insert(
                day,
                DayAvailability {
                    available: true,
                    start_time: start,
                    end_time: end,
                },
            );
        }
        self
    }

    /// The teacher's working window on `day`, if any.
    pub fn window(&self, day: Weekday) -> Option<(ClockTime, ClockTime)> {
        if self.availability.is_empty() {
            if day.is_weekend() {
                return None;
            }
            let d = DayAvailability::default();
            return Some((d.start_time, d.end_time));
        }
        self.availability
            .get(&day)
            .filter(|d| d.available)
            .map(|d| (d.start_time, d.end_time))
    }

    pub fn is_active(&self) -> bool {
        self.status == TeacherStatus::Active
    }
}

// --- Classrooms ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(try_from = "String", into = "String")]
pub enum RoomKind {
    #[default]
    #[strum(to_string = "lecture", serialize = "classroom", serialize = "theory")]
    Lecture,
    #[strum(to_string = "lab", serialize = "laboratory")]
    Lab,
}
serde_via_str!(RoomKind);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(try_from = "String", into = "String")]
pub enum RoomStatus {
    #[default]
    Available,
    Unavailable,
    Maintenance,
}
serde_via_str!(RoomStatus);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classroom {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub capacity: u32,
    #[serde(default, alias = "type")]
    pub room_type: RoomKind,
    #[serde(default)]
    pub status: RoomStatus,
}

impl Classroom {
    pub fn new(id: &str, capacity: u32, room_type: RoomKind) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            capacity,
            room_type,
            status: RoomStatus::Available,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == RoomStatus::Available
    }
}

// --- Courses ---

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, EnumIter,
    Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(try_from = "String", into = "String")]
pub enum SessionKind {
    Theory,
    #[strum(to_string = "practical", serialize = "lab")]
    Practical,
    Tutorial,
}
serde_via_str!(SessionKind);

impl SessionKind {
    pub fn needs_lab(&self) -> bool {
        matches!(self, SessionKind::Practical)
    }

    pub fn required_room(&self) -> RoomKind {
        if self.needs_lab() {
            RoomKind::Lab
        } else {
            RoomKind::Lecture
        }
    }
}

/// Weekly demand for one session kind. `duration` is in grid periods; when
/// absent, practical sessions take the grid's lab span and the rest take one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionSpec {
    pub sessions_per_week: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionPlan {
    pub theory: Option<SessionSpec>,
    pub practical: Option<SessionSpec>,
    pub tutorial: Option<SessionSpec>,
}

impl SessionPlan {
    pub fn get(&self, kind: SessionKind) -> Option<SessionSpec> {
        match kind {
            SessionKind::Theory => self.theory,
            SessionKind::Practical => self.practical,
            SessionKind::Tutorial => self.tutorial,
        }
    }

    pub fn set(&mut self, kind: SessionKind, spec: SessionSpec) {
        match kind {
            SessionKind::Theory => self.theory = Some(spec),
            SessionKind::Practical => self.practical = Some(spec),
            SessionKind::Tutorial => self.tutorial = Some(spec),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibleTeacher {
    pub teacher_id: String,
    /// Session kinds this teacher takes for the course. Empty means all.
    #[serde(default)]
    pub session_types: Vec<SessionKind>,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default = "default_true")]
    pub can_teach_alone: bool,
}

impl EligibleTeacher {
    pub fn covers(&self, kind: SessionKind) -> bool {
        self.session_types.is_empty() || self.session_types.contains(&kind)
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub sessions: SessionPlan,
    #[serde(default)]
    pub enrolled_students: u32,
    #[serde(default)]
    pub assigned_teachers: Vec<EligibleTeacher>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Course {
    pub fn new(id: &str, department: &str, enrolled_students: u32) -> Self {
        Self {
            id: id.to_string(),
            code: id.to_string(),
            name: id.to_string(),
            department: department.to_string(),
            sessions: SessionPlan::default(),
            enrolled_students,
            assigned_teachers: Vec::new(),
            is_active: true,
        }
    }

    pub fn with_sessions(mut self, kind: SessionKind, per_week: u32, duration: u8) -> Self {
        self.sessions.set(
            kind,
            SessionSpec {
                sessions_per_week: per_week,
                duration: Some(duration),
            },
        );
        self
    }

    pub fn with_teacher(mut self, teacher_id: &str, is_primary: bool) -> Self {
        self.assigned_teachers.push(EligibleTeacher {
            teacher_id: teacher_id.to_string(),
            session_types: Vec::new(),
            is_primary,
            can_teach_alone: true,
        });
        self
    }

    /// True if `subject` names this course by id, code or title.
    pub fn matches_subject(&self, subject: &str) -> bool {
        let s = subject.trim();
        !s.is_empty()
            && (s.eq_ignore_ascii_case(&self.id)
                || s.eq_ignore_ascii_case(&self.code)
                || s.eq_ignore_ascii_case(&self.name))
    }
}
