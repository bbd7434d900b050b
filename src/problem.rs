use crate::config::SystemConfig;
use crate::error::{SfResult, SlotForgeError};
use crate::grid::SlotGrid;
use crate::models::{Classroom, Course, SessionKind, Teacher};
use std::collections::HashMap;
use strum::IntoEnumIterator;
use tracing::{debug, info, warn};
use typed_builder::TypedBuilder;

/// One weekly occurrence of a course component. The unit the engine places.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInstance {
    pub index: usize,
    pub course: usize,
    pub kind: SessionKind,
    /// 1-based occurrence within the week for this course and kind.
    pub occurrence: u32,
    /// Length in grid periods.
    pub span: usize,
    pub students: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeacherOption {
    pub teacher: usize,
    pub primary: bool,
    pub can_teach_alone: bool,
}

/// Rooms for one session, best first. The first `compatible` entries satisfy
/// both room kind and capacity; the rest are least-bad fallbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomOptions {
    pub rooms: Vec<usize>,
    pub compatible: usize,
}

impl RoomOptions {
    pub fn compatible_rooms(&self) -> &[usize] {
        &self.rooms[..self.compatible]
    }
}

#[derive(TypedBuilder)]
pub struct ProblemBuildParams<'a> {
    pub teachers: &'a [Teacher],
    pub classrooms: &'a [Classroom],
    pub courses: &'a [Course],
    #[builder(default)]
    pub config: SystemConfig,
}

/// Immutable snapshot of everything a run reads: filtered entities, the slot
/// grid, the session instances and their precomputed candidates.
#[derive(Debug, Clone)]
pub struct Problem {
    pub teachers: Vec<Teacher>,
    pub classrooms: Vec<Classroom>,
    pub courses: Vec<Course>,
    pub config: SystemConfig,
    pub grid: SlotGrid,
    pub sessions: Vec<SessionInstance>,
    pub teacher_options: Vec<Vec<TeacherOption>>,
    pub room_options: Vec<RoomOptions>,
    // [teacher * days + day] -> working window in minutes
    windows: Vec<Option<(u16, u16)>>,
}

impl ProblemBuildParams<'_> {
    pub fn build_problem(self) -> SfResult<Problem> {
        let teachers: Vec<Teacher> = self
            .teachers
            .iter()
            .filter(|t| t.is_active())
            .cloned()
            .collect();
        let classrooms: Vec<Classroom> = self
            .classrooms
            .iter()
            .filter(|r| r.is_available())
            .cloned()
            .collect();
        let courses: Vec<Course> = self
            .courses
            .iter()
            .filter(|c| c.is_active)
            .cloned()
            .collect();

        let dropped = (self.teachers.len() - teachers.len())
            + (self.classrooms.len() - classrooms.len())
            + (self.courses.len() - courses.len());
        if dropped > 0 {
            debug!("Filtered out {} inactive or unavailable entities", dropped);
        }

        if teachers.is_empty() {
            return Err(SlotForgeError::InsufficientData(
                "no active teachers".to_string(),
            ));
        }
        if classrooms.is_empty() {
            return Err(SlotForgeError::InsufficientData(
                "no available classrooms".to_string(),
            ));
        }
        if courses.is_empty() {
            return Err(SlotForgeError::InsufficientData(
                "no active courses".to_string(),
            ));
        }

        let grid = SlotGrid::build(&self.config.working_hours)?;
        let sessions = expand_sessions(&courses, &grid)?;
        if sessions.is_empty() {
            return Err(SlotForgeError::InsufficientData(
                "courses request no sessions".to_string(),
            ));
        }

        let max_students = self.config.general_policies.max_students_per_class;
        for c in &courses {
            if max_students > 0 && c.enrolled_students > max_students {
                warn!(
                    "Course '{}' enrols {} students, above the {} per-class policy",
                    c.id, c.enrolled_students, max_students
                );
            }
        }

        let teacher_index: HashMap<&str, usize> = teachers
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.as_str(), i))
            .collect();

        let teacher_options: Vec<Vec<TeacherOption>> = sessions
            .iter()
            .map(|s| resolve_teachers(&teachers, &teacher_index, &courses[s.course], s.kind))
            .collect();

        let buffer = self.config.general_policies.min_room_capacity_buffer;
        let room_options: Vec<RoomOptions> = sessions
            .iter()
            .map(|s| resolve_rooms(&classrooms, s, buffer))
            .collect();

        let days = grid.day_count();
        let mut windows = vec![None; teachers.len() * days];
        for (t, teacher) in teachers.iter().enumerate() {
            for (d, &day) in grid.days.iter().enumerate() {
                windows[t * days + d] = teacher
                    .window(day)
                    .map(|(start, end)| (start.minutes(), end.minutes()));
            }
        }

        info!(
            "Problem: {} teachers, {} classrooms, {} courses -> {} session instances",
            teachers.len(),
            classrooms.len(),
            courses.len(),
            sessions.len()
        );

        Ok(Problem {
            teachers,
            classrooms,
            courses,
            config: self.config,
            grid,
            sessions,
            teacher_options,
            room_options,
            windows,
        })
    }
}

impl Problem {
    pub fn build(
        teachers: &[Teacher],
        classrooms: &[Classroom],
        courses: &[Course],
        config: &SystemConfig,
    ) -> SfResult<Problem> {
        ProblemBuildParams::builder()
            .teachers(teachers)
            .classrooms(classrooms)
            .courses(courses)
            .config(config.clone())
            .build()
            .build_problem()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// True if `teacher` is on duty for the whole span on `day`.
    pub fn teacher_available(&self, teacher: usize, day: usize, start: usize, span: usize) -> bool {
        let Some((from, to)) = self.windows[teacher * self.grid.day_count() + day] else {
            return false;
        };
        let (s, e) = self.grid.window(start, span);
        s.minutes() >= from && e.minutes() <= to
    }

    /// Whether the teacher may run this session without a second staff member.
    /// Teachers drafted in as fallbacks count as able to.
    pub fn can_teach_alone(&self, session: usize, teacher: usize) -> bool {
        self.teacher_options[session]
            .iter()
            .find(|o| o.teacher == teacher)
            .map(|o| o.can_teach_alone)
            .unwrap_or(true)
    }

    pub fn session_label(&self, session: usize) -> String {
        let s = &self.sessions[session];
        format!(
            "{} {} #{}",
            self.courses[s.course].id, s.kind, s.occurrence
        )
    }
}

fn expand_sessions(courses: &[Course], grid: &SlotGrid) -> SfResult<Vec<SessionInstance>> {
    let mut sessions = Vec::new();
    for (ci, course) in courses.iter().enumerate() {
        for kind in SessionKind::iter() {
            let Some(spec) = course.sessions.get(kind) else {
                continue;
            };
            let span = match spec.duration {
                Some(d) => d.max(1) as usize,
                None if kind == SessionKind::Practical => grid.lab_span_len.max(1),
                None => 1,
            };
            if spec.sessions_per_week > 0 && grid.starts(span).is_empty() {
                return Err(SlotForgeError::Configuration(format!(
                    "course '{}' needs {}-period {} sessions but no contiguous block that long exists",
                    course.id, span, kind
                )));
            }
            for occurrence in 1..=spec.sessions_per_week {
                sessions.push(SessionInstance {
                    index: sessions.len(),
                    course: ci,
                    kind,
                    occurrence,
                    span,
                    students: course.enrolled_students,
                });
            }
        }
    }
    Ok(sessions)
}

fn resolve_teachers(
    teachers: &[Teacher],
    index: &HashMap<&str, usize>,
    course: &Course,
    kind: SessionKind,
) -> Vec<TeacherOption> {
    let mut options: Vec<TeacherOption> = Vec::new();
    for entry in course.assigned_teachers.iter().filter(|e| e.covers(kind)) {
        match index.get(entry.teacher_id.as_str()) {
            Some(&t) if !options.iter().any(|o| o.teacher == t) => options.push(TeacherOption {
                teacher: t,
                primary: entry.is_primary,
                can_teach_alone: entry.can_teach_alone,
            }),
            Some(_) => {}
            None => warn!(
                "Course '{}' lists unknown or inactive teacher '{}'",
                course.id, entry.teacher_id
            ),
        }
    }
    options.sort_by_key(|o| !o.primary);
    if !options.is_empty() {
        return options;
    }

    let by_subject = teachers_where(teachers, |t| {
        t.subjects.iter().any(|s| course.matches_subject(s))
    });
    if !by_subject.is_empty() {
        debug!("Course '{}' {}: teachers resolved by subject", course.id, kind);
        return by_subject;
    }
    let by_department = teachers_where(teachers, |t| {
        !course.department.is_empty() && t.department.eq_ignore_ascii_case(&course.department)
    });
    if !by_department.is_empty() {
        warn!(
            "Course '{}' {}: no eligible teacher, falling back to department staff",
            course.id, kind
        );
        return by_department;
    }
    warn!(
        "Course '{}' {}: no eligible teacher, falling back to any teacher",
        course.id, kind
    );
    teachers_where(teachers, |_| true)
}

fn teachers_where(teachers: &[Teacher], pick: impl Fn(&Teacher) -> bool) -> Vec<TeacherOption> {
    teachers
        .iter()
        .enumerate()
        .filter(|(_, t)| pick(t))
        .map(|(i, _)| TeacherOption {
            teacher: i,
            primary: false,
            can_teach_alone: true,
        })
        .collect()
}

fn resolve_rooms(classrooms: &[Classroom], session: &SessionInstance, buffer: u32) -> RoomOptions {
    let wanted = session.kind.required_room();

    let mut compatible: Vec<usize> = (0..classrooms.len())
        .filter(|&r| {
            classrooms[r].room_type == wanted && classrooms[r].capacity >= session.students
        })
        .collect();
    // Rooms with the spare seats first, then the snuggest fit.
    compatible.sort_by_key(|&r| {
        (
            classrooms[r].capacity - session.students < buffer,
            classrooms[r].capacity,
        )
    });
    let count = compatible.len();

    let mut rest: Vec<usize> = (0..classrooms.len())
        .filter(|r| !compatible.contains(r))
        .collect();
    // Right kind before wrong kind, then largest first.
    rest.sort_by_key(|&r| {
        (
            classrooms[r].room_type != wanted,
            std::cmp::Reverse(classrooms[r].capacity),
        )
    });

    if count == 0 {
        debug!(
            "Session {} #{} ({} students): no compatible room, using fallbacks",
            session.kind, session.occurrence, session.students
        );
    }

    compatible.extend(rest);
    RoomOptions {
        rooms: compatible,
        compatible: count,
    }
}
