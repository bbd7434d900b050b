#![allow(dead_code)]

use slotforge::config::{Settings, SystemConfig};
use slotforge::models::{
    ClockTime, Classroom, Course, EligibleTeacher, RoomKind, SessionKind, Teacher, Weekday,
};
use slotforge::Dataset;

/// Builder for Teacher to clean up tests
pub struct TeacherBuilder {
    teacher: Teacher,
}

impl TeacherBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            teacher: Teacher::new(id, "CS"),
        }
    }

    pub fn department(mut self, dept: &str) -> Self {
        self.teacher.department = dept.to_string();
        self
    }

    pub fn subject(mut self, subject: &str) -> Self {
        self.teacher.subjects.push(subject.to_string());
        self
    }

    /// Adds an availability window, e.g. `("09:00", "12:00")` on the given days.
    pub fn available(mut self, days: &[Weekday], from: &str, to: &str) -> Self {
        let from: ClockTime = from.parse().unwrap();
        let to: ClockTime = to.parse().unwrap();
        self.teacher = self.teacher.available_on(days, from, to);
        self
    }

    pub fn build(self) -> Teacher {
        self.teacher
    }
}

pub fn lecture_room(id: &str, capacity: u32) -> Classroom {
    Classroom::new(id, capacity, RoomKind::Lecture)
}

pub fn lab(id: &str, capacity: u32) -> Classroom {
    Classroom::new(id, capacity, RoomKind::Lab)
}

/// Builder for Course
pub struct CourseBuilder {
    course: Course,
}

impl CourseBuilder {
    pub fn new(id: &str, students: u32) -> Self {
        Self {
            course: Course::new(id, "CS", students),
        }
    }

    pub fn theory(mut self, per_week: u32, duration: u8) -> Self {
        self.course = self.course.with_sessions(SessionKind::Theory, per_week, duration);
        self
    }

    pub fn practical(mut self, per_week: u32, duration: u8) -> Self {
        self.course = self
            .course
            .with_sessions(SessionKind::Practical, per_week, duration);
        self
    }

    pub fn teacher(mut self, id: &str) -> Self {
        self.course = self.course.with_teacher(id, true);
        self
    }

    pub fn lab_helper(mut self, id: &str) -> Self {
        self.course.assigned_teachers.push(EligibleTeacher {
            teacher_id: id.to_string(),
            session_types: vec![SessionKind::Practical],
            is_primary: false,
            can_teach_alone: false,
        });
        self
    }

    pub fn inactive(mut self) -> Self {
        self.course.is_active = false;
        self
    }

    pub fn build(self) -> Course {
        self.course
    }
}

pub fn quick_settings(population: usize, generations: usize, seed: u64) -> Settings {
    Settings {
        population_size: population,
        max_generations: generations,
        seed: Some(seed),
        ..Default::default()
    }
}

/// A small, comfortably feasible department.
pub fn small_dataset() -> Dataset {
    Dataset {
        teachers: vec![
            TeacherBuilder::new("T1").build(),
            TeacherBuilder::new("T2").build(),
            TeacherBuilder::new("T3").build(),
        ],
        classrooms: vec![
            lecture_room("R101", 60),
            lecture_room("R102", 40),
            lab("LAB1", 50),
        ],
        courses: vec![
            CourseBuilder::new("CS101", 45)
                .theory(3, 1)
                .practical(1, 2)
                .teacher("T1")
                .build(),
            CourseBuilder::new("CS201", 30)
                .theory(2, 1)
                .practical(1, 2)
                .teacher("T2")
                .build(),
            CourseBuilder::new("MA101", 35).theory(3, 1).teacher("T3").build(),
        ],
        config: SystemConfig::default(),
        settings: quick_settings(20, 40, 7),
    }
}
