use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use slotforge::grid::SlotGrid;
use slotforge::scorer::FitnessReport;
use slotforge::{RunResult, ScheduledSession};

pub fn print_run_summary(result: &RunResult) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let status = if result.success {
        Cell::new("SUCCESS").fg(Color::Green).add_attribute(Attribute::Bold)
    } else {
        Cell::new("FAILED").fg(Color::Red).add_attribute(Attribute::Bold)
    };
    let m = &result.metrics;

    table.add_row(vec![Cell::new("Status"), status]);
    table.add_row(vec![Cell::new("Stopped by"), Cell::new(result.termination)]);
    table.add_row(vec![Cell::new("Generations"), Cell::new(m.generations_run)]);
    table.add_row(vec![
        Cell::new("Best fitness"),
        Cell::new(format!("{:.2}", m.best_fitness)).fg(Color::Cyan),
    ]);
    table.add_row(vec![
        Cell::new("Hard violations"),
        Cell::new(m.hard_violation_count).fg(if m.hard_violation_count == 0 {
            Color::Green
        } else {
            Color::Red
        }),
    ]);
    table.add_row(vec![
        Cell::new("Soft penalty"),
        Cell::new(format!("{:.2}", m.soft_penalty_total)),
    ]);
    table.add_row(vec![
        Cell::new("Duration"),
        Cell::new(format!("{} ms", m.duration_ms)),
    ]);
    if let Some(col) = table.column_mut(1) {
        col.set_cell_alignment(CellAlignment::Right);
    }

    println!("\n{}", table);
    if let Some(reason) = &result.reason {
        println!("⚠️  {}", reason);
    }
}

pub fn print_timetable(rows: &[ScheduledSession]) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec![
        Cell::new("Day").add_attribute(Attribute::Bold),
        Cell::new("Time").add_attribute(Attribute::Bold),
        Cell::new("Course").add_attribute(Attribute::Bold),
        Cell::new("Type"),
        Cell::new("Teacher"),
        Cell::new("Room"),
    ]);

    let mut last_day = None;
    for r in rows {
        // Print the day name only on its first row.
        let day = if last_day == Some(r.day) {
            String::new()
        } else {
            last_day = Some(r.day);
            r.day.short().to_string()
        };
        table.add_row(vec![
            Cell::new(day).add_attribute(Attribute::Bold),
            Cell::new(format!("{}-{}", r.start_time, r.end_time)),
            Cell::new(&r.course_id).fg(Color::Cyan),
            Cell::new(format!("{} #{}", r.session_type, r.occurrence)),
            Cell::new(&r.teacher_id),
            Cell::new(&r.classroom_id),
        ]);
    }
    println!("\n{}", table);
}

pub fn print_fitness_report(report: &FitnessReport) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec![
        Cell::new("Constraint").add_attribute(Attribute::Bold),
        Cell::new("Kind"),
        Cell::new("Value").add_attribute(Attribute::Bold),
    ]);

    let h = &report.hard;
    for (label, n) in [
        ("Teacher clashes", h.teacher_clashes),
        ("Room clashes", h.room_clashes),
        ("Over capacity", h.over_capacity),
        ("Teacher unavailable", h.teacher_unavailable),
        ("Room kind mismatch", h.room_kind_mismatch),
    ] {
        table.add_row(vec![
            Cell::new(label),
            Cell::new("hard").fg(Color::Red),
            Cell::new(n).fg(if n == 0 { Color::Green } else { Color::Red }),
        ]);
    }

    let s = &report.soft;
    for (label, v) in [
        ("Consecutive excess", s.consecutive_excess),
        ("Short gaps", s.short_gaps),
        ("Teacher daily excess", s.teacher_daily_excess),
        ("Cohort daily excess", s.cohort_daily_excess),
        ("Subjects/day excess", s.subjects_per_day_excess),
        ("Back-to-back labs", s.back_to_back_labs),
        ("Unassisted labs", s.unassisted_labs),
        ("Utilisation deviation", s.utilization_deviation),
        ("Capacity buffer", s.capacity_buffer),
        ("Afternoon labs", s.afternoon_labs),
        ("Edge periods", s.edge_periods),
        ("Friday afternoon", s.friday_afternoon),
        ("Workload imbalance", s.workload_imbalance),
        ("Discontinuity", s.discontinuity),
    ] {
        table.add_row(vec![
            Cell::new(label),
            Cell::new("soft"),
            Cell::new(format!("{:.2}", v)),
        ]);
    }

    table.add_row(vec![
        Cell::new("Weighted soft").add_attribute(Attribute::Bold),
        Cell::new(""),
        Cell::new(format!("{:.2}", report.weighted_soft)),
    ]);
    table.add_row(vec![
        Cell::new("Fitness").add_attribute(Attribute::Bold),
        Cell::new(""),
        Cell::new(format!("{:.2}", report.fitness.score)).fg(Color::Cyan),
    ]);

    if let Some(col) = table.column_mut(2) {
        col.set_cell_alignment(CellAlignment::Right);
    }
    println!("\n{}", table);
}

pub fn print_grid(grid: &SlotGrid) {
    let days: Vec<&str> = grid.days.iter().map(|d| d.short()).collect();
    println!("\nWorking days: {}", days.join(" "));
    println!(
        "Lab span: {} periods | Afternoon from {}",
        grid.lab_span_len, grid.afternoon_from
    );

    let mut table = Table::new();
    table.load_preset(ASCII_FULL);
    table.add_row(vec![
        Cell::new("#").add_attribute(Attribute::Bold),
        Cell::new("Start"),
        Cell::new("End"),
        Cell::new(""),
    ]);
    for p in &grid.periods {
        let tag = if p.is_lunch {
            Cell::new("lunch").fg(Color::Yellow)
        } else {
            Cell::new("")
        };
        table.add_row(vec![
            Cell::new(p.index).set_alignment(CellAlignment::Right),
            Cell::new(p.start),
            Cell::new(p.end),
            tag,
        ]);
    }
    println!("{}", table);
}
