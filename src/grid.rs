use crate::config::WorkingHours;
use crate::error::{SfResult, SlotForgeError};
use crate::models::{ClockTime, Weekday};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub index: usize,
    pub start: ClockTime,
    pub end: ClockTime,
    pub is_lunch: bool,
}

/// The weekly grid of schedulable periods.
///
/// Every working day shares the same period layout, so periods are stored once
/// and addressed by `(day index, period index)`. Lunch occupies its own period
/// index, which keeps multi-period spans from ever straddling it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotGrid {
    pub days: Vec<Weekday>,
    pub periods: Vec<Period>,
    /// Periods a lab session occupies.
    pub lab_span_len: usize,
    /// Minutes from one period start to the next.
    pub stride_minutes: u16,
    pub afternoon_from: ClockTime,
    // starts_by_len[n] = start indices where n contiguous teaching periods fit
    starts_by_len: Vec<Vec<usize>>,
    first_teaching: usize,
    last_teaching: usize,
}

impl SlotGrid {
    pub fn build(hours: &WorkingHours) -> SfResult<SlotGrid> {
        if hours.period_duration == 0 {
            return Err(SlotForgeError::Configuration(
                "periodDuration must be positive".to_string(),
            ));
        }
        if hours.end_time <= hours.start_time {
            return Err(SlotForgeError::Configuration(format!(
                "working day ends ({}) before it starts ({})",
                hours.end_time, hours.start_time
            )));
        }

        let mut days = hours.working_days.clone();
        days.sort();
        days.dedup();
        if days.is_empty() {
            return Err(SlotForgeError::Configuration(
                "no working days configured".to_string(),
            ));
        }

        let has_lunch = hours.lunch_break_end > hours.lunch_break_start;
        let mut lunch_done = !has_lunch;
        let mut periods: Vec<Period> = Vec::new();
        let mut teaching = 0usize;
        let mut t = hours.start_time;

        while teaching < hours.max_periods_per_day {
            if !lunch_done && t >= hours.lunch_break_end {
                lunch_done = true;
            }
            let end = t.add_minutes(hours.period_duration);
            if !lunch_done && end > hours.lunch_break_start {
                periods.push(Period {
                    index: periods.len(),
                    start: t.max(hours.lunch_break_start),
                    end: hours.lunch_break_end,
                    is_lunch: true,
                });
                t = hours.lunch_break_end;
                lunch_done = true;
                continue;
            }
            if end > hours.end_time {
                break;
            }
            periods.push(Period {
                index: periods.len(),
                start: t,
                end,
                is_lunch: false,
            });
            teaching += 1;
            t = end.add_minutes(hours.break_duration);
        }

        if teaching == 0 {
            return Err(SlotForgeError::Configuration(format!(
                "working window {}-{} holds no {}-minute period",
                hours.start_time, hours.end_time, hours.period_duration
            )));
        }

        // Drop a trailing lunch period that nothing follows.
        while periods.last().is_some_and(|p| p.is_lunch) {
            periods.pop();
        }

        let mut starts_by_len = vec![Vec::new(); teaching + 1];
        for (len, starts) in starts_by_len.iter_mut().enumerate().skip(1) {
            for s in 0..periods.len() {
                if s + len <= periods.len() && periods[s..s + len].iter().all(|p| !p.is_lunch) {
                    starts.push(s);
                }
            }
        }

        let stride_minutes = hours.period_duration + hours.break_duration;
        let lab_span_len = ((hours.lab_period_duration as f32 / stride_minutes as f32).round()
            as usize)
            .clamp(1, teaching);

        let first_teaching = periods.iter().position(|p| !p.is_lunch).unwrap_or(0);
        let last_teaching = periods.iter().rposition(|p| !p.is_lunch).unwrap_or(0);

        let afternoon_from = if has_lunch {
            hours.lunch_break_start
        } else {
            ClockTime::hm(12, 0)
        };

        debug!(
            "Slot grid: {} days x {} periods ({} teaching), lab span {} periods",
            days.len(),
            periods.len(),
            teaching,
            lab_span_len
        );

        Ok(SlotGrid {
            days,
            periods,
            lab_span_len,
            stride_minutes,
            afternoon_from,
            starts_by_len,
            first_teaching,
            last_teaching,
        })
    }

    pub fn day_count(&self) -> usize {
        self.days.len()
    }

    pub fn period_count(&self) -> usize {
        self.periods.len()
    }

    pub fn teaching_period_count(&self) -> usize {
        self.periods.iter().filter(|p| !p.is_lunch).count()
    }

    /// Valid start periods for a span of `len` periods. Empty if nothing fits.
    pub fn starts(&self, len: usize) -> &[usize] {
        self.starts_by_len.get(len).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn fits(&self, start: usize, len: usize) -> bool {
        self.starts(len).binary_search(&start).is_ok()
    }

    /// Clock window covered by `len` periods from `start`.
    pub fn window(&self, start: usize, len: usize) -> (ClockTime, ClockTime) {
        let first = &self.periods[start.min(self.periods.len() - 1)];
        let last_idx = (start + len.max(1) - 1).min(self.periods.len() - 1);
        (first.start, self.periods[last_idx].end)
    }

    pub fn is_edge_period(&self, start: usize, len: usize) -> bool {
        start <= self.first_teaching || start + len.max(1) - 1 >= self.last_teaching
    }

    pub fn is_afternoon(&self, start: usize) -> bool {
        self.periods
            .get(start)
            .is_some_and(|p| p.start >= self.afternoon_from)
    }

    /// Whole periods that fit into `hours` of wall time, at least one.
    pub fn hours_to_periods(&self, hours: u16) -> usize {
        let p = (hours as f32 * 60.0 / self.stride_minutes.max(1) as f32).round() as usize;
        p.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_grid_layout() {
        let grid = SlotGrid::build(&WorkingHours::default()).unwrap();
        assert_eq!(grid.day_count(), 5);
        // 09:00, 10:00, 11:00, lunch, 13:30, 14:30, 15:30
        assert_eq!(grid.period_count(), 7);
        assert_eq!(grid.teaching_period_count(), 6);
        assert!(grid.periods[3].is_lunch);
        assert_eq!(grid.periods[4].start, ClockTime::hm(13, 30));
        assert_eq!(grid.lab_span_len, 2);
    }

    #[test]
    fn test_periods_do_not_overlap() {
        let grid = SlotGrid::build(&WorkingHours::default()).unwrap();
        for pair in grid.periods.windows(2) {
            assert!(pair[0].end <= pair[1].start, "{:?} overlaps {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_spans_never_cross_lunch() {
        let grid = SlotGrid::build(&WorkingHours::default()).unwrap();
        assert_eq!(grid.starts(2), &[0, 1, 4, 5]);
        assert_eq!(grid.starts(3), &[0, 4]);
        assert!(grid.starts(4).is_empty());
        assert!(grid.fits(1, 2));
        assert!(!grid.fits(2, 2));
    }

    #[test]
    fn test_window_shorter_than_period_is_rejected() {
        let hours = WorkingHours {
            start_time: ClockTime::hm(9, 0),
            end_time: ClockTime::hm(9, 30),
            ..Default::default()
        };
        assert!(matches!(
            SlotGrid::build(&hours),
            Err(SlotForgeError::Configuration(_))
        ));
    }

    #[test]
    fn test_zero_max_periods_is_rejected() {
        let hours = WorkingHours {
            max_periods_per_day: 0,
            ..Default::default()
        };
        assert!(SlotGrid::build(&hours).is_err());
    }

    #[test]
    fn test_max_periods_caps_the_day() {
        let hours = WorkingHours {
            max_periods_per_day: 2,
            ..Default::default()
        };
        let grid = SlotGrid::build(&hours).unwrap();
        assert_eq!(grid.teaching_period_count(), 2);
        assert!(grid.periods.iter().all(|p| !p.is_lunch));
    }

    #[test]
    fn test_edge_and_afternoon_queries() {
        let grid = SlotGrid::build(&WorkingHours::default()).unwrap();
        assert!(grid.is_edge_period(0, 1));
        assert!(grid.is_edge_period(5, 2));
        assert!(!grid.is_edge_period(1, 1));
        assert!(!grid.is_afternoon(2));
        assert!(grid.is_afternoon(4));
        assert_eq!(grid.hours_to_periods(3), 3);
    }
}
