use serde::Serialize;

use crate::models::Task;

/// Counters over the whole collection, independent of search and filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub completed_percentage: u32,
}

pub fn stats(tasks: &[Task]) -> Stats {
    let total = tasks.len();
    let completed = tasks.iter().filter(|task| task.completed).count();
    Stats {
        total,
        completed,
        pending: total - completed,
        completed_percentage: rounded_percentage(completed, total),
    }
}

/// `round(100 * part / whole)` with halves rounded up; 0 for an empty whole.
fn rounded_percentage(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    let part = part as u64;
    let whole = whole as u64;
    ((200 * part + whole) / (2 * whole)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskId;
    use chrono::DateTime;

    fn tasks_with(flags: &[bool]) -> Vec<Task> {
        flags
            .iter()
            .enumerate()
            .map(|(index, completed)| {
                let mut task = Task::new(
                    TaskId::Number(index as i64),
                    format!("task-{index}"),
                    String::new(),
                    None,
                    DateTime::from_timestamp_millis(index as i64).unwrap(),
                );
                task.completed = *completed;
                task
            })
            .collect()
    }

    #[test]
    fn empty_collection_has_zero_stats() {
        assert_eq!(
            stats(&[]),
            Stats {
                total: 0,
                completed: 0,
                pending: 0,
                completed_percentage: 0
            }
        );
    }

    #[test]
    fn two_of_three_rounds_to_sixty_seven() {
        let out = stats(&tasks_with(&[true, true, false]));
        assert_eq!(out.total, 3);
        assert_eq!(out.completed, 2);
        assert_eq!(out.pending, 1);
        assert_eq!(out.completed_percentage, 67);
    }

    #[test]
    fn percentage_rounding_edges() {
        assert_eq!(stats(&tasks_with(&[true, false, false])).completed_percentage, 33);
        assert_eq!(stats(&tasks_with(&[true, false])).completed_percentage, 50);
        assert_eq!(stats(&tasks_with(&[false, false])).completed_percentage, 0);
        assert_eq!(stats(&tasks_with(&[true; 4])).completed_percentage, 100);
        // 1/8 = 12.5% rounds half up.
        let mut flags = [false; 8];
        flags[0] = true;
        assert_eq!(stats(&tasks_with(&flags)).completed_percentage, 13);
    }

    #[test]
    fn stats_serialize_camel_case() {
        let value = serde_json::to_value(stats(&tasks_with(&[true]))).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "total": 1,
                "completed": 1,
                "pending": 0,
                "completedPercentage": 100
            })
        );
    }
}
