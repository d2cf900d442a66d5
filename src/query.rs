use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Task;

/// Upper bound, in days from today, for the `this-week` filter.
pub const THIS_WEEK_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Filter {
    #[default]
    All,
    Pending,
    Completed,
    Today,
    ThisWeek,
}

impl Filter {
    pub const VARIANTS: [Filter; 5] = [
        Filter::All,
        Filter::Pending,
        Filter::Completed,
        Filter::Today,
        Filter::ThisWeek,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Pending => "pending",
            Filter::Completed => "completed",
            Filter::Today => "today",
            Filter::ThisWeek => "this-week",
        }
    }

    /// `today` is the caller's calendar date, sampled once per query.
    pub fn matches(self, task: &Task, today: NaiveDate) -> bool {
        match self {
            Filter::All => true,
            Filter::Pending => !task.completed,
            Filter::Completed => task.completed,
            Filter::Today => task.due_date == Some(today),
            Filter::ThisWeek => task.due_date.is_some_and(|due| {
                let days = (due - today).num_days();
                (0..=THIS_WEEK_DAYS).contains(&days)
            }),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFilterError(pub String);

impl fmt::Display for ParseFilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown filter: {}", self.0)
    }
}

impl std::error::Error for ParseFilterError {}

impl FromStr for Filter {
    type Err = ParseFilterError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase();
        Filter::VARIANTS
            .into_iter()
            .find(|filter| filter.as_str() == normalized)
            .ok_or_else(|| ParseFilterError(value.to_string()))
    }
}

/// Tasks whose title or description contains `keyword` (case-insensitive), narrowed by
/// `filter`, newest first. Ties keep their collection order.
pub fn visible_tasks<'a>(
    tasks: &'a [Task],
    keyword: &str,
    filter: Filter,
    today: NaiveDate,
) -> Vec<&'a Task> {
    let needle = keyword.trim().to_lowercase();
    let mut visible: Vec<&Task> = tasks
        .iter()
        .filter(|task| needle.is_empty() || contains_keyword(task, &needle))
        .filter(|task| filter.matches(task, today))
        .collect();
    visible.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    visible
}

/// Same as [`visible_tasks`] with "today" taken from the local clock.
pub fn visible_tasks_now<'a>(tasks: &'a [Task], keyword: &str, filter: Filter) -> Vec<&'a Task> {
    visible_tasks(tasks, keyword, filter, local_today())
}

/// Calendar date of `instant` as seen in `tz`.
pub fn today_in<Tz: TimeZone>(instant: &DateTime<impl TimeZone>, tz: &Tz) -> NaiveDate {
    instant.with_timezone(tz).date_naive()
}

pub fn local_today() -> NaiveDate {
    today_in(&Utc::now(), &Local)
}

fn contains_keyword(task: &Task, needle: &str) -> bool {
    task.title.to_lowercase().contains(needle) || task.description.to_lowercase().contains(needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TaskId, Timestamp};
    use chrono::Duration;

    fn at(millis: i64) -> Timestamp {
        DateTime::from_timestamp_millis(millis).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn task(id: i64, title: &str, created_millis: i64) -> Task {
        Task::new(
            TaskId::Number(id),
            title.to_string(),
            String::new(),
            None,
            at(created_millis),
        )
    }

    fn ids(tasks: &[&Task]) -> Vec<TaskId> {
        tasks.iter().map(|t| t.id.clone()).collect()
    }

    fn sample() -> Vec<Task> {
        let mut done = task(1, "Write Report", 1_000);
        done.completed = true;
        let mut monthly = task(2, "Finance", 3_000);
        monthly.description = "monthly report due".into();
        let groceries = task(3, "Groceries", 2_000);
        let mut archived = task(4, "Archive mail", 4_000);
        archived.completed = true;
        vec![done, monthly, groceries, archived]
    }

    #[test]
    fn filter_names_parse_and_display() {
        for filter in Filter::VARIANTS {
            assert_eq!(filter.as_str().parse::<Filter>(), Ok(filter));
            assert_eq!(filter.to_string(), filter.as_str());
        }
        assert_eq!(" This-Week ".parse::<Filter>(), Ok(Filter::ThisWeek));
        assert_eq!(
            "overdue".parse::<Filter>(),
            Err(ParseFilterError("overdue".to_string()))
        );
        assert_eq!(
            serde_json::to_value(Filter::ThisWeek).unwrap(),
            serde_json::json!("this-week")
        );
    }

    #[test]
    fn all_filter_sorts_newest_first() {
        let tasks = sample();
        let out = visible_tasks(&tasks, "", Filter::All, date(2024, 5, 1));
        assert_eq!(
            ids(&out),
            vec![
                TaskId::Number(4),
                TaskId::Number(2),
                TaskId::Number(3),
                TaskId::Number(1)
            ]
        );
    }

    #[test]
    fn equal_creation_times_keep_collection_order() {
        let tasks = vec![task(1, "a", 5), task(2, "b", 5), task(3, "c", 9), task(4, "d", 5)];
        let out = visible_tasks(&tasks, "", Filter::All, date(2024, 5, 1));
        assert_eq!(
            ids(&out),
            vec![
                TaskId::Number(3),
                TaskId::Number(1),
                TaskId::Number(2),
                TaskId::Number(4)
            ]
        );
    }

    #[test]
    fn completed_and_pending_partition_the_collection() {
        let tasks = sample();
        let today = date(2024, 5, 1);
        let completed = visible_tasks(&tasks, "", Filter::Completed, today);
        let pending = visible_tasks(&tasks, "", Filter::Pending, today);
        assert!(completed.iter().all(|t| t.completed));
        assert!(pending.iter().all(|t| !t.completed));
        assert_eq!(completed.len() + pending.len(), tasks.len());
        for task in &tasks {
            let in_completed = completed.iter().any(|t| t.id == task.id);
            assert_eq!(in_completed, task.completed);
        }
    }

    #[test]
    fn keyword_matches_title_or_description_case_insensitively() {
        let tasks = sample();
        let out = visible_tasks(&tasks, "  REPORT ", Filter::All, date(2024, 5, 1));
        assert_eq!(ids(&out), vec![TaskId::Number(2), TaskId::Number(1)]);

        let out = visible_tasks(&tasks, "report", Filter::Pending, date(2024, 5, 1));
        assert_eq!(ids(&out), vec![TaskId::Number(2)]);
    }

    #[test]
    fn blank_keyword_is_ignored_and_no_match_is_empty() {
        let tasks = sample();
        let today = date(2024, 5, 1);
        assert_eq!(visible_tasks(&tasks, "   ", Filter::All, today).len(), 4);
        assert!(visible_tasks(&tasks, "dentist", Filter::All, today).is_empty());
        assert!(visible_tasks(&[], "", Filter::All, today).is_empty());
    }

    #[test]
    fn keyword_matching_handles_non_ascii_case() {
        let mut tasks = vec![task(1, "ÜBERWEISUNG prüfen", 1)];
        tasks[0].description = "Straße".into();
        let today = date(2024, 5, 1);
        assert_eq!(visible_tasks(&tasks, "überweisung", Filter::All, today).len(), 1);
        assert_eq!(visible_tasks(&tasks, "STRASSE", Filter::All, today).len(), 0);
        assert_eq!(visible_tasks(&tasks, "STRAßE", Filter::All, today).len(), 1);
    }

    #[test]
    fn today_filter_matches_exact_date_only() {
        let today = date(2024, 5, 10);
        let mut tasks = vec![
            task(1, "yesterday", 1),
            task(2, "today", 2),
            task(3, "tomorrow", 3),
            task(4, "undated", 4),
        ];
        tasks[0].due_date = Some(today - Duration::days(1));
        tasks[1].due_date = Some(today);
        tasks[2].due_date = Some(today + Duration::days(1));

        let out = visible_tasks(&tasks, "", Filter::Today, today);
        assert_eq!(ids(&out), vec![TaskId::Number(2)]);
    }

    #[test]
    fn this_week_covers_today_through_seven_days_ahead() {
        let today = date(2024, 5, 10);
        let offsets = [-1, 0, 3, 7, 8];
        let tasks: Vec<Task> = offsets
            .iter()
            .enumerate()
            .map(|(index, offset)| {
                let mut t = task(index as i64, "dated", index as i64);
                t.due_date = Some(today + Duration::days(*offset));
                t
            })
            .chain(std::iter::once(task(99, "undated", 0)))
            .collect();

        let out = visible_tasks(&tasks, "", Filter::ThisWeek, today);
        let mut due: Vec<i64> = out
            .iter()
            .map(|t| (t.due_date.unwrap() - today).num_days())
            .collect();
        due.sort();
        assert_eq!(due, vec![0, 3, 7]);
    }

    #[test]
    fn result_is_a_subset_without_duplicates() {
        let tasks = sample();
        for filter in Filter::VARIANTS {
            let out = visible_tasks(&tasks, "r", filter, date(2024, 5, 1));
            for (index, visible) in out.iter().enumerate() {
                assert!(tasks.iter().any(|t| std::ptr::eq(t, *visible)));
                assert!(out[index + 1..].iter().all(|other| other.id != visible.id));
            }
        }
    }

    #[test]
    fn today_depends_on_the_callers_time_zone() {
        // 2024-05-10 23:30 UTC is already May 11 in Shanghai.
        let instant = Utc.with_ymd_and_hms(2024, 5, 10, 23, 30, 0).unwrap();
        assert_eq!(today_in(&instant, &Utc), date(2024, 5, 10));
        assert_eq!(today_in(&instant, &chrono_tz::Asia::Shanghai), date(2024, 5, 11));
        assert_eq!(
            today_in(&instant, &chrono_tz::America::Los_Angeles),
            date(2024, 5, 10)
        );

        let mut due = task(1, "ship", 1);
        due.due_date = Some(date(2024, 5, 11));
        let tasks = vec![due];
        let shanghai_today = today_in(&instant, &chrono_tz::Asia::Shanghai);
        assert_eq!(visible_tasks(&tasks, "", Filter::Today, shanghai_today).len(), 1);
        assert!(visible_tasks(&tasks, "", Filter::Today, today_in(&instant, &Utc)).is_empty());
    }

    #[test]
    fn visible_tasks_now_uses_local_date() {
        let mut due = task(1, "local", 1);
        due.due_date = Some(Local::now().date_naive() + Duration::days(1));
        let tasks = vec![due];
        // Still inside the window if midnight passes between the two samples.
        let out = visible_tasks_now(&tasks, "", Filter::ThisWeek);
        assert_eq!(out.len(), 1);
    }
}
