use crate::models::{Epic, Status, Subtask};

/// Recompute an epic's status and time window from its current subtasks.
///
/// Status: no subtasks or all `New` → `New`; at least one subtask and all
/// `Done` → `Done`; anything else → `InProgress`. A mix of `New` and `Done`
/// with nothing in progress therefore reads as `InProgress`.
///
/// Time: start is the earliest start and end the latest end among timed
/// subtasks; duration is the additive total over all subtasks and does not
/// shrink when windows overlap.
pub(crate) fn recompute(epic: &mut Epic, subtasks: &[&Subtask]) {
    epic.task.status = derive_status(subtasks);
    epic.task.start_time = subtasks.iter().filter_map(|s| s.task.start_time).min();
    epic.end_time = subtasks.iter().filter_map(|s| s.task.end_time()).max();
    epic.task.duration_minutes = subtasks.iter().map(|s| s.task.duration_minutes).sum();
}

fn derive_status(subtasks: &[&Subtask]) -> Status {
    if subtasks.is_empty() {
        return Status::New;
    }

    let mut all_new = true;
    let mut all_done = true;
    for subtask in subtasks {
        match subtask.task.status {
            Status::InProgress => return Status::InProgress,
            Status::New => all_done = false,
            Status::Done => all_new = false,
        }
    }

    if all_new {
        Status::New
    } else if all_done {
        Status::Done
    } else {
        Status::InProgress
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::models::{Task, TaskId};

    fn epic() -> Epic {
        Epic {
            task: Task {
                id: 1,
                title: "epic".to_string(),
                description: String::new(),
                status: Status::New,
                start_time: None,
                duration_minutes: 0,
            },
            end_time: None,
            subtask_ids: Vec::new(),
        }
    }

    fn subtask(id: TaskId, status: Status, start_hour: Option<u32>, minutes: u32) -> Subtask {
        Subtask {
            task: Task {
                id,
                title: format!("s{id}"),
                description: String::new(),
                status,
                start_time: start_hour
                    .map(|h| Utc.with_ymd_and_hms(2026, 3, 14, h, 0, 0).unwrap()),
                duration_minutes: minutes,
            },
            epic_id: 1,
        }
    }

    #[test]
    fn empty_set_is_new_with_no_window() {
        let mut e = epic();
        recompute(&mut e, &[]);

        assert_eq!(e.task.status, Status::New);
        assert!(e.task.start_time.is_none());
        assert!(e.end_time.is_none());
        assert_eq!(e.task.duration_minutes, 0);
    }

    #[test]
    fn all_new_is_new() {
        let subs = [subtask(2, Status::New, None, 0), subtask(3, Status::New, None, 0)];
        let mut e = epic();
        recompute(&mut e, &[&subs[0], &subs[1]]);

        assert_eq!(e.task.status, Status::New);
    }

    #[test]
    fn all_done_is_done() {
        let subs = [subtask(2, Status::Done, None, 0), subtask(3, Status::Done, None, 0)];
        let mut e = epic();
        recompute(&mut e, &[&subs[0], &subs[1]]);

        assert_eq!(e.task.status, Status::Done);
    }

    #[test]
    fn mixed_new_and_done_is_in_progress() {
        let subs = [subtask(2, Status::New, None, 0), subtask(3, Status::Done, None, 0)];
        let mut e = epic();
        recompute(&mut e, &[&subs[0], &subs[1]]);

        assert_eq!(e.task.status, Status::InProgress);
    }

    #[test]
    fn any_in_progress_wins() {
        let subs = [
            subtask(2, Status::Done, None, 0),
            subtask(3, Status::InProgress, None, 0),
        ];
        let mut e = epic();
        recompute(&mut e, &[&subs[0], &subs[1]]);

        assert_eq!(e.task.status, Status::InProgress);
    }

    #[test]
    fn window_spans_earliest_start_to_latest_end_with_additive_duration() {
        let subs = [
            subtask(2, Status::New, Some(9), 30),
            subtask(3, Status::New, Some(11), 45),
            subtask(4, Status::New, None, 15),
        ];
        let mut e = epic();
        recompute(&mut e, &[&subs[0], &subs[1], &subs[2]]);

        assert_eq!(
            e.task.start_time,
            Some(Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap())
        );
        assert_eq!(
            e.end_time,
            Some(Utc.with_ymd_and_hms(2026, 3, 14, 11, 45, 0).unwrap())
        );
        // untimed subtask still counts toward the total
        assert_eq!(e.task.duration_minutes, 90);
    }

    #[test]
    fn untimed_subtasks_leave_the_window_empty() {
        let subs = [subtask(2, Status::New, None, 20)];
        let mut e = epic();
        recompute(&mut e, &[&subs[0]]);

        assert!(e.task.start_time.is_none());
        assert!(e.end_time.is_none());
        assert_eq!(e.task.duration_minutes, 20);
    }
}
