//! Care tasks mirrored from the remote API.
//!
//! Failures are logged and swallowed; whatever was shown before stays.

use crate::api::ApiClient;
use crate::models::{NewTask, Task};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::error;

#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    tasks: Arc<Vec<Task>>,
    calendar: Arc<BTreeMap<String, Vec<Task>>>,
}

impl TaskStore {
    pub fn tasks(&self) -> Arc<Vec<Task>> {
        Arc::clone(&self.tasks)
    }

    pub fn calendar(&self) -> Arc<BTreeMap<String, Vec<Task>>> {
        Arc::clone(&self.calendar)
    }

    pub fn set_tasks(&mut self, tasks: Vec<Task>) {
        self.tasks = Arc::new(tasks);
    }

    pub fn set_calendar(&mut self, calendar: BTreeMap<String, Vec<Task>>) {
        self.calendar = Arc::new(calendar);
    }

    pub fn tasks_due_on(&self, day: &str) -> Vec<Task> {
        if let Some(entries) = self.calendar.get(day) {
            return entries.clone();
        }
        self.tasks
            .iter()
            .filter(|task| task.due_date.starts_with(day))
            .cloned()
            .collect()
    }

    pub async fn fetch_user_tasks(&mut self, api: &ApiClient, user_id: &str) {
        match api.user_tasks(user_id).await {
            Ok(tasks) => self.set_tasks(tasks),
            Err(err) => error!("failed to fetch tasks: {err}"),
        }
    }

    pub async fn add_task(&mut self, api: &ApiClient, user_id: &str, task: &NewTask) {
        match api.create_task(user_id, task).await {
            Ok(created) => {
                let mut next = self.tasks.as_ref().clone();
                next.push(created);
                self.set_tasks(next);
            }
            Err(err) => error!("failed to add task: {err}"),
        }
    }

    pub async fn mark_task_complete(&mut self, api: &ApiClient, task_id: &str) {
        match api.complete_task(task_id).await {
            Ok(()) => self.mark_completed_locally(task_id),
            Err(err) => error!("failed to complete task: {err}"),
        }
    }

    pub async fn fetch_calendar_tasks(&mut self, api: &ApiClient, user_id: &str) {
        match api.calendar_tasks(user_id).await {
            Ok(calendar) => self.set_calendar(calendar),
            Err(err) => error!("failed to fetch calendar tasks: {err}"),
        }
    }

    fn mark_completed_locally(&mut self, task_id: &str) {
        let next = self
            .tasks
            .iter()
            .map(|task| {
                if task.id == task_id {
                    Task {
                        completed: true,
                        ..task.clone()
                    }
                } else {
                    task.clone()
                }
            })
            .collect();
        self.set_tasks(next);
    }
}

/// Day picked on the tasks calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectedDate(NaiveDate);

impl SelectedDate {
    pub fn new(day: NaiveDate) -> Self {
        Self(day)
    }

    pub fn get(&self) -> NaiveDate {
        self.0
    }

    pub fn set(&mut self, day: NaiveDate) {
        self.0 = day;
    }
}
