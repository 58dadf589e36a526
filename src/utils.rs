//! Some utility functions

use crate::sync::TaskListState;
use crate::task::{Task, TaskFilter};

/// A debug utility that pretty-prints a task
pub fn print_task(task: &Task) {
    let completion = if task.completed() { "✓" } else { " " };
    let priority = task.priority().map(|p| p.marker()).unwrap_or("");
    let category = task.category().map(|c| c.to_string()).unwrap_or_default();
    let start = task.start_date()
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "----------------".to_string());
    println!("    [{}] {}  {:<3} {}\t{}\t{}", completion, start, priority, task.title(), category, task.id());
}

/// A debug utility that pretty-prints the tasks of a state that a filter accepts
pub fn print_task_list(state: &TaskListState, filter: &TaskFilter) {
    println!("{} ({} tasks)", state.scope(), state.tasks().len());
    if let Some(err) = state.last_error() {
        println!("    ! {}", err);
    }
    for task in state.visible_tasks(filter) {
        print_task(task);
    }
}
