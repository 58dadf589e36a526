//! To-do tasks, and their mapping from/to store documents

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use bitflags::bitflags;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::{Document, DocumentId, Fields, Value};

/// Tasks are identified by the id of their document
pub type TaskId = DocumentId;

/// Names of the document fields
pub mod fields {
    pub const TITLE: &str = "title";
    pub const DESCRIPTION: &str = "description";
    pub const CATEGORY: &str = "category";
    pub const PRIORITY: &str = "priority";
    pub const START_DATE: &str = "startDate";
    pub const END_DATE: &str = "endDate";
    pub const COMPLETED: &str = "completed";
}


#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    School,
    Work,
    Gym,
    Personal,
    Hobbies,
    Social,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::School, Category::Work, Category::Gym,
        Category::Personal, Category::Hobbies, Category::Social,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::School => "School",
            Category::Work => "Work",
            Category::Gym => "Gym",
            Category::Personal => "Personal",
            Category::Hobbies => "Hobbies",
            Category::Social => "Social",
        }
    }

    /// The flag of this category in a [`Categories`] set
    pub fn flag(&self) -> Categories {
        match self {
            Category::School => Categories::SCHOOL,
            Category::Work => Categories::WORK,
            Category::Gym => Categories::GYM,
            Category::Personal => Categories::PERSONAL,
            Category::Hobbies => Categories::HOBBIES,
            Category::Social => Categories::SOCIAL,
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL.iter()
            .find(|c| c.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown category {:?}", s))
    }
}

bitflags! {
    /// A set of categories
    #[derive(Serialize, Deserialize)]
    pub struct Categories: u8 {
        const SCHOOL = 1;
        const WORK = 2;
        const GYM = 4;
        const PERSONAL = 8;
        const HOBBIES = 16;
        const SOCIAL = 32;
    }
}

impl Default for Categories {
    fn default() -> Self {
        Categories::all()
    }
}


/// How urgent a task is.
///
/// It is displayed (and stored) as one to three exclamation marks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn marker(&self) -> &'static str {
        match self {
            Priority::Low => "!",
            Priority::Medium => "!!",
            Priority::High => "!!!",
        }
    }

    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "!" => Some(Priority::Low),
            "!!" => Some(Priority::Medium),
            "!!!" => Some(Priority::High),
            _ => None,
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.marker())
    }
}


/// A to-do task, as read from the store
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    title: String,
    description: Option<String>,
    category: Option<Category>,
    priority: Option<Priority>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    completed: bool,
}

impl Task {
    /// Create a Task instance, that is supposed to exist on the store already
    pub fn new_with_parameters(id: TaskId, title: String, description: Option<String>,
                               category: Option<Category>, priority: Option<Priority>,
                               start_date: Option<DateTime<Utc>>, end_date: Option<DateTime<Utc>>,
                               completed: bool,
                            ) -> Self
    {
        Self { id, title, description, category, priority, start_date, end_date, completed }
    }

    /// Build a Task from a stored document.
    ///
    /// Missing or malformed fields read as `None` (or as an empty title, and as not completed).
    /// Dates are only read from `startDate` and `endDate`.
    pub fn from_document(document: &Document) -> Self {
        let id = document.id().clone();

        let title = match document.get(fields::TITLE).as_str() {
            Some(t) => t.to_string(),
            None => {
                log::warn!("Task {} has no title", id);
                String::new()
            },
        };
        let description = document.get(fields::DESCRIPTION).as_str()
            .filter(|d| d.is_empty() == false)
            .map(String::from);

        let category = match document.get(fields::CATEGORY) {
            Value::String(s) => match s.parse() {
                Ok(c) => Some(c),
                Err(err) => {
                    log::warn!("Task {}: {}. Ignoring it", id, err);
                    None
                },
            },
            _ => None,
        };
        let priority = match document.get(fields::PRIORITY) {
            Value::String(s) => {
                let p = Priority::from_marker(s);
                if p.is_none() {
                    log::warn!("Task {}: unknown priority marker {:?}. Ignoring it", id, s);
                }
                p
            },
            _ => None,
        };

        let start_date = document.get(fields::START_DATE).as_timestamp();
        let end_date = document.get(fields::END_DATE).as_timestamp();

        let completed = document.get(fields::COMPLETED).as_bool().unwrap_or(false);

        Self { id, title, description, category, priority, start_date, end_date, completed }
    }

    pub fn id(&self) -> &TaskId       { &self.id         }
    pub fn title(&self) -> &str       { &self.title      }
    pub fn completed(&self) -> bool   { self.completed   }
    pub fn description(&self) -> Option<&str>       { self.description.as_deref() }
    pub fn category(&self) -> Option<Category>      { self.category }
    pub fn priority(&self) -> Option<Priority>      { self.priority }
    pub fn start_date(&self) -> Option<&DateTime<Utc>> { self.start_date.as_ref() }
    pub fn end_date(&self) -> Option<&DateTime<Utc>>   { self.end_date.as_ref() }

    /// Set the completion status of this view model. This does not touch the store.
    pub fn set_completed(&mut self, completed: bool) {
        self.completed = completed;
    }
}


/// A task that is not in the store yet
#[derive(Clone, Debug, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub priority: Option<Priority>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl NewTask {
    pub fn new<S: ToString>(title: S) -> Self {
        Self {
            title: title.to_string(),
            description: None,
            category: None,
            priority: None,
            start_date: None,
            end_date: None,
        }
    }

    /// A task that is due at a single point in time
    pub fn due<S: ToString>(title: S, due: DateTime<Utc>) -> Self {
        Self::new(title).with_dates(Some(due), Some(due))
    }

    pub fn with_description<S: ToString>(mut self, description: S) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_dates(mut self, start_date: Option<DateTime<Utc>>, end_date: Option<DateTime<Utc>>) -> Self {
        self.start_date = start_date;
        self.end_date = end_date;
        self
    }

    /// Check this task can be written to the store
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("a task needs a title".to_string());
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                log::warn!("Task {:?} ends ({}) before it starts ({})", self.title, end, start);
            }
        }
        Ok(())
    }

    /// The fields of the document to create. New tasks are never completed.
    pub fn to_fields(&self) -> Fields {
        let mut f = Fields::new();
        f.insert(fields::TITLE.to_string(), Value::from(self.title.clone()));
        f.insert(fields::DESCRIPTION.to_string(), Value::from(self.description.clone()));
        f.insert(fields::CATEGORY.to_string(), Value::from(self.category.map(|c| c.as_str())));
        f.insert(fields::PRIORITY.to_string(), Value::from(self.priority.map(|p| p.marker())));
        f.insert(fields::START_DATE.to_string(), Value::from(self.start_date));
        f.insert(fields::END_DATE.to_string(), Value::from(self.end_date));
        f.insert(fields::COMPLETED.to_string(), Value::Boolean(false));
        f
    }
}


/// Describes which loaded tasks should be displayed
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskFilter {
    /// Tasks without a category are always shown
    #[serde(default)]
    pub categories: Categories,
    #[serde(default)]
    pub hide_completed: bool,
}

impl TaskFilter {
    pub fn accepts(&self, task: &Task) -> bool {
        if self.hide_completed && task.completed() {
            return false;
        }
        match task.category() {
            None => true,
            Some(c) => self.categories.contains(c.flag()),
        }
    }
}
