//! Support for library configuration options

use std::error::Error;
use std::path::Path;
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::task::TaskFilter;

/// Root of the Firestore REST API
pub const FIRESTORE_API_ROOT: &str = "https://firestore.googleapis.com/v1/";

/// Name of the collection tasks are stored into, unless a sync layer is given another one.
/// Feel free to override it when initing this library.
pub static COLLECTION_NAME: Lazy<Arc<Mutex<String>>> = Lazy::new(|| Arc::new(Mutex::new("tasks".to_string())));

/// Returns the current value of [`COLLECTION_NAME`]
pub fn default_collection() -> String {
    COLLECTION_NAME.lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

fn default_database() -> String {
    "(default)".to_string()
}


/// Where the tasks are stored, and how they are displayed by default
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub project_id: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default)]
    pub default_filter: TaskFilter,
}

impl Settings {
    pub fn new<S: ToString>(project_id: S) -> Self {
        Self {
            project_id: project_id.to_string(),
            database: default_database(),
            api_key: None,
            collection: default_collection(),
            default_filter: TaskFilter::default(),
        }
    }

    /// Read settings from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn Error>> {
        let settings = match std::fs::File::open(path) {
            Err(err) => {
                return Err(format!("Unable to open file {:?}: {}", path, err).into());
            },
            Ok(file) => serde_json::from_reader(file)?,
        };
        Ok(settings)
    }

    /// Read settings from the `SECOND_BRAIN_*` environment variables.
    ///
    /// `SECOND_BRAIN_PROJECT_ID` is required, `SECOND_BRAIN_API_KEY`, `SECOND_BRAIN_DATABASE` and `SECOND_BRAIN_COLLECTION` are optional
    pub fn from_env() -> Result<Self, Box<dyn Error>> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    fn from_vars<F: Fn(&str) -> Option<String>>(var: F) -> Result<Self, Box<dyn Error>> {
        let project_id = var("SECOND_BRAIN_PROJECT_ID")
            .ok_or("SECOND_BRAIN_PROJECT_ID is not set")?;

        let mut settings = Self::new(project_id);
        settings.api_key = var("SECOND_BRAIN_API_KEY");
        if let Some(database) = var("SECOND_BRAIN_DATABASE") {
            settings.database = database;
        }
        if let Some(collection) = var("SECOND_BRAIN_COLLECTION") {
            settings.collection = collection;
        }
        Ok(settings)
    }

    /// The URL all documents of the database live under
    pub fn documents_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(FIRESTORE_API_ROOT)?
            .join(&format!("projects/{}/databases/{}/documents", self.project_id, self.database))
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::task::Categories;

    #[test]
    fn json_settings() {
        let settings: Settings = serde_json::from_str(r#"{ "project_id": "secondbrain375" }"#).unwrap();
        assert_eq!(settings, Settings::new("secondbrain375"));
        assert_eq!(settings.collection, "tasks");

        let settings: Settings = serde_json::from_str(r#"{
            "project_id": "p",
            "api_key": "k",
            "collection": "todos",
            "default_filter": { "hide_completed": true }
        }"#).unwrap();
        assert_eq!(settings.api_key.as_deref(), Some("k"));
        assert_eq!(settings.collection, "todos");
        assert!(settings.default_filter.hide_completed);
        assert_eq!(settings.default_filter.categories, Categories::all());
    }

    #[test]
    fn env_settings() {
        let vars: HashMap<&str, &str> = vec![
            ("SECOND_BRAIN_PROJECT_ID", "p"),
            ("SECOND_BRAIN_API_KEY", "k"),
        ].into_iter().collect();
        let settings = Settings::from_vars(|name| vars.get(name).map(|v| v.to_string())).unwrap();
        assert_eq!(settings.project_id, "p");
        assert_eq!(settings.api_key.as_deref(), Some("k"));
        assert_eq!(settings.database, "(default)");

        assert!(Settings::from_vars(|_| None).is_err());
    }

    #[test]
    fn poisoned_collection_name_is_still_readable() {
        let result = std::thread::spawn(|| {
            let _guard = COLLECTION_NAME.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            panic!("panicking while holding the collection name");
        }).join();
        assert!(result.is_err());
        assert_eq!(default_collection(), "tasks");
    }

    #[test]
    fn url() {
        let settings = Settings::new("secondbrain375");
        assert_eq!(settings.documents_url().unwrap().as_str(),
            "https://firestore.googleapis.com/v1/projects/secondbrain375/databases/(default)/documents");
    }
}
