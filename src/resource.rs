use url::Url;

/// Just a wrapper around the root URL of the documents of a database, and credentials
#[derive(Clone, Debug)]
pub struct Resource {
    url: Url,
    api_key: Option<String>,
}

impl Resource {
    pub fn new(url: Url, api_key: Option<String>) -> Self {
        Self { url, api_key }
    }

    pub fn url(&self) -> &Url { &self.url }
    pub fn api_key(&self) -> Option<&str> { self.api_key.as_deref() }

    /// Build a new URL by keeping the same scheme and server from `self` but appending `suffix` to the path.
    ///
    /// `suffix` is appended verbatim, so that it can also be a custom method such as `:runQuery`
    pub fn combine(&self, suffix: &str) -> Url {
        let mut built = self.url.clone();
        let path = format!("{}{}", self.url.path().trim_end_matches('/'), suffix);
        built.set_path(&path);
        built
    }

    pub fn collection_url(&self, collection: &str) -> Url {
        self.combine(&format!("/{}", collection))
    }

    pub fn document_url(&self, collection: &str, id: &str) -> Url {
        self.combine(&format!("/{}/{}", collection, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls() {
        let root = Url::parse("https://firestore.googleapis.com/v1/projects/demo/databases/(default)/documents/").unwrap();
        let resource = Resource::new(root, Some("key".to_string()));

        assert_eq!(resource.collection_url("tasks").as_str(),
            "https://firestore.googleapis.com/v1/projects/demo/databases/(default)/documents/tasks");
        assert_eq!(resource.document_url("tasks", "a1").as_str(),
            "https://firestore.googleapis.com/v1/projects/demo/databases/(default)/documents/tasks/a1");
        assert_eq!(resource.combine(":runQuery").as_str(),
            "https://firestore.googleapis.com/v1/projects/demo/databases/(default)/documents:runQuery");
        assert_eq!(resource.api_key(), Some("key"));
    }
}
