use std::collections::HashMap;
use std::path::PathBuf;

use crate::io::repo::{self, RepoError};
use crate::model::Topic;
use crate::store::Container;

/// Topics are the top-level directories of the root. Nothing about a topic is
/// persisted beyond its directory, so the index is the whole story.
#[derive(Debug)]
pub struct TopicRepository {
    root: PathBuf,
    container: Container<Topic>,
}

impl TopicRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        TopicRepository {
            root: root.into(),
            container: Container::new(),
        }
    }

    /// Rebuild the index from the root's subdirectories.
    pub fn load_container(&self) -> Result<(), RepoError> {
        let names = repo::list_subdirs(&self.root)?;
        let items: HashMap<String, Topic> = names
            .into_iter()
            .map(|name| (name.clone(), Topic::new(name, &self.root)))
            .collect();
        tracing::debug!(count = items.len(), root = %self.root.display(), "loaded topics");
        self.container.replace(items);
        Ok(())
    }

    /// All topics sorted by name
    pub fn all(&self) -> Vec<Topic> {
        let mut topics = self.container.all();
        topics.sort_by(|a, b| a.name.cmp(&b.name));
        topics
    }

    pub fn find(&self, name: &str) -> Option<Topic> {
        self.container.get(name)
    }

    pub fn size(&self) -> usize {
        self.container.size()
    }

    /// Build a topic handle rooted here (not yet saved).
    pub fn topic(&self, name: &str) -> Topic {
        Topic::new(name, &self.root)
    }

    /// Create the topic's directory if needed and index it.
    pub fn save(&self, topic: &Topic) -> Result<(), RepoError> {
        repo::ensure_dir(&topic.path())?;
        self.container.set(topic.name.clone(), topic.clone());
        Ok(())
    }

    /// Rename the topic's directory and re-index it. Nothing changes if the
    /// new name is taken or the rename fails.
    pub fn rename(&self, topic: &Topic, new_name: &str) -> Result<Topic, RepoError> {
        if !self.container.contains(&topic.name) {
            return Err(RepoError::NotFound(topic.name.clone()));
        }
        if topic.name == new_name {
            return Err(RepoError::Unchanged(new_name.to_string()));
        }
        let renamed = topic.renamed(new_name);
        if self.container.contains(new_name) {
            return Err(RepoError::Conflict(new_name.to_string()));
        }
        repo::rename_dir(&topic.path(), &renamed.path())?;
        self.container
            .rekey(&topic.name, renamed.name.clone(), renamed.clone());
        Ok(renamed)
    }

    /// Remove the topic's directory tree, then drop it from the index.
    pub fn delete(&self, topic: &Topic) -> Result<(), RepoError> {
        repo::remove_dir(&topic.path())?;
        self.container.delete(&topic.name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn repo_with(names: &[&str]) -> (TempDir, TopicRepository) {
        let tmp = TempDir::new().unwrap();
        for name in names {
            fs::create_dir_all(tmp.path().join(name)).unwrap();
        }
        fs::create_dir_all(tmp.path().join(".hangar")).unwrap();
        let repo = TopicRepository::new(tmp.path());
        repo.load_container().unwrap();
        (tmp, repo)
    }

    #[test]
    fn load_skips_reserved_dir() {
        let (_tmp, repo) = repo_with(&["beta", "alpha"]);
        let names: Vec<String> = repo.all().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["alpha", "beta"]);
    }

    #[test]
    fn load_is_idempotent() {
        let (_tmp, repo) = repo_with(&["alpha"]);
        let first = repo.all();
        repo.load_container().unwrap();
        assert_eq!(repo.all(), first);
    }

    #[test]
    fn save_creates_directory() {
        let (tmp, repo) = repo_with(&[]);
        let topic = repo.topic("fresh");
        repo.save(&topic).unwrap();
        assert!(tmp.path().join("fresh").is_dir());
        assert!(repo.find("fresh").is_some());
    }

    #[test]
    fn rename_moves_directory_and_key() {
        let (tmp, repo) = repo_with(&["alpha"]);
        let topic = repo.find("alpha").unwrap();
        let renamed = repo.rename(&topic, "beta").unwrap();
        assert_eq!(renamed.name, "beta");
        assert!(!tmp.path().join("alpha").exists());
        assert!(tmp.path().join("beta").is_dir());
        assert!(repo.find("alpha").is_none());
        assert!(repo.find("beta").is_some());
    }

    #[test]
    fn rename_conflict_changes_nothing() {
        let (tmp, repo) = repo_with(&["alpha", "beta"]);
        let topic = repo.find("alpha").unwrap();
        let err = repo.rename(&topic, "beta").unwrap_err();
        assert!(matches!(err, RepoError::Conflict(_)));
        assert!(tmp.path().join("alpha").is_dir());
        assert_eq!(repo.size(), 2);
    }

    #[test]
    fn delete_removes_tree() {
        let (tmp, repo) = repo_with(&["alpha"]);
        fs::create_dir_all(tmp.path().join("alpha/w1")).unwrap();
        let topic = repo.find("alpha").unwrap();
        repo.delete(&topic).unwrap();
        assert!(!tmp.path().join("alpha").exists());
        assert!(repo.find("alpha").is_none());
    }
}
