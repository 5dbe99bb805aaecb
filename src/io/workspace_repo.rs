use std::collections::HashMap;
use std::path::Path;

use crate::io::paths;
use crate::io::repo::{self, RepoError};
use crate::model::{Topic, Workspace, WorkspaceDocument, WorkspaceMetadata};
use crate::store::{Container, Datasource};

/// Workspaces across every topic of one root.
///
/// The container is rebuilt from the filesystem; the document carries what
/// outlives a scan (descriptions, linked sessions, the selected workspace).
/// Every mutation touches the filesystem first, then the container, then the
/// document, so a failed filesystem step leaves both stores untouched.
#[derive(Debug)]
pub struct WorkspaceRepository {
    container: Container<Workspace>,
    document: Datasource<WorkspaceDocument>,
}

impl WorkspaceRepository {
    /// Open the repository for `root`, reading its workspace document.
    pub fn open(root: &Path) -> Result<Self, RepoError> {
        let document = Datasource::json(paths::workspaces_file(root));
        document.load_or_recover()?;
        Ok(WorkspaceRepository {
            container: Container::new(),
            document,
        })
    }

    /// Rebuild the index from each topic's subdirectories, attaching any
    /// persisted metadata by short path. A topic whose directory has vanished
    /// contributes nothing.
    pub fn load_container(&self, topics: &[Topic]) -> Result<(), RepoError> {
        let doc = self.document.get();
        let mut items = HashMap::new();
        for topic in topics {
            let dir = topic.path();
            if !dir.is_dir() {
                tracing::debug!(topic = %topic.name, "topic directory missing, skipping");
                continue;
            }
            for name in repo::list_subdirs(&dir)? {
                let mut ws = Workspace::new(name, topic.clone());
                let key = ws.short_path();
                ws.metadata = doc.entries.get(&key).cloned().unwrap_or_default();
                items.insert(key, ws);
            }
        }
        tracing::debug!(count = items.len(), "loaded workspaces");
        self.container.replace(items);
        Ok(())
    }

    /// Prune document entries with no live workspace or nothing worth
    /// keeping, and clear a selection that no longer resolves. Always saves.
    pub fn sync(&self) -> Result<(), RepoError> {
        let live = &self.container;
        let pruned = self.document.update(|doc| {
            let before = doc.entries.len();
            doc.entries
                .retain(|key, meta| live.contains(key) && !meta.is_empty());
            if !doc.selected_workspace.is_empty() && !live.contains(&doc.selected_workspace) {
                tracing::debug!(selected = %doc.selected_workspace, "clearing stale selection");
                doc.selected_workspace.clear();
            }
            before - doc.entries.len()
        })?;
        if pruned > 0 {
            tracing::info!(pruned, "pruned orphaned workspace metadata");
        }
        Ok(())
    }

    /// All workspaces sorted by short path
    pub fn all(&self) -> Vec<Workspace> {
        let mut items = self.container.all();
        items.sort_by_key(|ws| ws.short_path());
        items
    }

    /// Workspaces of one topic, sorted by name
    pub fn for_topic(&self, topic: &str) -> Vec<Workspace> {
        let mut items: Vec<Workspace> = self
            .container
            .all()
            .into_iter()
            .filter(|ws| ws.topic.name == topic)
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        items
    }

    pub fn find(&self, short_path: &str) -> Option<Workspace> {
        self.container.get(short_path)
    }

    pub fn size(&self) -> usize {
        self.container.size()
    }

    /// Snapshot of the persisted document
    pub fn document(&self) -> WorkspaceDocument {
        self.document.get()
    }

    pub fn selected(&self) -> Option<Workspace> {
        let key = self.document.get().selected_workspace;
        if key.is_empty() {
            return None;
        }
        self.container.get(&key)
    }

    pub fn select(&self, ws: &Workspace) -> Result<(), RepoError> {
        let key = ws.short_path();
        if !self.container.contains(&key) {
            return Err(RepoError::NotFound(key));
        }
        self.document.update(|doc| doc.selected_workspace = key)?;
        Ok(())
    }

    /// Create the workspace directory if needed, index it and persist its
    /// metadata.
    pub fn save(&self, ws: &Workspace) -> Result<(), RepoError> {
        repo::ensure_dir(&ws.path())?;
        let key = ws.short_path();
        self.container.set(key.clone(), ws.clone());
        self.document
            .update(|doc| write_entry(doc, &key, &ws.metadata))?;
        Ok(())
    }

    /// Replace a workspace's metadata.
    pub fn set_metadata(
        &self,
        ws: &Workspace,
        metadata: WorkspaceMetadata,
    ) -> Result<Workspace, RepoError> {
        let key = ws.short_path();
        let mut current = self
            .container
            .get(&key)
            .ok_or_else(|| RepoError::NotFound(key.clone()))?;
        current.metadata = metadata;
        self.container.set(key.clone(), current.clone());
        self.document
            .update(|doc| write_entry(doc, &key, &current.metadata))?;
        Ok(current)
    }

    /// Rename within the same topic.
    pub fn rename(&self, ws: &Workspace, new_name: &str) -> Result<Workspace, RepoError> {
        self.relocate(ws, &ws.topic, new_name)
    }

    /// Move into another topic, keeping the name.
    pub fn move_to(&self, ws: &Workspace, topic: &Topic) -> Result<Workspace, RepoError> {
        if ws.topic.name == topic.name {
            return Err(RepoError::Unchanged(ws.short_path()));
        }
        let target = Workspace::new(ws.name.clone(), topic.clone());
        if self.container.contains(&target.short_path()) || target.path().exists() {
            return Err(RepoError::Conflict(target.short_path()));
        }
        self.relocate(ws, topic, &ws.name)
    }

    /// Re-key a workspace whose topic directory has already been renamed.
    /// No filesystem work happens here.
    pub fn retopic(&self, ws: &Workspace, topic: &Topic) -> Result<Workspace, RepoError> {
        let old_key = ws.short_path();
        let current = self
            .container
            .get(&old_key)
            .ok_or_else(|| RepoError::NotFound(old_key.clone()))?;
        let moved = Workspace {
            name: current.name,
            topic: topic.clone(),
            metadata: current.metadata,
        };
        let new_key = moved.short_path();
        if self.container.contains(&new_key) {
            return Err(RepoError::Conflict(new_key));
        }
        self.container.rekey(&old_key, new_key.clone(), moved.clone());
        self.document
            .update(|doc| rekey_entry(doc, &old_key, &new_key))?;
        Ok(moved)
    }

    /// Remove the workspace directory, then its index and document entries.
    pub fn delete(&self, ws: &Workspace) -> Result<(), RepoError> {
        repo::remove_dir(&ws.path())?;
        let key = ws.short_path();
        self.container.delete(&key);
        self.document.update(|doc| {
            doc.entries.remove(&key);
            if doc.selected_workspace == key {
                doc.selected_workspace.clear();
            }
        })?;
        Ok(())
    }

    /// Drop every index and document entry under a topic whose directory is
    /// already gone.
    pub fn forget_topic(&self, topic: &str) -> Result<(), RepoError> {
        let prefix = format!("{}/", topic);
        for key in self.container.keys() {
            if key.starts_with(&prefix) {
                self.container.delete(&key);
            }
        }
        self.document.update(|doc| {
            doc.entries.retain(|key, _| !key.starts_with(&prefix));
            if doc.selected_workspace.starts_with(&prefix) {
                doc.selected_workspace.clear();
            }
        })?;
        Ok(())
    }

    fn relocate(
        &self,
        ws: &Workspace,
        topic: &Topic,
        new_name: &str,
    ) -> Result<Workspace, RepoError> {
        let old_key = ws.short_path();
        let current = self
            .container
            .get(&old_key)
            .ok_or_else(|| RepoError::NotFound(old_key.clone()))?;
        let target = Workspace {
            name: new_name.to_string(),
            topic: topic.clone(),
            metadata: current.metadata.clone(),
        };
        let new_key = target.short_path();
        if new_key == old_key {
            return Err(RepoError::Unchanged(new_key));
        }
        if self.container.contains(&new_key) {
            return Err(RepoError::Conflict(new_key));
        }

        repo::rename_dir(&current.path(), &target.path())?;
        self.container.rekey(&old_key, new_key.clone(), target.clone());
        self.document
            .update(|doc| rekey_entry(doc, &old_key, &new_key))?;
        tracing::info!(from = %old_key, to = %new_key, "workspace relocated");
        Ok(target)
    }
}

fn write_entry(doc: &mut WorkspaceDocument, key: &str, metadata: &WorkspaceMetadata) {
    if metadata.is_empty() {
        doc.entries.remove(key);
    } else {
        doc.entries.insert(key.to_string(), metadata.clone());
    }
}

fn rekey_entry(doc: &mut WorkspaceDocument, old_key: &str, new_key: &str) {
    if let Some(meta) = doc.entries.remove(old_key) {
        doc.entries.insert(new_key.to_string(), meta);
    }
    if doc.selected_workspace == old_key {
        doc.selected_workspace = new_key.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::atomic_write;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn setup(dirs: &[&str], doc: &str) -> (TempDir, Vec<Topic>, WorkspaceRepository) {
        let tmp = TempDir::new().unwrap();
        for d in dirs {
            fs::create_dir_all(tmp.path().join(d)).unwrap();
        }
        atomic_write(&paths::workspaces_file(tmp.path()), doc.as_bytes()).unwrap();
        let mut topics: Vec<Topic> = dirs
            .iter()
            .filter_map(|d| d.split('/').next())
            .map(|t| Topic::new(t, tmp.path()))
            .collect();
        topics.dedup();
        let repo = WorkspaceRepository::open(tmp.path()).unwrap();
        repo.load_container(&topics).unwrap();
        (tmp, topics, repo)
    }

    const DOC: &str = r#"{
  "entries": {
    "alpha/w1": { "description": "first", "linkedSessionName": "alpha/w1" },
    "alpha/gone": { "description": "orphan" },
    "beta/empty": { "description": "" }
  },
  "selectedWorkspace": "alpha/w1"
}"#;

    #[test]
    fn load_attaches_metadata() {
        let (_tmp, _topics, repo) = setup(&["alpha/w1", "alpha/w2", "beta/empty"], DOC);
        let w1 = repo.find("alpha/w1").unwrap();
        assert_eq!(w1.metadata.description, "first");
        assert_eq!(w1.metadata.linked_session_name.as_deref(), Some("alpha/w1"));
        assert!(repo.find("alpha/w2").unwrap().metadata.is_empty());
        assert_eq!(repo.size(), 3);
    }

    #[test]
    fn load_twice_gives_same_index() {
        let (_tmp, topics, repo) = setup(&["alpha/w1", "alpha/w2"], DOC);
        let first = repo.all();
        repo.load_container(&topics).unwrap();
        assert_eq!(repo.all(), first);
    }

    #[test]
    fn sync_prunes_orphans_and_empty_entries() {
        let (_tmp, _topics, repo) = setup(&["alpha/w1", "beta/empty"], DOC);
        repo.sync().unwrap();
        let doc = repo.document();
        let keys: Vec<&String> = doc.entries.keys().collect();
        assert_eq!(keys, vec!["alpha/w1"]);
        assert_eq!(doc.selected_workspace, "alpha/w1");
    }

    #[test]
    fn sync_clears_unresolvable_selection() {
        let (_tmp, _topics, repo) = setup(&["alpha/w2"], DOC);
        repo.sync().unwrap();
        assert_eq!(repo.document().selected_workspace, "");
        assert!(repo.selected().is_none());
    }

    #[test]
    fn sync_persists_to_disk() {
        let (tmp, _topics, repo) = setup(&["alpha/w2"], DOC);
        repo.sync().unwrap();
        let reopened = WorkspaceRepository::open(tmp.path()).unwrap();
        assert!(reopened.document().entries.is_empty());
    }

    #[test]
    fn rename_moves_entry_and_selection() {
        let (tmp, _topics, repo) = setup(&["alpha/w1"], DOC);
        let ws = repo.find("alpha/w1").unwrap();
        let renamed = repo.rename(&ws, "main").unwrap();
        assert_eq!(renamed.short_path(), "alpha/main");
        assert!(tmp.path().join("alpha/main").is_dir());
        assert!(!tmp.path().join("alpha/w1").exists());
        let doc = repo.document();
        assert!(doc.entries.contains_key("alpha/main"));
        assert!(!doc.entries.contains_key("alpha/w1"));
        assert_eq!(doc.selected_workspace, "alpha/main");
    }

    #[test]
    fn rename_to_existing_name_changes_nothing() {
        let (tmp, _topics, repo) = setup(&["alpha/w1", "alpha/w2"], DOC);
        let before_disk = fs::read(paths::workspaces_file(tmp.path())).unwrap();
        let before_doc = repo.document();
        let ws = repo.find("alpha/w1").unwrap();
        let err = repo.rename(&ws, "w2").unwrap_err();
        assert!(matches!(err, RepoError::Conflict(_)));
        assert!(tmp.path().join("alpha/w1").is_dir());
        assert_eq!(repo.document(), before_doc);
        assert_eq!(fs::read(paths::workspaces_file(tmp.path())).unwrap(), before_disk);
        assert!(repo.find("alpha/w1").is_some());
    }

    #[test]
    fn failed_filesystem_rename_leaves_stores_alone() {
        let (tmp, _topics, repo) = setup(&["alpha/w1"], DOC);
        let ws = repo.find("alpha/w1").unwrap();
        fs::remove_dir_all(tmp.path().join("alpha/w1")).unwrap();
        let err = repo.rename(&ws, "w9").unwrap_err();
        assert!(matches!(err, RepoError::Io { .. }));
        assert!(repo.find("alpha/w1").is_some());
        assert!(repo.document().entries.contains_key("alpha/w1"));
    }

    #[test]
    fn move_to_same_topic_is_rejected() {
        let (_tmp, topics, repo) = setup(&["alpha/w1", "beta/x"], DOC);
        let ws = repo.find("alpha/w1").unwrap();
        let err = repo.move_to(&ws, &topics[0]).unwrap_err();
        assert!(matches!(err, RepoError::Unchanged(_)));
    }

    #[test]
    fn move_into_other_topic() {
        let (tmp, topics, repo) = setup(&["alpha/w1", "beta/x"], DOC);
        let ws = repo.find("alpha/w1").unwrap();
        let moved = repo.move_to(&ws, &topics[1]).unwrap();
        assert_eq!(moved.short_path(), "beta/w1");
        assert!(tmp.path().join("beta/w1").is_dir());
        assert_eq!(moved.metadata.description, "first");
        assert!(repo.document().entries.contains_key("beta/w1"));
    }

    #[test]
    fn move_collision_is_rejected() {
        let (tmp, topics, repo) = setup(&["alpha/w1", "beta/w1"], DOC);
        let ws = repo.find("alpha/w1").unwrap();
        let err = repo.move_to(&ws, &topics[1]).unwrap_err();
        assert!(matches!(err, RepoError::Conflict(_)));
        assert!(tmp.path().join("alpha/w1").is_dir());
    }

    #[test]
    fn delete_selected_clears_pointer() {
        let (tmp, _topics, repo) = setup(&["alpha/w1"], DOC);
        let ws = repo.find("alpha/w1").unwrap();
        repo.delete(&ws).unwrap();
        assert!(!tmp.path().join("alpha/w1").exists());
        assert!(repo.find("alpha/w1").is_none());
        let doc = repo.document();
        assert_eq!(doc.selected_workspace, "");
        assert!(!doc.entries.contains_key("alpha/w1"));
    }

    #[test]
    fn save_creates_directory_and_entry() {
        let (tmp, topics, repo) = setup(&["alpha/w1"], "{}");
        let mut ws = Workspace::new("new", topics[0].clone());
        ws.metadata.description = "fresh".into();
        repo.save(&ws).unwrap();
        assert!(tmp.path().join("alpha/new").is_dir());
        assert_eq!(repo.document().entries["alpha/new"].description, "fresh");
        repo.select(&ws).unwrap();
        assert_eq!(repo.selected().unwrap().short_path(), "alpha/new");
    }

    #[test]
    fn retopic_rekeys_without_touching_disk() {
        let (tmp, _topics, repo) = setup(&["alpha/w1"], DOC);
        fs::rename(tmp.path().join("alpha"), tmp.path().join("beta")).unwrap();
        let ws = repo.find("alpha/w1").unwrap();
        let moved = repo
            .retopic(&ws, &Topic::new("beta", tmp.path()))
            .unwrap();
        assert_eq!(moved.short_path(), "beta/w1");
        assert!(repo.find("alpha/w1").is_none());
        assert_eq!(repo.document().selected_workspace, "beta/w1");
    }

    #[test]
    fn forget_topic_drops_entries() {
        let (_tmp, _topics, repo) = setup(&["alpha/w1", "beta/empty"], DOC);
        repo.forget_topic("alpha").unwrap();
        assert!(repo.find("alpha/w1").is_none());
        assert!(repo.find("beta/empty").is_some());
        let doc = repo.document();
        assert!(doc.entries.keys().all(|k| !k.starts_with("alpha/")));
        assert_eq!(doc.selected_workspace, "");
    }

    #[test]
    fn corrupt_document_is_backed_up() {
        let tmp = TempDir::new().unwrap();
        let file = paths::workspaces_file(tmp.path());
        atomic_write(&file, b"{ broken").unwrap();
        let repo = WorkspaceRepository::open(tmp.path()).unwrap();
        assert_eq!(repo.document(), WorkspaceDocument::default());
        assert!(tmp.path().join(".hangar/workspaces.json.bak").exists());
    }
}
