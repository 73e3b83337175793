use crate::error::Result;
use crate::sentence_list::{title_for_path, SentenceList};
use crate::store::{SentenceListRow, Store};
use std::fs;
use std::path::Path;

/// What the synchronization protocol did with a list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Inserted,
    Updated,
}

#[derive(Debug, Clone)]
enum Current {
    /// Nothing registered yet: an empty "Default" list stands in.
    Placeholder(SentenceList),
    Listed(usize),
    /// Every list was deleted (or a selection went out of range).
    NoLists,
}

/// Known sentence lists, the active one, and the lists deleted this run.
#[derive(Debug, Clone)]
pub struct ListRegistry {
    lists: Vec<SentenceList>,
    current: Current,
    deleted: Vec<SentenceList>,
}

impl ListRegistry {
    pub fn new(lists: Vec<SentenceList>) -> Self {
        let current = if lists.is_empty() {
            Current::Placeholder(SentenceList::default())
        } else {
            Current::Listed(0)
        };
        Self {
            lists,
            current,
            deleted: Vec::new(),
        }
    }

    /// Build the registry from the store. When nothing is persisted yet the
    /// default sentence file, if present, becomes the first list and is
    /// written straight away.
    pub fn load<S: Store>(store: &mut S, default_sentences: Option<&Path>) -> Result<Self> {
        let mut lists = Vec::new();
        for row in store.get_all_sentence_lists()? {
            let title = row.title.clone();
            match row.into_list() {
                Ok(list) => lists.push(list),
                Err(err) => log::warn!("skipping stored list '{}': {}", title, err),
            }
        }

        if lists.is_empty() {
            if let Some(path) = default_sentences.filter(|p| p.exists()) {
                let contents = fs::read_to_string(path)?;
                let list = SentenceList::from_lines(&contents, crate::sentence_list::DEFAULT_TITLE);
                store.add_sentence_list(&SentenceListRow::from_list(&list)?)?;
                log::info!(
                    "seeded {} default sentences from {}",
                    list.sentences.len(),
                    path.display()
                );
                lists.push(list);
            }
        }

        log::debug!("loaded {} sentence lists", lists.len());
        Ok(Self::new(lists))
    }

    pub fn lists(&self) -> &[SentenceList] {
        &self.lists
    }

    pub fn deleted(&self) -> &[SentenceList] {
        &self.deleted
    }

    pub fn current(&self) -> Option<&SentenceList> {
        match &self.current {
            Current::Placeholder(list) => Some(list),
            Current::Listed(idx) => self.lists.get(*idx),
            Current::NoLists => None,
        }
    }

    pub fn current_mut(&mut self) -> Option<&mut SentenceList> {
        match &mut self.current {
            Current::Placeholder(list) => Some(list),
            Current::Listed(idx) => self.lists.get_mut(*idx),
            Current::NoLists => None,
        }
    }

    pub fn current_index(&self) -> Option<usize> {
        match self.current {
            Current::Listed(idx) => Some(idx),
            _ => None,
        }
    }

    pub fn has_current(&self) -> bool {
        self.current().is_some()
    }

    pub fn set_no_lists(&mut self) {
        self.current = Current::NoLists;
    }

    /// Reconcile `list` with the store before it stops being current.
    ///
    /// The persisted rows are re-read every time. A non-empty list whose
    /// content is not stored yet and which was not deleted this run is
    /// inserted; anything else updates the row with the same content, which
    /// is a no-op when no such row exists. The update is keyed on the stored
    /// JSON text, so rows written with different spacing still match.
    pub fn sync<S: Store>(&self, store: &mut S, list: &SentenceList) -> Result<SyncOutcome> {
        let stored_key = stored_key(store, list)?;

        let mut row = SentenceListRow::from_list(list)?;
        if !list.is_empty() && stored_key.is_none() && !self.deleted.contains(list) {
            store.add_sentence_list(&row)?;
            log::info!("inserted sentence list '{}'", list.title);
            Ok(SyncOutcome::Inserted)
        } else {
            if let Some(key) = stored_key {
                row.sentences_json = key;
            }
            store.update_sentence_list(&row)?;
            log::debug!("updated sentence list '{}'", list.title);
            Ok(SyncOutcome::Updated)
        }
    }

    /// Run [`sync`](Self::sync) for the current list, if there is one.
    pub fn sync_current<S: Store>(&self, store: &mut S) -> Result<Option<SyncOutcome>> {
        match self.current() {
            Some(list) => self.sync(store, list).map(Some),
            None => Ok(None),
        }
    }

    /// Persist the current list, then make `index` current. Returns false and
    /// falls back to the no-lists state when `index` is out of range.
    pub fn switch_to<S: Store>(&mut self, store: &mut S, index: usize) -> Result<bool> {
        self.sync_current(store)?;
        if index < self.lists.len() {
            self.current = Current::Listed(index);
            Ok(true)
        } else {
            log::warn!("list selection {} out of range, no list active", index);
            self.current = Current::NoLists;
            Ok(false)
        }
    }

    /// Register the contents of a sentence file and make it current.
    ///
    /// A file whose base name matches an existing title reuses that list, as
    /// does a file with the same sentences as a registered list.
    /// Returns the index of the now-current list.
    pub fn import<S: Store>(&mut self, store: &mut S, path: &Path, contents: &str) -> Result<usize> {
        self.sync_current(store)?;

        let title = title_for_path(path);
        let list = SentenceList::from_lines(contents, title);
        let known = self
            .lists
            .iter()
            .position(|existing| existing.title == list.title)
            .or_else(|| self.lists.iter().position(|existing| *existing == list));
        let index = match known {
            Some(idx) => {
                log::debug!(
                    "'{}' is already registered as '{}'",
                    list.title,
                    self.lists[idx].title
                );
                idx
            }
            None => {
                log::info!(
                    "registered list '{}' with {} sentences",
                    list.title,
                    list.sentences.len()
                );
                self.lists.push(list);
                self.lists.len() - 1
            }
        };

        self.current = Current::Listed(index);
        Ok(index)
    }

    /// Remove a list from the registry and the store. It is remembered as
    /// deleted so no later synchronization re-inserts it.
    ///
    /// Returns true when the deleted list was the current one.
    pub fn delete<S: Store>(&mut self, store: &mut S, index: usize) -> Result<bool> {
        if index >= self.lists.len() {
            return Ok(false);
        }

        let removed = self.lists.remove(index);
        let key = match stored_key(store, &removed)? {
            Some(key) => key,
            None => removed.sentences_json()?,
        };
        store.delete_sentence_list(&key)?;
        log::info!("deleted sentence list '{}'", removed.title);
        self.deleted.push(removed);

        let was_current = match self.current {
            Current::Listed(idx) if idx == index => {
                self.current = if self.lists.is_empty() {
                    Current::NoLists
                } else {
                    Current::Listed(0)
                };
                true
            }
            Current::Listed(idx) if idx > index => {
                self.current = Current::Listed(idx - 1);
                false
            }
            _ => false,
        };
        Ok(was_current)
    }

    /// Change a list's title and write it to the row with the same content.
    /// Blank titles are ignored.
    pub fn rename<S: Store>(&mut self, store: &mut S, index: usize, new_title: &str) -> Result<()> {
        let new_title = new_title.trim();
        if new_title.is_empty() {
            return Ok(());
        }
        if let Some(list) = self.lists.get_mut(index) {
            log::info!("renaming list '{}' to '{}'", list.title, new_title);
            list.title = new_title.to_string();
            store.update_sentence_list(&SentenceListRow::from_list(list)?)?;
        }
        Ok(())
    }
}

/// The stored `sentences` text of the row holding the same sentences as `list`
fn stored_key<S: Store>(store: &S, list: &SentenceList) -> Result<Option<String>> {
    Ok(store
        .get_all_sentence_lists()?
        .into_iter()
        .find(|row| {
            SentenceList::parse_sentences(&row.sentences_json)
                .map(|sentences| sentences == list.sentences)
                .unwrap_or(false)
        })
        .map(|row| row.sentences_json))
}
