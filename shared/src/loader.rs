//! Model catalog and load tickets.
//!
//! Loading is the only asynchronous operation. The session hands out a [`LoadRequest`] per
//! selection; the host fetches the asset wherever it likes (another thread, an async task) and
//! reports back through the request's [`LoadCompleter`]. Completions queue up in a
//! [`LoadInbox`] that the session drains at the top of its next frame, and each one carries the
//! liveness token (session id + selection generation) of the ticket it answers.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::{error::AssetError, scene::ModelScene};

/// Identifiers of the loadable models, in display order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModelCatalog {
    ids: Vec<String>,
}

impl ModelCatalog {
    pub fn new(ids: Vec<String>) -> Self {
        Self { ids }
    }

    /// Parse the model list document: a JSON array of strings. An empty array is valid.
    pub fn from_json(path: &str, text: &str) -> Result<Self, AssetError> {
        let ids: Vec<String> =
            serde_json::from_str(text).map_err(|source| AssetError::ModelList {
                path: path.to_owned(),
                source,
            })?;
        Ok(Self::new(ids))
    }

    #[inline]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.ids.get(index).map(String::as_str)
    }
}

/// Label shown for a model: its identifier without the glTF extension.
pub fn display_name(id: &str) -> &str {
    id.strip_suffix(".glb")
        .or_else(|| id.strip_suffix(".gltf"))
        .unwrap_or(id)
}

/// `<models_dir>/<id>` with exactly one separator.
pub fn model_path(models_dir: &str, id: &str) -> String {
    let dir = models_dir.trim_end_matches('/');
    let id = id.trim_start_matches('/');
    if dir.is_empty() {
        id.to_owned()
    } else {
        format!("{dir}/{id}")
    }
}

/// Liveness token plus the model a load was issued for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadTicket {
    pub session: u64,
    pub generation: u64,
    pub model_index: usize,
    pub model_id: String,
}

#[derive(Debug)]
pub struct LoadCompletion {
    pub ticket: LoadTicket,
    pub result: Result<ModelScene, AssetError>,
}

/// Thread-safe queue of finished loads.
#[derive(Clone, Debug, Default)]
pub struct LoadInbox {
    queue: Arc<Mutex<Vec<LoadCompletion>>>,
}

impl LoadInbox {
    fn lock(&self) -> MutexGuard<'_, Vec<LoadCompletion>> {
        // A panicking producer cannot leave the Vec in a broken state.
        self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn completer(&self, ticket: LoadTicket) -> LoadCompleter {
        LoadCompleter {
            inbox: self.clone(),
            ticket,
        }
    }

    pub fn push(&self, completion: LoadCompletion) {
        self.lock().push(completion);
    }

    /// Take every queued completion, oldest first.
    pub fn drain(&self) -> Vec<LoadCompletion> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One-shot handle reporting the outcome of a load. `Send`, so it can move into a task.
#[derive(Debug)]
pub struct LoadCompleter {
    inbox: LoadInbox,
    ticket: LoadTicket,
}

impl LoadCompleter {
    #[inline]
    pub fn ticket(&self) -> &LoadTicket {
        &self.ticket
    }

    pub fn complete(self, result: Result<ModelScene, AssetError>) {
        self.inbox.push(LoadCompletion {
            ticket: self.ticket,
            result,
        });
    }
}

/// A load the host should start: fetch `path`, convert it, and call `completer.complete`.
#[derive(Debug)]
pub struct LoadRequest {
    pub path: String,
    pub completer: LoadCompleter,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_model_list() {
        let catalog = ModelCatalog::from_json("index.json", r#"["a.glb", "b.glb"]"#).unwrap();
        assert_eq!(catalog.ids(), ["a.glb", "b.glb"]);
        assert_eq!(catalog.get(1), Some("b.glb"));
        assert_eq!(catalog.get(2), None);
    }

    #[test]
    fn empty_list_is_valid() {
        let catalog = ModelCatalog::from_json("index.json", "[]").unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn non_array_list_is_an_error() {
        let err = ModelCatalog::from_json("index.json", r#"{"models": []}"#).unwrap_err();
        assert!(matches!(err, AssetError::ModelList { ref path, .. } if path == "index.json"));
    }

    #[test]
    fn model_paths_join_cleanly() {
        assert_eq!(model_path("models/houses/", "a.glb"), "models/houses/a.glb");
        assert_eq!(model_path("models/houses", "/a.glb"), "models/houses/a.glb");
        assert_eq!(model_path("", "a.glb"), "a.glb");
    }

    #[test]
    fn display_names_drop_extension() {
        assert_eq!(display_name("cottage.glb"), "cottage");
        assert_eq!(display_name("villa.gltf"), "villa");
        assert_eq!(display_name("barn"), "barn");
    }

    #[test]
    fn completions_arrive_in_order_from_other_threads() {
        let inbox = LoadInbox::default();
        let ticket = |generation| LoadTicket {
            session: 1,
            generation,
            model_index: 0,
            model_id: "a.glb".into(),
        };

        let first = inbox.completer(ticket(1));
        let second = inbox.completer(ticket(2));
        std::thread::spawn(move || {
            first.complete(Err(AssetError::Fetch {
                path: "a.glb".into(),
                reason: "404".into(),
            }))
        })
        .join()
        .unwrap();
        second.complete(Err(AssetError::Decode {
            id: "a.glb".into(),
            reason: "bad".into(),
        }));

        let drained = inbox.drain();
        assert_eq!(
            drained.iter().map(|c| c.ticket.generation).collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert!(inbox.is_empty());
    }
}
