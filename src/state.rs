use crate::store::EntryStore;
use crate::timezone::ZoneDeriver;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<EntryStore>>,
    /// Shared copy of the store's deriver, usable without taking the store lock.
    pub deriver: Arc<ZoneDeriver>,
}

impl AppState {
    pub fn new(store: EntryStore) -> Self {
        Self {
            deriver: Arc::new(store.deriver().clone()),
            store: Arc::new(Mutex::new(store)),
        }
    }
}
