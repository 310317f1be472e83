use parking_lot::Mutex;
use std::sync::Arc;

use crate::notices::NoticeBoard;
use crate::probe::Prober;
use crate::settings::ServerSettings;
use crate::ssh::RemoteShell;
use crate::store::ConfigStore;
use crate::wol::PacketSender;

pub type Shared<T> = Arc<Mutex<T>>;

pub fn new_state<T>(value: T) -> Shared<T> {
    Arc::new(Mutex::new(value))
}

/// État unique partagé par tous les handlers Axum
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ConfigStore>,
    pub notices: NoticeBoard,
    pub settings: Arc<ServerSettings>,
    pub prober: Arc<dyn Prober>,
    pub waker: Arc<dyn PacketSender>,
    pub shell: Arc<dyn RemoteShell>,
}
