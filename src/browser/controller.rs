use super::navigator::{self, Breadcrumb};
use super::transfer::{DownloadOutcome, SaveDialog, TransferOrchestrator};
use super::validation::validate_credentials;
use super::view::{self, SortKey, SortState};
use crate::auth::CredentialStore;
use crate::storage::StorageGateway;
use crate::types::{
    BrowserError, BrowserResult, BucketInfo, Credentials, FolderPrefix, Listing, ObjectEntry, Prefix,
};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Login,
    Buckets,
    Files,
    Settings,
}

/// What login does with the persisted credential record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persistence {
    /// Remember the submitted credentials
    Save,
    /// Forget any remembered credentials
    Clear,
    /// Leave the record untouched
    Leave,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Buckets,
    Objects { bucket: String, prefix: Prefix },
}

/// Identity of one issued listing. Only the latest issued tag may be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RequestTag {
    generation: u64,
    target: Target,
}

/// Everything a browser window renders. Mutated only by `BrowserController`.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub view: View,
    pub credentials: Option<Credentials>,
    pub buckets: Vec<BucketInfo>,
    pub current_bucket: Option<String>,
    pub current_path: Prefix,
    pub files: Vec<ObjectEntry>,
    pub folders: Vec<FolderPrefix>,
    pub sort: SortState,
    pub search_term: String,
    pub loading: bool,
    /// An upload, delete or download is in flight
    pub transferring: bool,
    pub error: Option<String>,
    settings_return: Option<View>,
    generation: u64,
    pending: Option<RequestTag>,
    /// Bumped on every login and logout; a transfer only reports back into its own session
    session: u64,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            view: View::Login,
            credentials: None,
            buckets: Vec::new(),
            current_bucket: None,
            current_path: Prefix::root(),
            files: Vec::new(),
            folders: Vec::new(),
            sort: SortState::default(),
            search_term: String::new(),
            loading: false,
            transferring: false,
            error: None,
            settings_return: None,
            generation: 0,
            pending: None,
            session: 0,
        }
    }
}

impl SessionState {
    /// Filtered and sorted files, recomputed on every call
    pub fn visible_files(&self) -> Vec<ObjectEntry> {
        view::project(&self.files, &self.search_term, self.sort)
    }

    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        navigator::breadcrumbs(&self.current_path)
    }

    pub fn title(&self) -> &str {
        match self.view {
            View::Files => navigator::title(
                &self.current_path,
                self.current_bucket.as_deref().unwrap_or_default(),
            ),
            View::Buckets => "Buckets",
            View::Settings => "Settings",
            View::Login => "Connect",
        }
    }

    /// The `..` row is offered everywhere but the bucket root
    pub fn shows_parent_row(&self) -> bool {
        self.view == View::Files && !self.current_path.is_root()
    }

    fn issue(&mut self, target: Target) -> RequestTag {
        self.generation += 1;
        let tag = RequestTag {
            generation: self.generation,
            target,
        };
        self.pending = Some(tag.clone());
        self.loading = true;
        tag
    }

    /// Claims the response for `tag` if it is still the latest request
    fn accept(&mut self, tag: &RequestTag) -> bool {
        if self.pending.as_ref() != Some(tag) {
            tracing::debug!("Discarding superseded response for {:?}", tag.target);
            return false;
        }

        self.pending = None;
        self.loading = false;
        true
    }

    fn apply_buckets(&mut self, tag: &RequestTag, result: BrowserResult<Vec<BucketInfo>>) -> bool {
        if !self.accept(tag) {
            return false;
        }

        match result {
            Ok(buckets) => {
                self.buckets = buckets;
                self.view = View::Buckets;
            }
            Err(err) => self.error = Some(err.to_string()),
        }
        true
    }

    fn apply_listing(&mut self, tag: &RequestTag, result: BrowserResult<Listing>) -> bool {
        if !self.accept(tag) {
            return false;
        }

        match (result, &tag.target) {
            (Ok(listing), Target::Objects { bucket, prefix }) => {
                // wholesale replacement, never merged
                self.files = listing.files;
                self.folders = listing.folders;
                self.current_bucket = Some(bucket.clone());
                self.current_path = prefix.clone();
                self.view = View::Files;
            }
            (Ok(_), Target::Buckets) => {}
            (Err(err), _) => self.error = Some(err.to_string()),
        }
        true
    }

    /// Drops any in-flight request so its response is ignored
    fn abandon_pending(&mut self) {
        self.pending = None;
        self.loading = false;
    }
}

/// Session state machine for one browser window.
///
/// Cloning is cheap and every clone drives the same session. No lock is held
/// across a network call; overlapping listings are reconciled by request tag.
/// What a transfer captured when it started
struct TransferScope {
    session: u64,
    credentials: Credentials,
    bucket: String,
    prefix: Prefix,
}

#[derive(Clone)]
pub struct BrowserController {
    gateway: Arc<dyn StorageGateway>,
    transfers: TransferOrchestrator,
    store: CredentialStore,
    state: Arc<RwLock<SessionState>>,
}

impl BrowserController {
    pub fn new(gateway: Arc<dyn StorageGateway>, store: CredentialStore) -> Self {
        Self {
            transfers: TransferOrchestrator::new(gateway.clone()),
            gateway,
            store,
            state: Arc::new(RwLock::new(SessionState::default())),
        }
    }

    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }

    /// Remembered credentials for prefilling the login form
    pub fn saved_credentials(&self) -> Option<Credentials> {
        match self.store.get() {
            Ok(credentials) => credentials,
            Err(err) => {
                tracing::warn!("Ignoring saved credentials: {}", err);
                None
            }
        }
    }

    /// Delete the remembered credentials; the current session is unaffected
    pub fn forget_credentials(&self) -> BrowserResult<()> {
        self.store.delete()
    }

    /// Validate, optionally persist, then open the bucket list or the given bucket.
    ///
    /// A format problem is reported without touching the network.
    pub async fn login(&self, credentials: Credentials, persistence: Persistence) {
        let credentials = credentials.trimmed();

        {
            let mut state = self.state.write().await;
            state.error = None;

            if let Err(err) =
                validate_credentials(&credentials.access_key_id, &credentials.secret_access_key)
            {
                tracing::warn!("Rejected credentials: {}", err);
                state.error = Some(err.to_string());
                return;
            }

            state.credentials = Some(credentials.clone());
            state.session += 1;
        }

        tracing::info!(
            "Connecting to {} as {}",
            credentials.endpoint,
            credentials.key_hint()
        );
        self.persist(&credentials, persistence);

        match credentials.bucket_name {
            Some(bucket) => self.load_objects(bucket, Prefix::root()).await,
            None => self.load_buckets().await,
        }
    }

    fn persist(&self, credentials: &Credentials, persistence: Persistence) {
        let result = match persistence {
            Persistence::Save => self.store.save(credentials),
            Persistence::Clear => self.store.delete(),
            Persistence::Leave => Ok(()),
        };

        // Persistence problems never block the session
        if let Err(err) = result {
            tracing::warn!("Could not update saved credentials: {}", err);
        }
    }

    pub async fn logout(&self) {
        let mut state = self.state.write().await;
        *state = SessionState {
            generation: state.generation,
            session: state.session + 1,
            ..SessionState::default()
        };
        tracing::info!("Logged out");
    }

    pub async fn select_bucket(&self, bucket: &str) {
        self.load_objects(bucket.to_string(), Prefix::root()).await;
    }

    /// Leave the file view for the bucket list
    pub async fn back_to_buckets(&self) {
        let needs_listing = {
            let mut state = self.state.write().await;
            state.abandon_pending();
            state.error = None;
            state.view = View::Buckets;
            state.files.clear();
            state.folders.clear();
            state.current_bucket = None;
            state.current_path = Prefix::root();
            state.credentials.is_some() && state.buckets.is_empty()
        };

        if needs_listing {
            self.load_buckets().await;
        }
    }

    pub async fn open_folder(&self, folder: &FolderPrefix) {
        if let Some((bucket, current)) = self.location().await {
            self.load_objects(bucket, navigator::descend(&current, folder)).await;
        }
    }

    /// The `..` row
    pub async fn go_up(&self) {
        if let Some((bucket, current)) = self.location().await {
            self.load_objects(bucket, navigator::ascend_one(&current)).await;
        }
    }

    /// `None` is the bucket-root crumb
    pub async fn open_breadcrumb(&self, index: Option<usize>) {
        if let Some((bucket, current)) = self.location().await {
            match navigator::breadcrumb_target(&current, index) {
                Some(target) => self.load_objects(bucket, target).await,
                None => tracing::debug!("Ignoring breadcrumb {:?} for {}", index, current),
            }
        }
    }

    /// Jump straight to `prefix` in the current bucket
    pub async fn open_prefix(&self, prefix: Prefix) {
        if let Some((bucket, _)) = self.location().await {
            self.load_objects(bucket, prefix).await;
        }
    }

    /// Re-list whatever the current view shows
    pub async fn refresh(&self) {
        let view = self.state.read().await.view;
        match view {
            View::Buckets => self.load_buckets().await,
            View::Files => {
                if let Some((bucket, current)) = self.location().await {
                    self.load_objects(bucket, current).await;
                }
            }
            View::Login | View::Settings => {}
        }
    }

    pub async fn open_settings(&self) {
        let mut state = self.state.write().await;
        if state.view != View::Settings {
            state.settings_return = Some(state.view);
        }
        state.abandon_pending();
        state.view = View::Settings;
    }

    /// Back to the view settings were opened from
    pub async fn close_settings(&self) {
        let mut state = self.state.write().await;
        if state.view == View::Settings {
            state.view = state.settings_return.take().unwrap_or(View::Login);
        }
    }

    pub async fn set_search_term(&self, term: &str) {
        self.state.write().await.search_term = term.to_string();
    }

    /// Column header click
    pub async fn sort_by(&self, key: SortKey) {
        let mut state = self.state.write().await;
        state.sort = state.sort.select(key);
    }

    /// Upload into the current folder, then re-list it
    pub async fn upload(&self, file_path: &Path) -> BrowserResult<String> {
        let scope = self.begin_transfer().await?;

        match self
            .transfers
            .upload(&scope.credentials, &scope.bucket, &scope.prefix, file_path)
            .await
        {
            Ok(key) => {
                // The listing stays the only source of truth
                self.relist(scope).await;
                Ok(key)
            }
            Err(err) => {
                self.end_transfer(&scope, Some(format!("Upload failed: {}", err)))
                    .await;
                Err(err)
            }
        }
    }

    /// Delete `key`; the folder is re-listed only when the delete succeeded
    pub async fn delete(&self, key: &str) -> BrowserResult<()> {
        let scope = self.begin_transfer().await?;

        match self
            .transfers
            .delete(&scope.credentials, &scope.bucket, key)
            .await
        {
            Ok(()) => {
                self.relist(scope).await;
                Ok(())
            }
            Err(err) => {
                self.end_transfer(&scope, Some(format!("Delete failed: {}", err)))
                    .await;
                Err(err)
            }
        }
    }

    /// Download `key` to wherever `dialog` decides. Cancellation is not an error.
    pub async fn download(&self, key: &str, dialog: &dyn SaveDialog) -> BrowserResult<DownloadOutcome> {
        let scope = self.begin_transfer().await?;

        let result = self
            .transfers
            .download(&scope.credentials, &scope.bucket, key, dialog)
            .await;

        let failure = result
            .as_ref()
            .err()
            .map(|err| format!("Download failed: {}", err));
        self.end_transfer(&scope, failure).await;
        result
    }

    async fn location(&self) -> Option<(String, Prefix)> {
        let state = self.state.read().await;
        let bucket = state.current_bucket.clone()?;
        Some((bucket, state.current_path.clone()))
    }

    async fn begin_transfer(&self) -> BrowserResult<TransferScope> {
        let mut state = self.state.write().await;
        state.error = None;

        let (Some(credentials), Some(bucket)) = (state.credentials.clone(), state.current_bucket.clone())
        else {
            let err = BrowserError::Validation("No bucket is open".to_string());
            state.error = Some(err.to_string());
            return Err(err);
        };

        state.transferring = true;
        Ok(TransferScope {
            session: state.session,
            credentials,
            bucket,
            prefix: state.current_path.clone(),
        })
    }

    /// Report a finished transfer, unless the session it ran in is gone
    async fn end_transfer(&self, scope: &TransferScope, failure: Option<String>) {
        let mut state = self.state.write().await;
        if state.session != scope.session {
            tracing::info!(
                "Transfer in {} finished after its session ended; result not shown",
                scope.bucket
            );
            return;
        }

        state.transferring = false;
        if failure.is_some() {
            state.error = failure;
        }
    }

    /// Re-list the folder a successful mutation touched, if it is still on screen
    async fn relist(&self, scope: TransferScope) {
        self.end_transfer(&scope, None).await;

        let here = (scope.bucket.clone(), scope.prefix.clone());
        if self.location().await != Some(here) {
            tracing::debug!("Left {}/{} during the transfer; not re-listing", scope.bucket, scope.prefix);
            return;
        }

        let session = scope.session;
        let target = Target::Objects {
            bucket: scope.bucket,
            prefix: scope.prefix,
        };
        self.list_objects_in(target, Some(session)).await;
    }

    /// Tag a request, or record why none can be sent.
    ///
    /// With `session` set, nothing is issued or reported once that session has ended.
    async fn issue(&self, target: Target, session: Option<u64>) -> Option<(Credentials, RequestTag)> {
        let mut state = self.state.write().await;
        if session.is_some_and(|session| session != state.session) {
            tracing::debug!("Session ended; not listing {:?}", target);
            return None;
        }
        state.error = None;

        let Some(credentials) = state.credentials.clone() else {
            state.error = Some("Not connected".to_string());
            return None;
        };

        Some((credentials, state.issue(target)))
    }

    async fn load_buckets(&self) {
        let Some((credentials, tag)) = self.issue(Target::Buckets, None).await else {
            return;
        };

        let result = self.gateway.list_buckets(&credentials).await;
        self.state.write().await.apply_buckets(&tag, result);
    }

    async fn load_objects(&self, bucket: String, prefix: Prefix) {
        self.list_objects_in(Target::Objects { bucket, prefix }, None)
            .await;
    }

    async fn list_objects_in(&self, target: Target, session: Option<u64>) {
        let Some((credentials, tag)) = self.issue(target, session).await else {
            return;
        };
        let Target::Objects { bucket, prefix } = &tag.target else {
            return;
        };

        let result = self.gateway.list_objects(&credentials, bucket, prefix).await;
        self.state.write().await.apply_listing(&tag, result);
    }
}
