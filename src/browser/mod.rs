mod controller;
pub mod navigator;
pub mod transfer;
pub mod validation;
pub mod view;

pub use controller::{BrowserController, Persistence, SessionState, View};
pub use navigator::{Breadcrumb, CrumbDisplay};
pub use transfer::{DirectoryDestination, DownloadOutcome, FixedDestination, SaveDialog, TransferOrchestrator};
pub use validation::{CredentialFormatError, validate_credentials};
pub use view::{SortDirection, SortKey, SortState};
