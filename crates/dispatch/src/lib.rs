mod attachment;
pub mod backend;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod locale;
pub mod recording;
pub mod report;
pub mod smtp;

pub use attachment::content_type_for;
pub use backend::{Body, Delivery, EmailBackend, EmailMessage};
pub use config::{DispatchConfig, SecurityMode, SmtpConfig};
pub use dispatcher::MessageDispatcher;
pub use error::DispatchError;
pub use locale::{Catalog, LocaleMessages};
pub use report::{DispatchReport, DispatchStatus, RecipientOutcome};
pub use smtp::SmtpBackend;
