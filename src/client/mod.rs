//! Client side of the wizard: the navigation controller and the transports
//! and views it drives.

pub mod controller;
pub mod error;
pub mod transport;
pub mod view;

pub use controller::{DependentField, FormHandle, NavigationOutcome, WizardController, WizardRegion};
pub use error::ClientError;
pub use transport::{HttpTransport, LocalTransport, SubmitOutcome, WizardTransport};
pub use view::{HeadlessView, ViewEvent, WizardView};
