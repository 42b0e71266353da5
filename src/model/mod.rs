//! Ledger records and request types.

pub mod cable_box;
pub mod cable_type;
pub mod project;
pub mod quantity;
pub mod usage;

pub use cable_box::{
    BoxDraft, BoxStatus, BoxView, CableBox, CloseBox, CloseReceipt, Consumption, NewBox,
};
pub use cable_type::{normalize_prefix, CableType, CableTypeDraft, NewCableType, DEFAULT_UNIT};
pub use project::{NewProject, Project, ProjectDraft};
pub use usage::{Usage, UsageDraft};
