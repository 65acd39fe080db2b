//! List view controller, realtime hub and domain models for the back office
//!
//! A list view keeps its draft and applied filters apart, pages through a
//! [`PageSource`], and refreshes itself when realtime events arrive.

pub mod actions;
pub mod bridge;
pub mod controller;
pub mod debounce;
pub mod error;
pub mod filters;
pub mod inferred;
pub mod lists;
pub mod models;
pub mod pagination;
pub mod query;
pub mod realtime;
pub mod source;
pub mod view;

pub use actions::{MemberAction, MysteryBox, OperatorActions, WithdrawalAction, WithdrawalAddress};
pub use bridge::RealtimeBridge;
pub use controller::{ListController, ListSnapshot, LoadOutcome};
pub use debounce::{DebounceState, Debouncer};
pub use error::{CoreError, CoreResult, ErrorCode, ErrorDetails, ErrorSeverity};
pub use filters::{AppliedFilters, FilterDraft, FilterField, FilterKind, FilterSchema, FilterState};
pub use inferred::InferredPager;
pub use lists::ListKind;
pub use models::{
    Member, Product, SummaryItem, TableRow, TransactionStatus, WithdrawMethod, Withdrawal,
};
pub use pagination::{
    page_window, PageDescriptor, PageMeta, PageSizes, PageSlot, Pagination, PaginationMode,
};
pub use query::{PageQuery, QueryState};
pub use realtime::{EventHandler, HandlerId, HubStatus, RealtimeChannel, RealtimeHub};
pub use source::{PageResponse, PageSource};
pub use view::{ListRegistry, ListView, MountedList, TableSnapshot};
