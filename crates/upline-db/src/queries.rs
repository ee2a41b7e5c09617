//! Database query functions organized by relation.

pub mod allocations;
pub mod commissions;
pub mod hierarchy;
pub mod members;
pub mod settlements;
