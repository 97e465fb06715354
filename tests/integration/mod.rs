pub mod access;
pub mod composition;
pub mod negotiation;
pub mod operations;
