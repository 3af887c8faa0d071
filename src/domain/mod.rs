pub mod attendance;
pub mod audit;
pub mod book;
pub mod calendar;
pub mod catalog;
pub mod clock;
pub mod directory;
pub mod leave_request;
pub mod ledger;
pub mod reports;
pub mod service;
