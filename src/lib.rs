//! Delivery Audit — validates emailed event workbooks and approves or reports.

pub mod audit;
pub mod channels;
pub mod config;
pub mod error;
pub mod logging;
pub mod poller;
pub mod report;
pub mod state;
pub mod validation;
pub mod workbook;
