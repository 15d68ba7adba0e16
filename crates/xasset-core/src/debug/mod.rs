//! Debug utilities for inspecting an attached title
//!
//! This module provides tools for:
//! - Checking resolved tables and pool locations (`StatusInfo`)
//! - Dumping raw memory around a record (`MemoryDump`)
//! - Running a title's code signatures without verification (`ScanResult`)

mod dump;
mod scan;
mod status;

pub use dump::{MemoryDump, hex_lines};
pub use scan::{ScanResult, SignatureHit};
pub use status::{PoolStatus, StatusInfo};
