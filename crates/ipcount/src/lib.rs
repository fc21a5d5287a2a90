// SPDX-FileCopyrightText: 2025 xfnw
//
// SPDX-License-Identifier: MPL-2.0

//! count the ipv4 addresses that show up exactly once, in constant memory
//!
//! ```rust,no_run
//! let input = "1.1.1.1\n1.1.1.1\n2.2.2.2\n";
//! let unique = ipcount::scan::count_unique(input.as_bytes(), ipcount::Policy::FailFast)?;
//! assert_eq!(unique, 1);
//! # Ok::<(), ipcount::scan::Error>(())
//! ```

pub mod counter;
pub mod parse;
pub mod progress;
pub mod scan;

pub use counter::{Census, SaturatingPresenceCounter, Slot};
pub use parse::{AddressKey, parse};
pub use scan::{Policy, Summary};
