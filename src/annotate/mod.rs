//! Text annotation for rendered summaries.
//!
//! Two independent widgets' worth of logic, kept free of any rendering
//! concern so a frontend can map segments straight onto spans:
//!
//! 1. [`glossary`]  — match known terms in a block of text and attach their
//!    definitions (tooltip content)
//! 2. [`highlight`] — user-created colored marks over a fixed text, kept as
//!    a sorted, non-overlapping interval list
//!
//! Both produce ordered segment streams that reassemble to exactly the input
//! text, so rendering cannot lose or duplicate characters.

pub mod glossary;
pub mod highlight;
