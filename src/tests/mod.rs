//! Cross-module tests for the wired hub.
//!
//! Unit tests live next to the code they cover; these modules exercise the
//! bus → store pipeline and the hub context object as consumers see them.

mod events;
