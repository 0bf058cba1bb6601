//! Resolution helpers shared by [`crate::resolver`]: relative-specifier
//! module matching (§4.4 "Module match").

pub mod imports;
