//! Temporary data.
use crate::lit::Lit;

/// Temporary buffers shared by engine routines.
///
/// Check the documented invariants of each user before adding new ones.
#[derive(Default)]
pub struct TmpData {
    pub lits: Vec<Lit>,
}
