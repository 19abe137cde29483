pub(crate) mod check;
pub(crate) mod encode;
pub(crate) mod equivalence;
pub(crate) mod helpers;
pub(crate) mod transform;
