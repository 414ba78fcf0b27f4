pub(crate) mod helpers;

mod blanklines;
mod containers;
