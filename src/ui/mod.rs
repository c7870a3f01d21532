/// UI widgets module
///
/// This module holds the widgets built on top of the scan pipeline's
/// output: the result tile grid and the full-resolution inspection view.

pub mod tile;
