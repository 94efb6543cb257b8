pub mod locator;
pub mod overlay;
pub mod selection;
pub mod series_index;
pub mod session;
pub mod view;
pub mod window;

#[cfg(test)]
mod session_tests;
