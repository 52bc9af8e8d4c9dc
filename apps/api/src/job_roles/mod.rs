// Job role autocomplete: popularity-ranked catalog, self-learning selection,
// AI top-up for sparse results, and first-start seeding.

pub mod cache;
pub mod catalog;
pub mod handlers;
#[cfg(test)]
pub mod memory;
pub mod search;
pub mod seed;
