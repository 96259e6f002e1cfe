//! The card's shared state.

pub mod card_store;
