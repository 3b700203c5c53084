mod api;
mod core;
mod db;

pub use crate::item::api::ItemApi;

#[cfg(test)]
pub use crate::item::core::{item_add, Item, ItemParam};
