//! NFT badge rewards for completed swaps.

pub mod minter;

pub use minter::{BadgeError, BadgeMinter, BadgeProgress, BadgeResult, MintReceipt};
