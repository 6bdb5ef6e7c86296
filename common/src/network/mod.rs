//! # Network Helpers
//!
//! Address parsing and subnet arithmetic used when admitting addresses into the inventory
//! and when picking primary addresses.

pub mod address;
pub mod mac;

pub use address::{
    IpVersion, SubnetList, is_permitted, mask_to_bits, parse_interface_address, prefix_of,
    subnet_contains,
};
pub use mac::normalize_mac;
