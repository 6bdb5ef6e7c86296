//! Helpers both sources build their candidates with.

use ssot_common::Result;
use ssot_common::config::SourceConfig;
use ssot_common::model::{CF_SOURCE, CF_SOURCE_ID, InterfaceMode, Meta};
use ssot_common::network::{mask_to_bits, normalize_mac};
use ssot_core::Inventory;
use ssot_core::primary::{MacOwner, create_mac_address, set_primary_mac};
use tracing::debug;

/// Tags and custom fields every object written by `config`'s source carries.
pub fn source_meta(inventory: &Inventory, config: &SourceConfig, source_id: Option<&str>) -> Meta {
    let meta = Meta::tagged([inventory.tag(), config.source_tag()])
        .with_field(CF_SOURCE, config.name.as_str());
    match source_id {
        Some(id) => meta.with_field(CF_SOURCE_ID, id),
        None => meta,
    }
}

/// Creates the MAC address of `owner` and makes it the primary one.
/// Unparsable or all-zero MACs are skipped.
pub async fn attach_mac(inventory: &Inventory, owner: MacOwner, raw: &str) -> Result<MacOwner> {
    let Some(mac) = normalize_mac(raw) else {
        if !raw.trim().is_empty() {
            debug!(mac = raw, "ignoring unusable mac address");
        }
        return Ok(owner);
    };
    let created = create_mac_address(inventory, &owner, &mac).await?;
    set_primary_mac(inventory, &owner, &created).await
}

/// `10.0.0.5` + `255.255.255.0` -> `10.0.0.5/24`.
pub fn with_netmask(address: &str, netmask: &str) -> Result<String> {
    let bits = mask_to_bits(netmask)?;
    Ok(format!("{}/{bits}", address.trim()))
}

/// Interface mode implied by the VLAN IDs a port carries. 4095 means every VLAN.
pub fn mode_for_vids(vids: &[u16]) -> Option<InterfaceMode> {
    match vids {
        [] => None,
        [4095] => Some(InterfaceMode::TaggedAll),
        [_] => Some(InterfaceMode::Access),
        _ if vids.contains(&4095) => Some(InterfaceMode::TaggedAll),
        _ => Some(InterfaceMode::Tagged),
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn netmask_is_folded_into_the_address() {
        assert_eq!(with_netmask("10.0.0.5", "255.255.255.0").unwrap(), "10.0.0.5/24");
        assert!(with_netmask("10.0.0.5", "255.0.255.0").is_err());
    }

    #[test]
    fn vid_lists_map_to_modes() {
        assert_eq!(mode_for_vids(&[]), None);
        assert_eq!(mode_for_vids(&[0]), Some(InterfaceMode::Access));
        assert_eq!(mode_for_vids(&[4095]), Some(InterfaceMode::TaggedAll));
        assert_eq!(mode_for_vids(&[10, 20]), Some(InterfaceMode::Tagged));
    }
}
