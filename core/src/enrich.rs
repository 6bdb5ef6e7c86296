//! Best-effort enrichments. Anything in here logs and returns `None` instead of failing the
//! entity it decorates.

use std::sync::Arc;

use ssot_common::config::SourceConfig;
use ssot_common::model::{AssignedObject, IpAddress, IpAddressStatus, Meta, ObjectId, Prefix};
use ssot_common::network::{IpVersion, is_permitted, parse_interface_address, prefix_of};
use tracing::{debug, warn};

use crate::inventory::Inventory;

/// Owner data copied onto every address an interface carries.
#[derive(Debug, Clone)]
pub struct AddressContext {
    pub assigned: AssignedObject,
    pub meta: Meta,
    pub tenant: Option<ObjectId>,
    pub dns_name: String,
}

/// Registers `address` on its interface when the source's subnet lists admit it.
pub async fn admit_ip_address(
    inventory: &Inventory,
    config: &SourceConfig,
    address: &str,
    ctx: &AddressContext,
) -> Option<Arc<IpAddress>> {
    if !is_permitted(address, &config.permitted_subnets, &config.ignored_subnets) {
        debug!(source = %config.name, address, "address not admitted");
        return None;
    }

    let candidate = IpAddress {
        meta: ctx.meta.clone(),
        address: address.trim().to_string(),
        status: Some(IpAddressStatus::Active),
        dns_name: ctx.dns_name.clone(),
        tenant: ctx.tenant,
        assigned: Some(ctx.assigned),
    };
    match inventory.upsert(candidate).await {
        Ok(ip) => Some(ip),
        Err(err) => {
            warn!(source = %config.name, address, error = %err, "skipping ip address");
            None
        }
    }
}

/// Registers the network `address` lives in. Host routes (/32, /128) have no prefix.
pub async fn derive_prefix(
    inventory: &Inventory,
    address: &str,
    site: Option<ObjectId>,
    tenant: Option<ObjectId>,
    meta: &Meta,
) -> Option<Arc<Prefix>> {
    let (prefix, bits) = match prefix_of(address) {
        Ok(parsed) => parsed,
        Err(err) => {
            warn!(address, error = %err, "cannot derive prefix");
            return None;
        }
    };
    let version = parse_interface_address(address).map(|net| IpVersion::of(&net.ip())).ok()?;
    if bits == version.host_prefix() {
        return None;
    }

    let candidate = Prefix {
        meta: meta.clone(),
        prefix,
        site,
        tenant,
        vlan: None,
    };
    match inventory.upsert(candidate).await {
        Ok(prefix) => Some(prefix),
        Err(err) => {
            warn!(address, error = %err, "skipping prefix");
            None
        }
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
    use crate::target::MemoryTarget;
    use ssot_common::config::SourceType;
    use ssot_common::model::ObjectKind;

    fn context() -> AddressContext {
        AddressContext {
            assigned: AssignedObject::new(ObjectKind::VmInterface, ObjectId(9)),
            meta: Meta::tagged(["ssot"]),
            tenant: None,
            dns_name: String::new(),
        }
    }

    #[tokio::test]
    async fn host_routes_have_no_prefix() {
        let target = Arc::new(MemoryTarget::new());
        let inv = Inventory::new(target.clone(), "ssot");
        let meta = Meta::default();

        assert!(derive_prefix(&inv, "10.0.0.7/32", None, None, &meta).await.is_none());
        assert!(derive_prefix(&inv, "2001:db8::7/128", None, None, &meta).await.is_none());
        let prefix = derive_prefix(&inv, "10.0.1.5/24", None, None, &meta).await.unwrap();

        assert_eq!(prefix.prefix, "10.0.1.0/24");
        assert_eq!(target.creates(ObjectKind::Prefix), 1);
    }

    #[tokio::test]
    async fn rejected_prefix_is_skipped_not_fatal() {
        let target = Arc::new(MemoryTarget::new().rejecting(
            ObjectKind::Prefix,
            "overlapping prefix",
            |_| true,
        ));
        let inv = Inventory::new(target, "ssot");

        assert!(derive_prefix(&inv, "10.0.1.5/24", None, None, &Meta::default()).await.is_none());
        assert!(derive_prefix(&inv, "bogus", None, None, &Meta::default()).await.is_none());
    }

    #[tokio::test]
    async fn addresses_outside_permitted_subnets_are_dropped() {
        let target = Arc::new(MemoryTarget::new());
        let inv = Inventory::new(target.clone(), "ssot");
        let mut config = SourceConfig::new("vc", SourceType::Hypervisor);
        config.permitted_subnets = vec!["10.0.0.0/8".to_string()].try_into().unwrap();
        config.ignored_subnets = vec!["10.99.0.0/16".to_string()].try_into().unwrap();

        assert!(admit_ip_address(&inv, &config, "192.168.1.4/24", &context()).await.is_none());
        assert!(admit_ip_address(&inv, &config, "10.99.0.4/24", &context()).await.is_none());
        let ip = admit_ip_address(&inv, &config, "10.0.1.5/24", &context()).await.unwrap();

        assert_eq!(ip.assigned, Some(context().assigned));
        assert_eq!(target.creates(ObjectKind::IpAddress), 1);
    }

    #[tokio::test]
    async fn rejected_address_is_skipped() {
        let target = Arc::new(MemoryTarget::new().rejecting(
            ObjectKind::IpAddress,
            "duplicate address",
            |payload| payload["address"] == "10.0.0.1/24",
        ));
        let inv = Inventory::new(target, "ssot");
        let config = SourceConfig::new("vc", SourceType::Hypervisor);

        assert!(admit_ip_address(&inv, &config, "10.0.0.1/24", &context()).await.is_none());
        assert!(admit_ip_address(&inv, &config, "10.0.0.2/24", &context()).await.is_some());
    }
}
