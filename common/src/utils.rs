//! String helpers shared by sources when building inventory candidates.

use std::collections::HashMap;

/// Inventory slug: lower-case, spaces to underscores, anything outside `[a-z0-9_-]` dropped.
pub fn slugify(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('_'),
            'a'..='z' | '0'..='9' | '_' | '-' => Some(c),
            _ => None,
        })
        .collect()
}

/// Keeps ASCII letters, digits and underscores. Used for custom-field names.
pub fn alphanumeric(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

pub fn device_type_slug(manufacturer: &str, model: &str) -> String {
    slugify(&format!("{manufacturer} {model}"))
}

/// `"<os> <version>"`, or a generic name when the source reported nothing.
pub fn platform_name(os: &str, version: &str) -> String {
    let name = format!("{} {}", os.trim(), version.trim());
    let name = name.trim();
    if name.is_empty() {
        "Generic OS".to_string()
    } else {
        name.to_string()
    }
}

/// Collapses vendor spellings so hosts from the same vendor share one manufacturer.
pub fn manufacturer_name(vendor: &str) -> String {
    let vendor = vendor.trim();
    let lower = vendor.to_lowercase();
    let canonical = if lower.starts_with("dell") {
        "Dell"
    } else if lower.starts_with("hewlett packard enterprise") || lower == "hpe" {
        "HPE"
    } else if lower.starts_with("hewlett-packard") || lower == "hp" {
        "HP"
    } else if lower.starts_with("cisco") {
        "Cisco"
    } else if lower.starts_with("lenovo") {
        "Lenovo"
    } else if lower.starts_with("supermicro") || lower.starts_with("super micro") {
        "Supermicro"
    } else if lower.starts_with("vmware") {
        "VMware"
    } else {
        vendor
    };
    canonical.to_string()
}

/// Splits a comma separated owner list, trimming and dropping empty entries.
pub fn split_owners(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Same as [`split_owners`], but only keeps entries that look like an address.
pub fn split_emails(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| s.contains('@'))
        .map(str::to_lowercase)
        .collect()
}

/// Pairs owner names with e-mail addresses when the two lists cannot be zipped.
///
/// A name matches an address when every word of the name appears in the local part.
pub fn match_names_with_emails(names: &[String], emails: &[String]) -> HashMap<String, String> {
    let mut matched = HashMap::new();
    for name in names {
        let words: Vec<String> = name
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .collect();
        if words.is_empty() {
            continue;
        }
        let hit = emails.iter().find(|email| {
            let local = email.split('@').next().unwrap_or_default().to_lowercase();
            words.iter().all(|w| local.contains(w.as_str()))
        });
        if let Some(email) = hit {
            matched.insert(name.clone(), email.clone());
        }
    }
    matched
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
    fn slugs() {
        assert_eq!(slugify(" VMware ESXi "), "vmware_esxi");
        assert_eq!(slugify("Site-A (old)"), "site-a_old");
        assert_eq!(device_type_slug("Dell", "PowerEdge R740"), "dell_poweredge_r740");
    }

    #[test]
    fn custom_field_names() {
        assert_eq!(alphanumeric("Cost Center #2"), "CostCenter2");
        assert_eq!(alphanumeric("backup_policy"), "backup_policy");
    }

    #[test]
    fn platform_falls_back_to_generic() {
        assert_eq!(platform_name("VMware ESXi", "8.0.2"), "VMware ESXi 8.0.2");
        assert_eq!(platform_name("", ""), "Generic OS");
    }

    #[test]
    fn vendors_are_canonical() {
        assert_eq!(manufacturer_name("Dell Inc."), "Dell");
        assert_eq!(manufacturer_name("Cisco Systems, Inc"), "Cisco");
        assert_eq!(manufacturer_name("Acme"), "Acme");
    }

    #[test]
    fn owners_and_emails_are_paired_by_name() {
        let names = split_owners("John Doe, Jane Roe,");
        let emails = split_emails("jane.roe@example.com, nobody, john.doe@example.com");
        assert_eq!(names, vec!["John Doe", "Jane Roe"]);
        assert_eq!(emails.len(), 2);

        let paired = match_names_with_emails(&names, &emails);
        assert_eq!(paired["John Doe"], "john.doe@example.com");
        assert_eq!(paired["Jane Roe"], "jane.roe@example.com");
    }
}
