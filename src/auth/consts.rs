//! Permission identifiers used to gate route groups, and the role → permission
//! mapping baked into issued tokens.

pub const CATALOG_READ: &str = "catalog:read";
pub const CATALOG_MANAGE: &str = "catalog:manage";

pub const CLIENTS_READ: &str = "clients:read";
pub const CLIENTS_MANAGE: &str = "clients:manage";

pub const ORDERS_READ: &str = "orders:read";
pub const ORDERS_MANAGE: &str = "orders:manage";

pub const QUOTES_READ: &str = "quotes:read";
pub const QUOTES_MANAGE: &str = "quotes:manage";

pub const INVOICES_READ: &str = "invoices:read";
pub const INVOICES_MANAGE: &str = "invoices:manage";

pub const STOCK_READ: &str = "stock:read";
pub const STOCK_MANAGE: &str = "stock:manage";

pub const HR_READ: &str = "hr:read";
pub const HR_MANAGE: &str = "hr:manage";

pub const LEAVE_READ: &str = "leave:read";
pub const LEAVE_REQUEST: &str = "leave:request";
pub const LEAVE_APPROVE_MANAGER: &str = "leave:approve-manager";
pub const LEAVE_APPROVE_HR: &str = "leave:approve-hr";

pub const TICKETS_READ: &str = "tickets:read";
pub const TICKETS_MANAGE: &str = "tickets:manage";

pub const CONTENT_READ: &str = "content:read";
pub const CONTENT_MANAGE: &str = "content:manage";

pub const FINANCE_READ: &str = "finance:read";
pub const FINANCE_MANAGE: &str = "finance:manage";

pub const USERS_MANAGE: &str = "users:manage";

/// Every permission, granted to administrators.
pub const ALL: &[&str] = &[
    CATALOG_READ,
    CATALOG_MANAGE,
    CLIENTS_READ,
    CLIENTS_MANAGE,
    ORDERS_READ,
    ORDERS_MANAGE,
    QUOTES_READ,
    QUOTES_MANAGE,
    INVOICES_READ,
    INVOICES_MANAGE,
    STOCK_READ,
    STOCK_MANAGE,
    HR_READ,
    HR_MANAGE,
    LEAVE_READ,
    LEAVE_REQUEST,
    LEAVE_APPROVE_MANAGER,
    LEAVE_APPROVE_HR,
    TICKETS_READ,
    TICKETS_MANAGE,
    CONTENT_READ,
    CONTENT_MANAGE,
    FINANCE_READ,
    FINANCE_MANAGE,
    USERS_MANAGE,
];

/// Permissions granted by each role.
pub fn role_permissions(role: &str) -> Vec<String> {
    let perms: &[&str] = match role {
        "admin" => ALL,
        "manager" => &[
            CATALOG_READ,
            CATALOG_MANAGE,
            CLIENTS_READ,
            CLIENTS_MANAGE,
            ORDERS_READ,
            ORDERS_MANAGE,
            QUOTES_READ,
            QUOTES_MANAGE,
            INVOICES_READ,
            STOCK_READ,
            STOCK_MANAGE,
            LEAVE_READ,
            LEAVE_REQUEST,
            LEAVE_APPROVE_MANAGER,
            TICKETS_READ,
        ],
        "hr" => &[
            HR_READ,
            HR_MANAGE,
            LEAVE_READ,
            LEAVE_REQUEST,
            LEAVE_APPROVE_HR,
        ],
        "agent" => &[TICKETS_READ, TICKETS_MANAGE, CLIENTS_READ, CATALOG_READ],
        "accountant" => &[
            FINANCE_READ,
            FINANCE_MANAGE,
            INVOICES_READ,
            INVOICES_MANAGE,
            CLIENTS_READ,
            ORDERS_READ,
        ],
        "editor" => &[CONTENT_READ, CONTENT_MANAGE, CATALOG_READ],
        "employee" => &[LEAVE_READ, LEAVE_REQUEST],
        _ => &[],
    };
    perms.iter().map(|p| p.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_holds_every_permission() {
        let perms = role_permissions("admin");
        assert!(perms.contains(&USERS_MANAGE.to_string()));
        assert_eq!(perms.len(), ALL.len());
    }

    #[test]
    fn hr_cannot_manage_catalog() {
        let perms = role_permissions("hr");
        assert!(perms.contains(&LEAVE_APPROVE_HR.to_string()));
        assert!(!perms.contains(&CATALOG_MANAGE.to_string()));
    }

    #[test]
    fn unknown_role_has_no_permissions() {
        assert!(role_permissions("intern").is_empty());
    }
}
