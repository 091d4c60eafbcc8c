//! 权限目录
//!
//! 编译期固定的封闭集合，运行时不可增删

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AccessError;

/// 系统识别的全部权限
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "roles.manage")]
    RolesManage,
    #[serde(rename = "users.manage")]
    UsersManage,
    #[serde(rename = "people.manage")]
    PeopleManage,
    #[serde(rename = "patients.checkin")]
    PatientsCheckin,
    #[serde(rename = "waitlist.manage")]
    WaitlistManage,
    #[serde(rename = "records.view")]
    RecordsView,
    #[serde(rename = "records.manage")]
    RecordsManage,
    #[serde(rename = "services.manage")]
    ServicesManage,
    #[serde(rename = "reports.view")]
    ReportsView,
}

impl Permission {
    pub const ALL: [Permission; 9] = [
        Permission::RolesManage,
        Permission::UsersManage,
        Permission::PeopleManage,
        Permission::PatientsCheckin,
        Permission::WaitlistManage,
        Permission::RecordsView,
        Permission::RecordsManage,
        Permission::ServicesManage,
        Permission::ReportsView,
    ];

    /// 稳定标识，持久化与 API 均使用此值
    pub fn code(self) -> &'static str {
        match self {
            Permission::RolesManage => "roles.manage",
            Permission::UsersManage => "users.manage",
            Permission::PeopleManage => "people.manage",
            Permission::PatientsCheckin => "patients.checkin",
            Permission::WaitlistManage => "waitlist.manage",
            Permission::RecordsView => "records.view",
            Permission::RecordsManage => "records.manage",
            Permission::ServicesManage => "services.manage",
            Permission::ReportsView => "reports.view",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Permission::RolesManage => "Manage roles",
            Permission::UsersManage => "Manage users",
            Permission::PeopleManage => "Manage people and beneficiaries",
            Permission::PatientsCheckin => "Check in patients",
            Permission::WaitlistManage => "Manage the waitlist",
            Permission::RecordsView => "View health records",
            Permission::RecordsManage => "Edit health records",
            Permission::ServicesManage => "Manage the service catalog",
            Permission::ReportsView => "View reports",
        }
    }

    /// 校验一组权限标识，任一未知即失败
    pub fn parse_set<I, S>(codes: I) -> Result<BTreeSet<Permission>, AccessError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        codes.into_iter().map(|c| c.as_ref().parse()).collect()
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Permission {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .into_iter()
            .find(|p| p.code() == s)
            .ok_or_else(|| AccessError::UnknownPermission(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique_and_parse_back() {
        let codes: BTreeSet<&str> = Permission::ALL.iter().map(|p| p.code()).collect();
        assert_eq!(codes.len(), Permission::ALL.len());

        for permission in Permission::ALL {
            assert_eq!(permission.code().parse::<Permission>().unwrap(), permission);
        }
    }

    #[test]
    fn test_unknown_code_is_rejected() {
        let err = "roles.delete".parse::<Permission>().unwrap_err();
        assert!(matches!(err, AccessError::UnknownPermission(code) if code == "roles.delete"));

        // 大小写敏感
        assert!("Roles.Manage".parse::<Permission>().is_err());
    }

    #[test]
    fn test_parse_set_dedups_and_fails_on_any_unknown() {
        let set = Permission::parse_set(["reports.view", "reports.view", "records.view"]).unwrap();
        assert_eq!(set.len(), 2);

        assert!(Permission::parse_set(["reports.view", "typo.view"]).is_err());
        assert!(Permission::parse_set(Vec::<String>::new()).unwrap().is_empty());
    }

    #[test]
    fn test_serde_uses_codes() {
        let json = serde_json::to_string(&Permission::PatientsCheckin).unwrap();
        assert_eq!(json, "\"patients.checkin\"");

        let parsed: Permission = serde_json::from_str("\"waitlist.manage\"").unwrap();
        assert_eq!(parsed, Permission::WaitlistManage);
    }
}
