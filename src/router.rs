use std::fmt;

use crate::models::RecordId;

/// The three screens, addressed the same way the web client addresses its pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    RoleList,
    CreateRole,
    RoleDetail(RecordId),
}

impl Route {
    /// Map a path to a route. Anything unrecognised lands on the role list.
    pub fn parse(path: &str) -> Route {
        let path = path.trim().trim_end_matches('/');
        if path == "/create-role" {
            return Route::CreateRole;
        }
        match path.strip_prefix("/role/") {
            Some(id) if !id.is_empty() && !id.contains('/') => Route::RoleDetail(RecordId::new(id)),
            _ => Route::RoleList,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::RoleList => "Roles",
            Route::CreateRole => "Create Role",
            Route::RoleDetail(_) => "Role Detail",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::RoleList => f.write_str("/"),
            Route::CreateRole => f.write_str("/create-role"),
            Route::RoleDetail(id) => write!(f, "/role/{}", id),
        }
    }
}
