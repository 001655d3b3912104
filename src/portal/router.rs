use crate::models::Role;

use super::session::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Root,
    Admin,
    Citizen,
}

impl Route {
    /// Unknown paths have no route; the guard sends them to `/`.
    pub fn parse(path: &str) -> Option<Route> {
        match path.trim_end_matches('/') {
            "" => Some(Route::Root),
            "/admin" => Some(Route::Admin),
            "/citizen" => Some(Route::Citizen),
            _ => None,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Root => "/",
            Route::Admin => "/admin",
            Route::Citizen => "/citizen",
        }
    }

    pub fn required_role(&self) -> Option<Role> {
        match self {
            Route::Root => None,
            Route::Admin => Some(Role::Admin),
            Route::Citizen => Some(Role::Citizen),
        }
    }

    pub fn home_for(role: Role) -> Route {
        match role {
            Role::Admin => Route::Admin,
            Role::Citizen => Route::Citizen,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    AdminDashboard,
    CitizenDashboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Loading,
    Render(Screen),
    Redirect(Route),
}

/// Routing decision for `path` given a snapshot of the session.
pub fn guard(state: &SessionState, path: &str) -> Decision {
    if state.loading {
        return Decision::Loading;
    }
    let Some(route) = Route::parse(path) else {
        return Decision::Redirect(Route::Root);
    };
    match (route, &state.user) {
        (Route::Root, None) => Decision::Render(Screen::Login),
        (Route::Root, Some(user)) => Decision::Redirect(Route::home_for(user.role)),
        (protected, Some(user)) if protected.required_role() == Some(user.role) => {
            Decision::Render(match protected {
                Route::Admin => Screen::AdminDashboard,
                _ => Screen::CitizenDashboard,
            })
        }
        _ => Decision::Redirect(Route::Root),
    }
}

/// Follows redirects until something renders. Every chain ends within two hops.
pub fn settle(state: &SessionState, path: &str) -> (Route, Decision) {
    let mut route = Route::parse(path).unwrap_or(Route::Root);
    let mut decision = guard(state, path);
    for _ in 0..3 {
        match decision {
            Decision::Redirect(next) => {
                route = next;
                decision = guard(state, next.path());
            }
            _ => break,
        }
    }
    (route, decision)
}
